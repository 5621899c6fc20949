use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use liverscore_core::{AscitesGrade, ClinicalAssessment, EncephalopathyGrade, ScoringConfig};
use liverscore_report::{summarize_readings_str, Granularity};

#[derive(Parser, Debug)]
#[command(
    name = "liverscore-cli",
    about = "Tạo báo cáo xét nghiệm gan hợp nhất từ danh sách kết quả JSON."
)]
struct Args {
    /// Đường dẫn tới file JSON danh sách xét nghiệm.
    #[arg(short, long)]
    input: PathBuf,

    /// Gom nhóm theo "day" hoặc "month".
    #[arg(short, long, default_value = "day")]
    granularity: String,

    /// Mức cổ trướng: none, mild, moderate.
    #[arg(long)]
    ascites: Option<String>,

    /// Mức bệnh não gan: none, grade1-2, grade3-4.
    #[arg(long)]
    encephalopathy: Option<String>,

    /// In toàn bộ snapshot dưới dạng JSON.
    #[arg(long)]
    json: bool,
}

fn parse_granularity(raw: &str) -> anyhow::Result<Granularity> {
    match raw {
        "day" => Ok(Granularity::Day),
        "month" => Ok(Granularity::Month),
        other => anyhow::bail!("Giá trị granularity không hợp lệ: {other}"),
    }
}

fn parse_ascites(raw: &str) -> anyhow::Result<AscitesGrade> {
    match raw {
        "none" => Ok(AscitesGrade::None),
        "mild" | "slight" => Ok(AscitesGrade::Mild),
        "moderate" => Ok(AscitesGrade::Moderate),
        other => anyhow::bail!("Mức cổ trướng không hợp lệ: {other}"),
    }
}

fn parse_encephalopathy(raw: &str) -> anyhow::Result<EncephalopathyGrade> {
    match raw {
        "none" => Ok(EncephalopathyGrade::None),
        "grade1-2" => Ok(EncephalopathyGrade::Grade1To2),
        "grade3-4" => Ok(EncephalopathyGrade::Grade3To4),
        other => anyhow::bail!("Mức bệnh não gan không hợp lệ: {other}"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let granularity = parse_granularity(&args.granularity)?;
    let assessment = ClinicalAssessment {
        ascites: args.ascites.as_deref().map(parse_ascites).transpose()?,
        encephalopathy: args
            .encephalopathy
            .as_deref()
            .map(parse_encephalopathy)
            .transpose()?,
    };

    let config = ScoringConfig::default();
    let snapshot = summarize_readings_str(&data, &assessment, granularity, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Generated at: {}", snapshot.generated_at);
    println!("Periods: {}", snapshot.period_labels().join(" | "));

    for row in snapshot.table() {
        let latest = row
            .cells
            .iter()
            .rev()
            .find_map(|cell| cell.value.map(|value| (value, cell.is_abnormal)));
        match latest {
            Some((value, abnormal)) => {
                let marker = if abnormal { " (!)" } else { "" };
                let rendered = match row.unit.as_deref() {
                    Some(unit) if !unit.is_empty() => format!("{value} {unit}"),
                    _ => format!("{value}"),
                };
                println!("{}: {rendered}{marker}", row.metric);
            }
            None => println!("{}: -", row.metric),
        }
    }

    match &snapshot.child_pugh {
        Some(result) => println!("Child-Pugh: {} ({:?})", result.score, result.pugh_class),
        None => {
            let validation = &snapshot.child_pugh_validation;
            let mut missing = validation.missing_labs.clone();
            missing.extend(validation.missing_clinical.iter().cloned());
            println!("Child-Pugh: thiếu dữ liệu ({})", missing.join(", "));
        }
    }

    match &snapshot.meld {
        Some(result) => match result.meld_na {
            Some(meld_na) => println!(
                "MELD-Na: {meld_na} (MELD {}), urgency {:?}",
                result.meld, result.urgency
            ),
            None => println!("MELD: {}, urgency {:?}", result.meld, result.urgency),
        },
        None => println!("MELD: thiếu dữ liệu"),
    }

    Ok(())
}
