//! Lab reading list to `ReportSnapshot` converter with score extraction.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use liverscore_core::{
    calculate_child_pugh, reference_range, score_meld, CanonicalMetric, ChildPughInput,
    ChildPughValidation, ClinicalAssessment, LabReading, MeldInput, MetricCell, ReportRow,
    ReportSnapshot, ScoreError, ScoringConfig,
};
use serde::{Deserialize, Serialize};

/// Build a report snapshot from a JSON string holding a reading list.
pub fn summarize_readings_str(
    readings_json: &str,
    assessment: &ClinicalAssessment,
    granularity: Granularity,
    config: &ScoringConfig,
) -> Result<ReportSnapshot, ScoreError> {
    let readings: Vec<LabReading> =
        serde_json::from_str(readings_json).map_err(|err| ScoreError::Parse(err.to_string()))?;
    summarize_readings_list(&readings, assessment, granularity, config)
}

/// Build a report snapshot from parsed readings.
pub fn summarize_readings_list(
    readings: &[LabReading],
    assessment: &ClinicalAssessment,
    granularity: Granularity,
    config: &ScoringConfig,
) -> Result<ReportSnapshot, ScoreError> {
    if readings.is_empty() {
        return Err(ScoreError::MissingData);
    }

    let groups = group_by_period(readings, granularity);
    let periods: Vec<String> = groups.iter().map(|group| group.label.clone()).collect();
    let rows = build_rows(readings, &groups);

    let validation = validate_child_pugh(readings, assessment);
    let child_pugh = extract_child_pugh_input(readings, assessment)
        .map(|input| calculate_child_pugh(&input));
    let meld = extract_meld_input(readings).map(|input| score_meld(&input, config));

    Ok(ReportSnapshot::new(
        periods, rows, validation, child_pugh, meld,
    ))
}

/// Period size used to bucket repeated draws.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Month,
}

/// Readings whose dates fall in the same calendar bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup {
    /// "YYYY-MM-DD" for day buckets, "YYYY-MM" for month buckets.
    pub label: String,
    pub start: DateTime<Utc>,
    pub readings: Vec<LabReading>,
}

/// Group readings into non-overlapping calendar buckets, ordered ascending
/// by period start. Readings without a timestamp are skipped.
pub fn group_by_period(readings: &[LabReading], granularity: Granularity) -> Vec<DateGroup> {
    let mut buckets: HashMap<NaiveDate, Vec<LabReading>> = HashMap::new();

    for reading in readings {
        let Some(recorded_at) = reading.recorded_at else {
            continue;
        };
        let date = recorded_at.date_naive();
        let key = match granularity {
            Granularity::Day => date,
            Granularity::Month => date.with_day(1).unwrap_or(date),
        };
        buckets.entry(key).or_default().push(reading.clone());
    }

    let mut groups: Vec<DateGroup> = buckets
        .into_iter()
        .map(|(key, readings)| DateGroup {
            label: match granularity {
                Granularity::Day => key.format("%Y-%m-%d").to_string(),
                Granularity::Month => key.format("%Y-%m").to_string(),
            },
            start: key.and_time(NaiveTime::MIN).and_utc(),
            readings,
        })
        .collect();
    groups.sort_by_key(|group| group.start);
    groups
}

/// A metric name after synonym lookup: either a recognized analyte or a
/// pass-through "discovered" name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedMetric {
    Canonical(CanonicalMetric),
    Discovered(String),
}

impl NormalizedMetric {
    pub fn label(&self) -> String {
        match self {
            NormalizedMetric::Canonical(metric) => metric.display_name().to_string(),
            NormalizedMetric::Discovered(name) => name.clone(),
        }
    }

    pub fn canonical(&self) -> Option<CanonicalMetric> {
        match self {
            NormalizedMetric::Canonical(metric) => Some(*metric),
            NormalizedMetric::Discovered(_) => None,
        }
    }
}

// Ordered synonym table. Entries whose synonyms contain another metric's
// name must come first (Direct Bilirubin before Total Bilirubin); first
// match wins, and no synonym may be a substring of another entry's names.
const METRIC_SYNONYMS: &[(CanonicalMetric, &[&str])] = &[
    (
        CanonicalMetric::DirectBilirubin,
        &["direct bilirubin", "d. bilirubin", "conjugated bilirubin", "dbil"],
    ),
    (
        CanonicalMetric::Bilirubin,
        &[
            "total bilirubin",
            "t. bilirubin",
            "t.bilirubin",
            "bilirubin total",
            "tbil",
            "bilirubin",
        ],
    ),
    (
        CanonicalMetric::AgRatio,
        &["a/g ratio", "ag ratio", "a:g ratio"],
    ),
    (CanonicalMetric::Albumin, &["albumin", "alb."]),
    (
        CanonicalMetric::TotalProtein,
        &["total protein", "t. protein", "protein, total"],
    ),
    (
        CanonicalMetric::Inr,
        &["inr", "international normalized ratio", "pt (inr)", "pt/inr"],
    ),
    (
        CanonicalMetric::Creatinine,
        &["creatinine", "serum creatinine", "creat."],
    ),
    (CanonicalMetric::Sodium, &["sodium", "na+", "serum sodium"]),
    (
        CanonicalMetric::Alt,
        &[
            "alt (sgpt)",
            "sgpt (alt)",
            "sgpt",
            "alanine aminotransferase",
            "alt",
        ],
    ),
    (
        CanonicalMetric::Ast,
        &[
            "ast (sgot)",
            "sgot (ast)",
            "sgot",
            "aspartate aminotransferase",
            "ast",
        ],
    ),
    (
        CanonicalMetric::Alp,
        &["alkaline phosphatase", "alk phos", "alp"],
    ),
    (
        CanonicalMetric::Ggt,
        &["gamma-glutamyl transferase", "gamma gt", "ggtp", "ggt"],
    ),
    (
        CanonicalMetric::Platelets,
        &["platelet count", "platelets", "platelet", "plt"],
    ),
    (
        CanonicalMetric::Hemoglobin,
        &["hemoglobin", "haemoglobin", "hgb"],
    ),
];

/// Map a free-text lab test name to a canonical metric. Case-insensitive
/// substring match in both directions against the synonym table; no match
/// passes the trimmed name through as discovered. Never fails.
pub fn normalize_metric_name(raw: &str) -> NormalizedMetric {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NormalizedMetric::Discovered(String::new());
    }

    let lower = trimmed.to_lowercase();
    for (metric, synonyms) in METRIC_SYNONYMS {
        for synonym in *synonyms {
            // The reverse direction needs a minimum length, otherwise a
            // one- or two-letter name matches half the table.
            if lower.contains(synonym) || (lower.len() >= 3 && synonym.contains(lower.as_str())) {
                return NormalizedMetric::Canonical(*metric);
            }
        }
    }

    NormalizedMetric::Discovered(trimmed.to_string())
}

/// Parse a numeric lab value out of free text. Strips one leading `<`/`>`
/// and thousands-separator commas, then takes the longest leading run of
/// "digits, optional decimal point, more digits".
pub fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let stripped = trimmed
        .strip_prefix(['<', '>'])
        .unwrap_or(trimmed)
        .trim_start();
    let cleaned: String = stripped.chars().filter(|c| *c != ',').collect();

    let prefix = numeric_prefix(&cleaned)?;
    prefix.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn numeric_prefix(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut end = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == 0 {
        return None;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut fraction = end + 1;
        while fraction < bytes.len() && bytes[fraction].is_ascii_digit() {
            fraction += 1;
        }
        // A bare trailing dot is not part of the number.
        if fraction > end + 1 {
            end = fraction;
        }
    }
    Some(&text[..end])
}

fn usable_value(reading: &LabReading) -> Option<f64> {
    reading
        .value
        .or_else(|| reading.raw_text.as_deref().and_then(parse_numeric))
}

/// Average the usable values for one metric inside one bucket. A count of
/// zero yields no value; only canonical metrics are flagged abnormal.
pub fn value_for(metric: &NormalizedMetric, group: &DateGroup) -> MetricCell {
    let mut sum = 0.0;
    let mut count = 0;
    let mut unit: Option<String> = None;

    for reading in &group.readings {
        if normalize_metric_name(&reading.metric_name) != *metric {
            continue;
        }
        if unit.is_none() {
            unit = reading.unit.clone().filter(|u| !u.is_empty());
        }
        let Some(value) = usable_value(reading) else {
            continue;
        };
        sum += value;
        count += 1;
    }

    if count == 0 {
        return MetricCell {
            value: None,
            unit,
            is_abnormal: false,
            count: 0,
        };
    }

    let average = sum / count as f64;
    let is_abnormal = metric
        .canonical()
        .and_then(reference_range)
        .map(|range| average < range.low || average > range.high)
        .unwrap_or(false);

    MetricCell {
        value: Some(average),
        unit,
        is_abnormal,
        count,
    }
}

fn build_rows(readings: &[LabReading], groups: &[DateGroup]) -> Vec<ReportRow> {
    let mut canonical_present: Vec<CanonicalMetric> = Vec::new();
    let mut discovered: Vec<String> = Vec::new();

    for reading in readings {
        match normalize_metric_name(&reading.metric_name) {
            NormalizedMetric::Canonical(metric) => {
                if !canonical_present.contains(&metric) {
                    canonical_present.push(metric);
                }
            }
            NormalizedMetric::Discovered(name) => {
                if !name.is_empty() && !discovered.contains(&name) {
                    discovered.push(name);
                }
            }
        }
    }

    discovered.sort();

    let mut rows = Vec::new();
    for metric in CanonicalMetric::ALL {
        if !canonical_present.contains(&metric) {
            continue;
        }
        rows.push(make_row(NormalizedMetric::Canonical(metric), readings, groups));
    }
    for name in discovered {
        rows.push(make_row(NormalizedMetric::Discovered(name), readings, groups));
    }
    rows
}

fn make_row(metric: NormalizedMetric, readings: &[LabReading], groups: &[DateGroup]) -> ReportRow {
    let cells: Vec<MetricCell> = groups.iter().map(|group| value_for(&metric, group)).collect();

    let mut unit = readings
        .iter()
        .filter(|reading| normalize_metric_name(&reading.metric_name) == metric)
        .find_map(|reading| reading.unit.clone().filter(|u| !u.is_empty()));

    let reference = metric.canonical().and_then(reference_range);
    if unit.is_none() {
        unit = reference
            .as_ref()
            .map(|range| range.unit.clone())
            .filter(|u| !u.is_empty());
    }

    ReportRow {
        metric: metric.label(),
        canonical: metric.canonical(),
        unit,
        reference,
        cells,
    }
}

// Same recency rule as the snapshot upserts: anything dated beats undated,
// later dates beat earlier ones, the first usable reading wins ties.
fn is_more_recent(candidate: Option<DateTime<Utc>>, current: Option<DateTime<Utc>>) -> bool {
    match (candidate, current) {
        (Some(a), Some(b)) => a > b,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Most recent usable value for one canonical metric across all readings.
pub fn latest_value(readings: &[LabReading], metric: CanonicalMetric) -> Option<f64> {
    let target = NormalizedMetric::Canonical(metric);
    let mut best: Option<(Option<DateTime<Utc>>, f64)> = None;

    for reading in readings {
        if normalize_metric_name(&reading.metric_name) != target {
            continue;
        }
        let Some(value) = usable_value(reading) else {
            continue;
        };
        match best {
            Some((current, _)) if !is_more_recent(reading.recorded_at, current) => {}
            _ => best = Some((reading.recorded_at, value)),
        }
    }

    best.map(|(_, value)| value)
}

/// Check whether the Child-Pugh scorer can run, naming what is missing.
pub fn validate_child_pugh(
    readings: &[LabReading],
    assessment: &ClinicalAssessment,
) -> ChildPughValidation {
    let required = [
        (CanonicalMetric::Bilirubin, "Total Bilirubin"),
        (CanonicalMetric::Albumin, "Albumin"),
        (CanonicalMetric::Inr, "INR"),
    ];

    let mut missing_labs = Vec::new();
    for (metric, label) in required {
        if latest_value(readings, metric).is_none() {
            missing_labs.push(label.to_string());
        }
    }

    let mut missing_clinical = Vec::new();
    if assessment.ascites.is_none() {
        missing_clinical.push("Ascites assessment".to_string());
    }
    if assessment.encephalopathy.is_none() {
        missing_clinical.push("Encephalopathy assessment".to_string());
    }

    ChildPughValidation {
        can_calculate: missing_labs.is_empty() && missing_clinical.is_empty(),
        missing_labs,
        missing_clinical,
    }
}

/// Assemble Child-Pugh parameters from the latest readings and the clinical
/// assessment; `None` when any required piece is absent.
pub fn extract_child_pugh_input(
    readings: &[LabReading],
    assessment: &ClinicalAssessment,
) -> Option<ChildPughInput> {
    Some(ChildPughInput {
        bilirubin: latest_value(readings, CanonicalMetric::Bilirubin)?,
        albumin: latest_value(readings, CanonicalMetric::Albumin)?,
        inr: latest_value(readings, CanonicalMetric::Inr)?,
        ascites: assessment.ascites?,
        encephalopathy: assessment.encephalopathy?,
    })
}

/// Assemble MELD parameters from the latest readings; `None` when any of
/// the three required labs is absent. Sodium stays optional.
pub fn extract_meld_input(readings: &[LabReading]) -> Option<MeldInput> {
    Some(MeldInput {
        bilirubin: latest_value(readings, CanonicalMetric::Bilirubin)?,
        creatinine: latest_value(readings, CanonicalMetric::Creatinine)?,
        inr: latest_value(readings, CanonicalMetric::Inr)?,
        sodium: latest_value(readings, CanonicalMetric::Sodium),
    })
}
