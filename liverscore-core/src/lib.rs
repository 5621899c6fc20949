//! Logic lõi tính điểm mức độ nặng bệnh gan và các kiểu dữ liệu dùng chung.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cấu hình ngưỡng phân mức khẩn cấp theo điểm MELD.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    /// Điểm MELD bắt đầu mức khẩn cấp trung bình.
    pub meld_medium_from: i32,
    /// Điểm MELD bắt đầu mức khẩn cấp cao.
    pub meld_high_from: i32,
    /// Điểm MELD bắt đầu mức nguy kịch.
    pub meld_critical_from: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            meld_medium_from: 10,
            meld_high_from: 20,
            meld_critical_from: 30,
        }
    }
}

impl ScoringConfig {
    /// Xếp mức khẩn cấp cho một điểm MELD hiệu lực.
    pub fn urgency_for(&self, score: i32) -> UrgencyLevel {
        if score >= self.meld_critical_from {
            UrgencyLevel::Critical
        } else if score >= self.meld_high_from {
            UrgencyLevel::High
        } else if score >= self.meld_medium_from {
            UrgencyLevel::Medium
        } else {
            UrgencyLevel::Low
        }
    }
}

/// Mức khẩn cấp hiển thị cho người dùng.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Chỉ số xét nghiệm đã chuẩn hóa tên.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalMetric {
    Bilirubin,
    DirectBilirubin,
    Albumin,
    AgRatio,
    TotalProtein,
    Alt,
    Ast,
    Alp,
    Ggt,
    Inr,
    Platelets,
    Creatinine,
    Sodium,
    Hemoglobin,
}

impl CanonicalMetric {
    /// Thứ tự hiển thị cố định trên bảng báo cáo.
    pub const ALL: [CanonicalMetric; 14] = [
        CanonicalMetric::Bilirubin,
        CanonicalMetric::DirectBilirubin,
        CanonicalMetric::Albumin,
        CanonicalMetric::AgRatio,
        CanonicalMetric::TotalProtein,
        CanonicalMetric::Alt,
        CanonicalMetric::Ast,
        CanonicalMetric::Alp,
        CanonicalMetric::Ggt,
        CanonicalMetric::Inr,
        CanonicalMetric::Platelets,
        CanonicalMetric::Creatinine,
        CanonicalMetric::Sodium,
        CanonicalMetric::Hemoglobin,
    ];

    /// Nhãn hiển thị chuẩn của chỉ số.
    pub fn display_name(self) -> &'static str {
        match self {
            CanonicalMetric::Bilirubin => "Total Bilirubin",
            CanonicalMetric::DirectBilirubin => "Direct Bilirubin",
            CanonicalMetric::Albumin => "Albumin",
            CanonicalMetric::AgRatio => "A/G Ratio",
            CanonicalMetric::TotalProtein => "Total Protein",
            CanonicalMetric::Alt => "ALT (SGPT)",
            CanonicalMetric::Ast => "AST (SGOT)",
            CanonicalMetric::Alp => "ALP",
            CanonicalMetric::Ggt => "GGT",
            CanonicalMetric::Inr => "INR",
            CanonicalMetric::Platelets => "Platelet Count",
            CanonicalMetric::Creatinine => "Creatinine",
            CanonicalMetric::Sodium => "Sodium",
            CanonicalMetric::Hemoglobin => "Hemoglobin",
        }
    }
}

/// Khoảng tham chiếu của một chỉ số.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    pub low: f64,
    pub high: f64,
    /// Đơn vị quy ước; chuỗi rỗng với chỉ số không thứ nguyên (INR, tỷ lệ A/G).
    pub unit: String,
}

/// Bảng khoảng tham chiếu tĩnh cho người lớn. Chỉ số phát hiện thêm
/// (không chuẩn hóa được tên) không có khoảng tham chiếu.
pub fn reference_range(metric: CanonicalMetric) -> Option<ReferenceRange> {
    let (low, high, unit) = match metric {
        CanonicalMetric::Bilirubin => (0.1, 1.2, "mg/dL"),
        CanonicalMetric::DirectBilirubin => (0.0, 0.3, "mg/dL"),
        CanonicalMetric::Albumin => (3.5, 5.0, "g/dL"),
        CanonicalMetric::AgRatio => (1.1, 2.5, ""),
        CanonicalMetric::TotalProtein => (6.0, 8.3, "g/dL"),
        CanonicalMetric::Alt => (7.0, 56.0, "U/L"),
        CanonicalMetric::Ast => (10.0, 40.0, "U/L"),
        CanonicalMetric::Alp => (44.0, 147.0, "U/L"),
        CanonicalMetric::Ggt => (9.0, 48.0, "U/L"),
        CanonicalMetric::Inr => (0.8, 1.1, ""),
        CanonicalMetric::Platelets => (150.0, 450.0, "10^3/uL"),
        CanonicalMetric::Creatinine => (0.7, 1.3, "mg/dL"),
        CanonicalMetric::Sodium => (135.0, 145.0, "mmol/L"),
        CanonicalMetric::Hemoglobin => (12.0, 17.5, "g/dL"),
    };
    Some(ReferenceRange {
        low,
        high,
        unit: unit.to_string(),
    })
}

/// Một kết quả xét nghiệm thô từ trích xuất báo cáo hoặc nhập tay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabReading {
    pub metric_name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Mức độ cổ trướng trong thang điểm Child-Pugh. Một số nguồn dữ liệu
/// ghi "slight" thay cho "mild"; hai cách viết được coi là một.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AscitesGrade {
    None,
    #[serde(alias = "slight")]
    Mild,
    #[serde(alias = "refractory")]
    Moderate,
}

impl AscitesGrade {
    fn points(self) -> u8 {
        match self {
            AscitesGrade::None => 1,
            AscitesGrade::Mild => 2,
            AscitesGrade::Moderate => 3,
        }
    }
}

/// Mức độ bệnh não gan trong thang điểm Child-Pugh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EncephalopathyGrade {
    None,
    #[serde(rename = "grade1-2", alias = "grade 1-2", alias = "grade1_2")]
    Grade1To2,
    #[serde(rename = "grade3-4", alias = "grade 3-4", alias = "grade3_4")]
    Grade3To4,
}

impl EncephalopathyGrade {
    fn points(self) -> u8 {
        match self {
            EncephalopathyGrade::None => 1,
            EncephalopathyGrade::Grade1To2 => 2,
            EncephalopathyGrade::Grade3To4 => 3,
        }
    }
}

/// Đánh giá lâm sàng do người dùng nhập, tách khỏi dữ liệu xét nghiệm.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicalAssessment {
    #[serde(default)]
    pub ascites: Option<AscitesGrade>,
    #[serde(default)]
    pub encephalopathy: Option<EncephalopathyGrade>,
}

/// Bộ tham số đầy đủ cho thang điểm Child-Pugh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildPughInput {
    /// Bilirubin toàn phần, mg/dL.
    pub bilirubin: f64,
    /// Albumin huyết thanh, g/dL.
    pub albumin: f64,
    pub inr: f64,
    pub ascites: AscitesGrade,
    pub encephalopathy: EncephalopathyGrade,
}

/// Phân loại Child-Pugh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChildPughClass {
    A,
    B,
    C,
}

/// Điểm thành phần của từng tham số Child-Pugh, mỗi tham số 1-3 điểm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChildPughBreakdown {
    pub bilirubin: u8,
    pub albumin: u8,
    pub inr: u8,
    pub ascites: u8,
    pub encephalopathy: u8,
}

/// Diễn giải cố định theo phân loại.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChildPughInterpretation {
    pub severity: String,
    pub one_year_survival: String,
    pub operative_mortality: String,
    pub recommendations: Vec<String>,
}

/// Kết quả tính điểm Child-Pugh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildPughResult {
    /// Tổng điểm, luôn trong khoảng 5-15.
    pub score: u8,
    #[serde(rename = "class")]
    pub pugh_class: ChildPughClass,
    pub breakdown: ChildPughBreakdown,
    pub interpretation: ChildPughInterpretation,
    /// Cảnh báo tư vấn khi giá trị vượt khoảng sinh lý; không chặn tính toán.
    pub warnings: Vec<String>,
}

/// Bộ tham số MELD; có natri thì kết quả nâng cấp thành MELD-Na.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeldInput {
    /// Bilirubin toàn phần, mg/dL.
    pub bilirubin: f64,
    /// Creatinine huyết thanh, mg/dL.
    pub creatinine: f64,
    pub inr: f64,
    #[serde(default)]
    pub sodium: Option<f64>,
}

/// Kết quả tính điểm MELD / MELD-Na.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeldResult {
    pub meld: i32,
    pub meld_na: Option<i32>,
    pub urgency: UrgencyLevel,
    pub interpretation: String,
    pub transplant_priority: String,
}

/// Kết quả kiểm tra dữ liệu trước khi tính Child-Pugh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChildPughValidation {
    pub can_calculate: bool,
    pub missing_labs: Vec<String>,
    pub missing_clinical: Vec<String>,
}

/// Một ô giá trị theo kỳ trong bảng báo cáo hợp nhất.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricCell {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub is_abnormal: bool,
    pub count: usize,
}

/// Một dòng chỉ số trong bảng báo cáo hợp nhất.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRow {
    /// Nhãn hiển thị; với chỉ số phát hiện thêm là tên gốc đã trim.
    pub metric: String,
    pub canonical: Option<CanonicalMetric>,
    pub unit: Option<String>,
    pub reference: Option<ReferenceRange>,
    /// Một ô cho mỗi kỳ, cùng thứ tự với `periods` của snapshot.
    pub cells: Vec<MetricCell>,
}

/// Kết quả tổng hợp cuối cùng cho màn hình báo cáo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSnapshot {
    pub generated_at: DateTime<Utc>,
    pub periods: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub child_pugh: Option<ChildPughResult>,
    pub meld: Option<MeldResult>,
    pub child_pugh_validation: ChildPughValidation,
}

impl ReportSnapshot {
    /// Khởi tạo snapshot từ các thành phần đã chuẩn bị.
    pub fn new(
        periods: Vec<String>,
        rows: Vec<ReportRow>,
        child_pugh_validation: ChildPughValidation,
        child_pugh: Option<ChildPughResult>,
        meld: Option<MeldResult>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            periods,
            rows,
            child_pugh,
            meld,
            child_pugh_validation,
        }
    }

    /// Bảng chỉ số đã sắp theo thứ tự hiển thị.
    pub fn table(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Danh sách nhãn kỳ theo thời gian tăng dần.
    pub fn period_labels(&self) -> &[String] {
        &self.periods
    }
}

/// Lỗi chung của pipeline tính điểm.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu")]
    MissingData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Lỗi khác: {0}")]
    Other(String),
}

/// Tiện ích dựng snapshot rỗng (dùng cho mock/testing).
pub fn empty_snapshot() -> ReportSnapshot {
    ReportSnapshot {
        generated_at: Utc::now(),
        periods: Vec::new(),
        rows: Vec::new(),
        child_pugh: None,
        meld: None,
        child_pugh_validation: ChildPughValidation::default(),
    }
}

// Ngưỡng điểm thành phần giữ nguyên dấu so sánh của bảng tham chiếu:
// 2.0 và 3.0 đều thuộc mức 2 điểm.
fn bilirubin_points(value: f64) -> u8 {
    if value < 2.0 {
        1
    } else if value <= 3.0 {
        2
    } else {
        3
    }
}

fn albumin_points(value: f64) -> u8 {
    if value > 3.5 {
        1
    } else if value >= 2.8 {
        2
    } else {
        3
    }
}

fn inr_points(value: f64) -> u8 {
    if value < 1.7 {
        1
    } else if value <= 2.3 {
        2
    } else {
        3
    }
}

fn child_pugh_class(score: u8) -> ChildPughClass {
    match score {
        5..=6 => ChildPughClass::A,
        7..=9 => ChildPughClass::B,
        _ => ChildPughClass::C,
    }
}

fn child_pugh_interpretation(class: ChildPughClass) -> ChildPughInterpretation {
    match class {
        ChildPughClass::A => ChildPughInterpretation {
            severity: "Well-compensated disease".to_string(),
            one_year_survival: "95-100%".to_string(),
            operative_mortality: "10%".to_string(),
            recommendations: vec![
                "Routine follow-up every 6 months.".to_string(),
                "Hepatocellular carcinoma surveillance.".to_string(),
                "Lifestyle and nutrition counselling.".to_string(),
            ],
        },
        ChildPughClass::B => ChildPughInterpretation {
            severity: "Significant functional compromise".to_string(),
            one_year_survival: "80%".to_string(),
            operative_mortality: "30%".to_string(),
            recommendations: vec![
                "Hepatology referral.".to_string(),
                "Screen for varices and encephalopathy.".to_string(),
                "Evaluate for transplant candidacy.".to_string(),
            ],
        },
        ChildPughClass::C => ChildPughInterpretation {
            severity: "Decompensated disease".to_string(),
            one_year_survival: "45%".to_string(),
            operative_mortality: "82%".to_string(),
            recommendations: vec![
                "Urgent hepatology review.".to_string(),
                "Transplant evaluation.".to_string(),
                "Avoid elective surgery.".to_string(),
                "Manage ascites and encephalopathy actively.".to_string(),
            ],
        },
    }
}

fn child_pugh_warnings(input: &ChildPughInput) -> Vec<String> {
    let mut warnings = Vec::new();
    if input.bilirubin > 50.0 {
        warnings
            .push("Bilirubin above 50 mg/dL is outside the typical physiologic range.".to_string());
    }
    if input.albumin < 1.0 || input.albumin > 6.0 {
        warnings
            .push("Albumin outside 1.0-6.0 g/dL is outside the typical physiologic range.".to_string());
    }
    if input.inr > 10.0 {
        warnings.push("INR above 10 is outside the typical physiologic range.".to_string());
    }
    warnings
}

/// Tính điểm Child-Pugh từ bộ tham số đầy đủ. Việc phát hiện dữ liệu thô
/// thiếu trường thuộc về bước xác thực phía trước (`validate_child_pugh`
/// trong crate report).
pub fn calculate_child_pugh(input: &ChildPughInput) -> ChildPughResult {
    let breakdown = ChildPughBreakdown {
        bilirubin: bilirubin_points(input.bilirubin),
        albumin: albumin_points(input.albumin),
        inr: inr_points(input.inr),
        ascites: input.ascites.points(),
        encephalopathy: input.encephalopathy.points(),
    };

    let score = breakdown.bilirubin
        + breakdown.albumin
        + breakdown.inr
        + breakdown.ascites
        + breakdown.encephalopathy;
    let pugh_class = child_pugh_class(score);

    ChildPughResult {
        score,
        pugh_class,
        breakdown,
        interpretation: child_pugh_interpretation(pugh_class),
        warnings: child_pugh_warnings(input),
    }
}

/// Điểm MELD nguyên bản. Giá trị đầu vào được kẹp về khoảng lâm sàng
/// trước khi áp dụng công thức.
pub fn calculate_meld(bilirubin: f64, creatinine: f64, inr: f64) -> i32 {
    let bilirubin = bilirubin.max(1.0);
    let creatinine = creatinine.clamp(1.0, 4.0);
    let inr = inr.max(1.0);
    (3.78 * bilirubin.ln() + 11.2 * inr.ln() + 9.57 * creatinine.ln() + 6.43).round() as i32
}

/// Điểm MELD-Na; natri kẹp về [125, 137] và kết quả không bao giờ thấp
/// hơn điểm MELD thường.
pub fn calculate_meld_na(bilirubin: f64, creatinine: f64, inr: f64, sodium: f64) -> i32 {
    let meld = f64::from(calculate_meld(bilirubin, creatinine, inr));
    let sodium_factor = 137.0 - sodium.clamp(125.0, 137.0);
    (meld + 1.32 * sodium_factor - 0.033 * meld * sodium_factor)
        .max(meld)
        .round() as i32
}

fn meld_interpretation(urgency: UrgencyLevel) -> &'static str {
    match urgency {
        UrgencyLevel::Low => "Low estimated three-month mortality.",
        UrgencyLevel::Medium => "Intermediate estimated three-month mortality.",
        UrgencyLevel::High => "High estimated three-month mortality.",
        UrgencyLevel::Critical => "Very high estimated three-month mortality.",
    }
}

fn meld_transplant_priority(urgency: UrgencyLevel) -> &'static str {
    match urgency {
        UrgencyLevel::Low => "Routine monitoring; transplant not indicated at this score.",
        UrgencyLevel::Medium => "Discuss referral for transplant evaluation.",
        UrgencyLevel::High => "Active transplant listing advised.",
        UrgencyLevel::Critical => "Top allocation priority; inpatient management likely.",
    }
}

/// Tính điểm MELD/MELD-Na và gán mức khẩn cấp theo cấu hình. Điểm hiệu
/// lực để phân mức là MELD-Na khi có natri, ngược lại là MELD.
pub fn score_meld(input: &MeldInput, config: &ScoringConfig) -> MeldResult {
    let meld = calculate_meld(input.bilirubin, input.creatinine, input.inr);
    let meld_na = input
        .sodium
        .map(|sodium| calculate_meld_na(input.bilirubin, input.creatinine, input.inr, sodium));

    let effective = meld_na.unwrap_or(meld);
    let urgency = config.urgency_for(effective);

    MeldResult {
        meld,
        meld_na,
        urgency,
        interpretation: meld_interpretation(urgency).to_string(),
        transplant_priority: meld_transplant_priority(urgency).to_string(),
    }
}
