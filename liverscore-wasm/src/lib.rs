//! Cầu nối WASM <-> JavaScript cho lõi tính điểm gan.

use liverscore_core::{
    calculate_child_pugh, score_meld, ChildPughInput, ClinicalAssessment, MeldInput, ScoreError,
    ScoringConfig,
};
use liverscore_report::Granularity;
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsReportConfig {
    #[serde(default)]
    granularity: Option<Granularity>,
    #[serde(default)]
    meld_medium_from: Option<i32>,
    #[serde(default)]
    meld_high_from: Option<i32>,
    #[serde(default)]
    meld_critical_from: Option<i32>,
}

impl JsReportConfig {
    fn granularity(&self) -> Granularity {
        self.granularity.unwrap_or(Granularity::Day)
    }

    fn scoring(&self) -> ScoringConfig {
        let mut base = ScoringConfig::default();
        if let Some(from) = self.meld_medium_from {
            base.meld_medium_from = from;
        }
        if let Some(from) = self.meld_high_from {
            base.meld_high_from = from;
        }
        if let Some(from) = self.meld_critical_from {
            base.meld_critical_from = from;
        }
        base
    }
}

fn parse_config(config: Option<JsValue>) -> Result<(Granularity, ScoringConfig), JsValue> {
    match config {
        Some(js_cfg) => {
            let cfg: JsReportConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok((cfg.granularity(), cfg.scoring()))
        }
        None => Ok((Granularity::Day, ScoringConfig::default())),
    }
}

#[wasm_bindgen]
pub fn summarize_readings(
    readings: JsValue,
    assessment: Option<JsValue>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let readings: Vec<liverscore_core::LabReading> = from_value(readings)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách xét nghiệm: {err}")))?;

    let assessment = match assessment {
        Some(js_assessment) => from_value::<ClinicalAssessment>(js_assessment)
            .map_err(|err| JsValue::from_str(&format!("Không đọc được đánh giá lâm sàng: {err}")))?,
        None => ClinicalAssessment::default(),
    };

    let (granularity, scoring) = parse_config(config)?;

    let snapshot =
        liverscore_report::summarize_readings_list(&readings, &assessment, granularity, &scoring)
            .map_err(|err| JsValue::from_str(&format_score_error(err)))?;

    to_value(&snapshot)
        .map_err(|err| JsValue::from_str(&format!("Không serialize snapshot: {err}")))
}

#[wasm_bindgen]
pub fn child_pugh(input: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let input: ChildPughInput = from_value(input)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được tham số Child-Pugh: {err}")))?;

    let result = calculate_child_pugh(&input);
    to_value(&result).map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

#[wasm_bindgen]
pub fn meld(input: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let input: MeldInput = from_value(input)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được tham số MELD: {err}")))?;
    let (_, scoring) = parse_config(config)?;

    let result = score_meld(&input, &scoring);
    to_value(&result).map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

fn format_score_error(err: ScoreError) -> String {
    format!("Score error: {err}")
}
