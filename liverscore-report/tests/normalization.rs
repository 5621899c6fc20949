use chrono::{TimeZone, Utc};
use liverscore_core::{CanonicalMetric, ClinicalAssessment, LabReading, ScoreError, ScoringConfig};
use liverscore_report::{
    extract_meld_input, group_by_period, latest_value, normalize_metric_name, parse_numeric,
    summarize_readings_list, validate_child_pugh, value_for, Granularity, NormalizedMetric,
};

fn reading(name: &str, value: f64, month: u32, day: u32) -> LabReading {
    LabReading {
        metric_name: name.to_string(),
        value: Some(value),
        unit: None,
        raw_text: None,
        recorded_at: Utc.with_ymd_and_hms(2026, month, day, 8, 0, 0).single(),
    }
}

#[test]
fn synonyms_map_to_canonical_metrics() {
    let cases = [
        ("SGPT (ALT)", CanonicalMetric::Alt),
        ("T. Bilirubin", CanonicalMetric::Bilirubin),
        ("Direct Bilirubin", CanonicalMetric::DirectBilirubin),
        ("A/G Ratio", CanonicalMetric::AgRatio),
        ("PT (INR)", CanonicalMetric::Inr),
        ("Serum Sodium", CanonicalMetric::Sodium),
        ("Alkaline Phosphatase", CanonicalMetric::Alp),
        ("PLT", CanonicalMetric::Platelets),
    ];
    for (raw, expected) in cases {
        assert_eq!(
            normalize_metric_name(raw),
            NormalizedMetric::Canonical(expected),
            "raw name: {raw}"
        );
    }
}

#[test]
fn unknown_names_pass_through_trimmed() {
    assert_eq!(
        normalize_metric_name("  Serum Copper "),
        NormalizedMetric::Discovered("Serum Copper".to_string())
    );
}

#[test]
fn normalization_is_idempotent() {
    for metric in CanonicalMetric::ALL {
        assert_eq!(
            normalize_metric_name(metric.display_name()),
            NormalizedMetric::Canonical(metric),
            "display name: {}",
            metric.display_name()
        );
    }

    let discovered = normalize_metric_name("Serum Copper");
    assert_eq!(normalize_metric_name(&discovered.label()), discovered);
}

#[test]
fn numeric_parser_handles_operators_and_separators() {
    assert_eq!(parse_numeric("<1,234.5 mg/dL"), Some(1234.5));
    assert_eq!(parse_numeric(" >10 "), Some(10.0));
    assert_eq!(parse_numeric("5.6"), Some(5.6));
    assert_eq!(parse_numeric("7 mg"), Some(7.0));
    assert_eq!(parse_numeric("12."), Some(12.0));
    assert_eq!(parse_numeric(".5"), None);
    assert_eq!(parse_numeric("abc"), None);
    assert_eq!(parse_numeric(""), None);
}

#[test]
fn single_reading_round_trips_through_day_grouping() {
    let readings = vec![reading("Albumin", 4.2, 3, 10)];
    let groups = group_by_period(&readings, Granularity::Day);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "2026-03-10");

    let cell = value_for(
        &NormalizedMetric::Canonical(CanonicalMetric::Albumin),
        &groups[0],
    );
    assert_eq!(cell.value, Some(4.2));
    assert_eq!(cell.count, 1);
    assert!(!cell.is_abnormal);
}

#[test]
fn repeated_draws_average_within_the_bucket() {
    let readings = vec![reading("ALT", 50.0, 3, 10), reading("SGPT (ALT)", 64.0, 3, 10)];
    let groups = group_by_period(&readings, Granularity::Day);
    assert_eq!(groups.len(), 1);

    let cell = value_for(
        &NormalizedMetric::Canonical(CanonicalMetric::Alt),
        &groups[0],
    );
    assert_eq!(cell.value, Some(57.0));
    assert_eq!(cell.count, 2);
    assert!(cell.is_abnormal);
}

#[test]
fn month_buckets_sort_ascending() {
    let readings = vec![
        reading("Albumin", 4.0, 4, 2),
        reading("Albumin", 4.1, 2, 20),
        reading("Albumin", 4.2, 2, 5),
    ];
    let groups = group_by_period(&readings, Granularity::Month);
    let labels: Vec<&str> = groups.iter().map(|group| group.label.as_str()).collect();
    assert_eq!(labels, vec!["2026-02", "2026-04"]);
    assert_eq!(groups[0].readings.len(), 2);
}

#[test]
fn undated_readings_are_left_out_of_grouping() {
    let undated = LabReading {
        metric_name: "Albumin".to_string(),
        value: Some(4.0),
        unit: None,
        raw_text: None,
        recorded_at: None,
    };
    assert!(group_by_period(&[undated], Granularity::Day).is_empty());
}

#[test]
fn raw_text_is_parsed_only_when_value_is_absent() {
    let readings = vec![LabReading {
        metric_name: "Sodium".to_string(),
        value: None,
        unit: Some("mmol/L".to_string()),
        raw_text: Some("<132".to_string()),
        recorded_at: Utc.with_ymd_and_hms(2026, 3, 12, 9, 0, 0).single(),
    }];
    let groups = group_by_period(&readings, Granularity::Day);
    let cell = value_for(
        &NormalizedMetric::Canonical(CanonicalMetric::Sodium),
        &groups[0],
    );
    assert_eq!(cell.value, Some(132.0));
    assert!(cell.is_abnormal);
}

#[test]
fn discovered_metrics_are_never_flagged_abnormal() {
    let readings = vec![reading("Serum Copper", 1250.0, 3, 10)];
    let groups = group_by_period(&readings, Granularity::Day);
    let cell = value_for(
        &NormalizedMetric::Discovered("Serum Copper".to_string()),
        &groups[0],
    );
    assert_eq!(cell.value, Some(1250.0));
    assert!(!cell.is_abnormal);
}

#[test]
fn latest_value_prefers_the_most_recent_reading() {
    let readings = vec![
        reading("Total Bilirubin", 1.0, 3, 10),
        reading("Total Bilirubin", 2.0, 3, 12),
        reading("Total Bilirubin", 1.5, 3, 11),
    ];
    assert_eq!(latest_value(&readings, CanonicalMetric::Bilirubin), Some(2.0));
}

#[test]
fn validation_names_the_missing_pieces() {
    let readings = vec![
        reading("Total Bilirubin", 1.2, 3, 10),
        reading("Albumin", 4.0, 3, 10),
    ];
    let validation = validate_child_pugh(&readings, &ClinicalAssessment::default());
    assert!(!validation.can_calculate);
    assert_eq!(validation.missing_labs, vec!["INR".to_string()]);
    assert_eq!(
        validation.missing_clinical,
        vec![
            "Ascites assessment".to_string(),
            "Encephalopathy assessment".to_string()
        ]
    );
}

#[test]
fn meld_extraction_requires_all_three_labs() {
    let mut readings = vec![
        reading("Total Bilirubin", 2.0, 3, 10),
        reading("INR", 1.1, 3, 10),
    ];
    assert!(extract_meld_input(&readings).is_none());

    readings.push(reading("Creatinine", 1.0, 3, 10));
    let input = extract_meld_input(&readings).expect("Thiếu tham số MELD");
    assert_eq!(input.bilirubin, 2.0);
    assert_eq!(input.sodium, None);
}

#[test]
fn empty_reading_lists_are_rejected() {
    let result = summarize_readings_list(
        &[],
        &ClinicalAssessment::default(),
        Granularity::Day,
        &ScoringConfig::default(),
    );
    assert!(matches!(result, Err(ScoreError::MissingData)));
}
