use liverscore_core::{
    calculate_child_pugh, calculate_meld, calculate_meld_na, score_meld, AscitesGrade,
    ChildPughClass, ChildPughInput, EncephalopathyGrade, MeldInput, ScoringConfig, UrgencyLevel,
};

fn baseline(bilirubin: f64, albumin: f64, inr: f64) -> ChildPughInput {
    ChildPughInput {
        bilirubin,
        albumin,
        inr,
        ascites: AscitesGrade::None,
        encephalopathy: EncephalopathyGrade::None,
    }
}

#[test]
fn compensated_patient_scores_class_a() {
    let result = calculate_child_pugh(&baseline(1.5, 4.0, 1.1));
    assert_eq!(result.score, 5);
    assert_eq!(result.pugh_class, ChildPughClass::A);
    assert!(result.warnings.is_empty());
}

#[test]
fn decompensated_patient_scores_class_c() {
    let input = ChildPughInput {
        bilirubin: 3.5,
        albumin: 2.5,
        inr: 2.5,
        ascites: AscitesGrade::Moderate,
        encephalopathy: EncephalopathyGrade::Grade3To4,
    };
    let result = calculate_child_pugh(&input);
    assert_eq!(result.score, 15);
    assert_eq!(result.pugh_class, ChildPughClass::C);
}

#[test]
fn bilirubin_boundaries_follow_the_point_table() {
    let points = |value| calculate_child_pugh(&baseline(value, 4.0, 1.0)).breakdown.bilirubin;
    assert_eq!(points(1.99), 1);
    assert_eq!(points(2.0), 2);
    assert_eq!(points(3.0), 2);
    assert_eq!(points(3.01), 3);
}

#[test]
fn albumin_boundaries_follow_the_point_table() {
    let points = |value| calculate_child_pugh(&baseline(1.0, value, 1.0)).breakdown.albumin;
    assert_eq!(points(3.51), 1);
    assert_eq!(points(3.5), 2);
    assert_eq!(points(2.8), 2);
    assert_eq!(points(2.79), 3);
}

#[test]
fn inr_boundaries_follow_the_point_table() {
    let points = |value| calculate_child_pugh(&baseline(1.0, 4.0, value)).breakdown.inr;
    assert_eq!(points(1.69), 1);
    assert_eq!(points(1.7), 2);
    assert_eq!(points(2.3), 2);
    assert_eq!(points(2.31), 3);
}

#[test]
fn class_bands_cover_the_score_range() {
    let six = calculate_child_pugh(&baseline(2.0, 4.0, 1.0));
    assert_eq!(six.score, 6);
    assert_eq!(six.pugh_class, ChildPughClass::A);

    let seven = calculate_child_pugh(&baseline(2.0, 3.5, 1.0));
    assert_eq!(seven.score, 7);
    assert_eq!(seven.pugh_class, ChildPughClass::B);

    let nine = calculate_child_pugh(&ChildPughInput {
        encephalopathy: EncephalopathyGrade::Grade1To2,
        ..baseline(2.0, 3.5, 1.7)
    });
    assert_eq!(nine.score, 9);
    assert_eq!(nine.pugh_class, ChildPughClass::B);

    let ten = calculate_child_pugh(&ChildPughInput {
        ascites: AscitesGrade::Mild,
        encephalopathy: EncephalopathyGrade::Grade1To2,
        ..baseline(2.0, 3.5, 1.7)
    });
    assert_eq!(ten.score, 10);
    assert_eq!(ten.pugh_class, ChildPughClass::C);
}

#[test]
fn child_pugh_score_stays_in_range() {
    for bilirubin in [1.0, 2.5, 9.0] {
        for albumin in [2.0, 3.0, 4.5] {
            for inr in [1.0, 2.0, 3.0] {
                let result = calculate_child_pugh(&baseline(bilirubin, albumin, inr));
                assert!((5..=15).contains(&result.score));
            }
        }
    }
}

#[test]
fn implausible_inputs_warn_but_still_score() {
    let result = calculate_child_pugh(&baseline(60.0, 4.0, 1.0));
    assert_eq!(result.breakdown.bilirubin, 3);
    assert_eq!(result.warnings.len(), 1);

    let quiet = calculate_child_pugh(&baseline(1.5, 4.0, 1.1));
    assert!(quiet.warnings.is_empty());
}

#[test]
fn meld_matches_the_worked_example() {
    assert_eq!(calculate_meld(2.0, 1.5, 1.8), 20);
}

#[test]
fn meld_na_matches_the_worked_example() {
    assert_eq!(calculate_meld_na(2.0, 1.5, 1.8, 130.0), 25);
}

#[test]
fn meld_na_never_falls_below_meld() {
    let meld = calculate_meld(3.0, 2.0, 2.0);
    for sodium in [120.0, 125.0, 130.0, 137.0, 145.0] {
        assert!(calculate_meld_na(3.0, 2.0, 2.0, sodium) >= meld);
    }
}

#[test]
fn sodium_clamp_makes_extremes_equivalent() {
    assert_eq!(
        calculate_meld_na(2.0, 1.5, 1.8, 120.0),
        calculate_meld_na(2.0, 1.5, 1.8, 125.0)
    );
    assert_eq!(
        calculate_meld_na(2.0, 1.5, 1.8, 150.0),
        calculate_meld_na(2.0, 1.5, 1.8, 137.0)
    );
}

#[test]
fn creatinine_clamp_makes_extremes_equivalent() {
    assert_eq!(calculate_meld(2.0, 10.0, 1.8), calculate_meld(2.0, 4.0, 1.8));
    assert_eq!(calculate_meld(2.0, 0.5, 1.8), calculate_meld(2.0, 1.0, 1.8));
}

#[test]
fn meld_is_monotone_in_each_parameter() {
    let base = calculate_meld(2.0, 1.5, 1.8);
    assert!(calculate_meld(2.5, 1.5, 1.8) >= base);
    assert!(calculate_meld(2.0, 2.5, 1.8) >= base);
    assert!(calculate_meld(2.0, 1.5, 2.4) >= base);
}

#[test]
fn urgency_follows_the_configured_bands() {
    let input = MeldInput {
        bilirubin: 2.0,
        creatinine: 1.0,
        inr: 1.1,
        sodium: Some(132.0),
    };

    let result = score_meld(&input, &ScoringConfig::default());
    assert_eq!(result.meld, 10);
    assert_eq!(result.meld_na, Some(15));
    assert_eq!(result.urgency, UrgencyLevel::Medium);

    let strict = ScoringConfig {
        meld_medium_from: 5,
        meld_high_from: 12,
        meld_critical_from: 15,
    };
    let result = score_meld(&input, &strict);
    assert_eq!(result.urgency, UrgencyLevel::Critical);
}

#[test]
fn meld_without_sodium_stays_plain() {
    let input = MeldInput {
        bilirubin: 1.0,
        creatinine: 1.0,
        inr: 1.0,
        sodium: None,
    };
    let result = score_meld(&input, &ScoringConfig::default());
    assert_eq!(result.meld, 6);
    assert_eq!(result.meld_na, None);
    assert_eq!(result.urgency, UrgencyLevel::Low);
}
