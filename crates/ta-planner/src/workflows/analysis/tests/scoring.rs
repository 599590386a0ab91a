use super::common::*;
use crate::workflows::analysis::scoring::{
    NeedBand, NeedFactor, NeedScoringEngine, NeedWeights, WeightingError,
};

#[test]
fn pupil_premium_with_two_sen_needs_scores_high() {
    let engine = NeedScoringEngine::new(NeedWeights::default());
    let mut student = sen_profile("Amara Okafor", &["Dyslexia", "ADHD"]);
    student.pupil_premium = true;

    let score = engine.score(&student);

    assert_eq!(score.total, 8.0);
    assert_eq!(score.band(), NeedBand::High);
    assert_eq!(score.breakdown(), "Pupil Premium: +2; SEN (2 needs): +6");
}

#[test]
fn contributions_follow_fixed_rule_order() {
    let engine = NeedScoringEngine::new(NeedWeights::default());
    let mut student = sen_profile("Ben Carter", &["Autism"]);
    student.support_stage = 2;
    student.medical_entries = 1;
    student.boxall = true;
    student.spelling_score = Some(80.0);
    student.reading_score = Some(70.5);
    student.eal = true;
    student.looked_after = true;
    student.pupil_premium = true;

    let factors: Vec<NeedFactor> = engine
        .score(&student)
        .components
        .iter()
        .map(|component| component.factor)
        .collect();

    assert_eq!(
        factors,
        vec![
            NeedFactor::PupilPremium,
            NeedFactor::LookedAfter,
            NeedFactor::SenNeeds,
            NeedFactor::Eal,
            NeedFactor::LowReading,
            NeedFactor::LowSpelling,
            NeedFactor::Boxall,
            NeedFactor::MedicalInfo,
            NeedFactor::StageSupport,
        ]
    );
    assert_eq!(engine.score(&student).total, 2.0 + 3.0 + 3.0 + 1.0 + 2.0 + 2.0 + 2.0 + 1.0 + 2.0);
}

#[test]
fn scores_at_threshold_do_not_count_as_low() {
    let engine = NeedScoringEngine::new(NeedWeights::default());
    let mut student = profile("Chloe Davies");
    student.reading_score = Some(85.0);
    student.spelling_score = Some(84.9);

    let score = engine.score(&student);

    assert_eq!(score.total, 2.0);
    assert_eq!(score.breakdown(), "Low Spelling (84.9): +2");
}

#[test]
fn zero_weighted_rules_leave_no_breakdown_entry() {
    let weights = NeedWeights {
        eal: 0.0,
        ..NeedWeights::default()
    };
    let engine = NeedScoringEngine::new(weights);
    let mut student = profile("Dev Patel");
    student.eal = true;

    let score = engine.score(&student);

    assert_eq!(score.total, 0.0);
    assert_eq!(score.band(), NeedBand::None);
    assert_eq!(score.breakdown(), "No specific needs identified");
}

#[test]
fn fractional_weights_render_without_float_noise() {
    let weights = NeedWeights {
        medical_info: 0.1,
        ..NeedWeights::default()
    };
    let engine = NeedScoringEngine::new(weights);
    let mut student = profile("Dev Patel");
    student.medical_entries = 3;

    let score = engine.score(&student);

    assert_eq!(score.breakdown(), "Medical Information (3): +0.3");
    assert_eq!(score.band(), NeedBand::Low);
}

#[test]
fn bands_cover_fractional_boundaries() {
    assert_eq!(NeedBand::from_score(0.0), NeedBand::None);
    assert_eq!(NeedBand::from_score(0.5), NeedBand::Low);
    assert_eq!(NeedBand::from_score(3.99), NeedBand::Low);
    assert_eq!(NeedBand::from_score(4.0), NeedBand::Medium);
    assert_eq!(NeedBand::from_score(7.9), NeedBand::Medium);
    assert_eq!(NeedBand::from_score(8.0), NeedBand::High);
}

#[test]
fn population_scoring_keeps_enrolment_order_and_flags_unmatched() {
    let engine = NeedScoringEngine::new(NeedWeights::default());
    let enrolments = vec![
        enrolment("Zed Young", &["7E/Ma1"]),
        enrolment("Amara Okafor", &["7E/Ma1", "7E/En2"]),
    ];
    let mut amara = sen_profile("amara  okafor", &["Dyslexia"]);
    amara.pupil_premium = true;
    let needs = vec![amara, profile("Needs Only")];

    let scored = engine.score_population(&enrolments, &needs);

    assert_eq!(scored.len(), 2);
    assert_eq!(scored[0].name, "Zed Young");
    assert!(!scored[0].has_needs_record);
    assert_eq!(scored[0].score, 0.0);
    assert_eq!(scored[1].name, "Amara Okafor");
    assert!(scored[1].has_needs_record);
    assert_eq!(scored[1].score, 5.0);
    assert_eq!(scored[1].class_count, 2);
}

#[test]
fn negative_weights_are_rejected() {
    let weights = NeedWeights {
        boxall: -1.0,
        ..NeedWeights::default()
    };
    assert_eq!(
        weights.validate(),
        Err(WeightingError::Negative {
            field: "boxall",
            value: -1.0
        })
    );

    let weights = NeedWeights {
        reading_threshold: f64::NAN,
        ..NeedWeights::default()
    };
    assert_eq!(
        weights.validate(),
        Err(WeightingError::NotFinite {
            field: "reading_threshold"
        })
    );
    assert_eq!(NeedWeights::default().validate(), Ok(()));
}
