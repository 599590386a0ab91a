use crate::workflows::datasets::StudentNeedsProfile;
use super::weights::NeedWeights;
use super::{NeedFactor, ScoreComponent};

fn contribute(components: &mut Vec<ScoreComponent>, factor: NeedFactor, label: String, points: f64) {
    if points != 0.0 {
        components.push(ScoreComponent {
            factor,
            label,
            points,
        });
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Apply the weighting rules in their fixed order, keeping only non-zero addends.
pub(crate) fn score_profile(
    profile: &StudentNeedsProfile,
    weights: &NeedWeights,
) -> Vec<ScoreComponent> {
    let mut components = Vec::new();

    if profile.pupil_premium {
        contribute(
            &mut components,
            NeedFactor::PupilPremium,
            "Pupil Premium".to_string(),
            weights.pupil_premium,
        );
    }

    if profile.looked_after {
        contribute(
            &mut components,
            NeedFactor::LookedAfter,
            "Looked After".to_string(),
            weights.looked_after,
        );
    }

    let need_types = profile.sen_need_types.len();
    if need_types > 0 {
        contribute(
            &mut components,
            NeedFactor::SenNeeds,
            format!("SEN ({})", plural(need_types, "need", "needs")),
            weights.sen_needs_multiplier * need_types as f64,
        );
    }

    if profile.eal {
        contribute(&mut components, NeedFactor::Eal, "EAL".to_string(), weights.eal);
    }

    if let Some(reading) = profile.reading_score {
        if reading < weights.reading_threshold {
            contribute(
                &mut components,
                NeedFactor::LowReading,
                format!("Low Reading ({reading})"),
                weights.reading_score,
            );
        }
    }

    if let Some(spelling) = profile.spelling_score {
        if spelling < weights.spelling_threshold {
            contribute(
                &mut components,
                NeedFactor::LowSpelling,
                format!("Low Spelling ({spelling})"),
                weights.spelling_score,
            );
        }
    }

    if profile.boxall {
        contribute(
            &mut components,
            NeedFactor::Boxall,
            "BOXALL Assessment".to_string(),
            weights.boxall,
        );
    }

    if profile.medical_entries > 0 {
        contribute(
            &mut components,
            NeedFactor::MedicalInfo,
            format!("Medical Information ({})", profile.medical_entries),
            weights.medical_info * f64::from(profile.medical_entries),
        );
    }

    if profile.support_stage > 0 {
        contribute(
            &mut components,
            NeedFactor::StageSupport,
            format!("Support Stage ({})", profile.support_stage),
            weights.stage_support * f64::from(profile.support_stage),
        );
    }

    components
}
