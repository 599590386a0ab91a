mod rules;
mod weights;

pub use weights::{NeedWeights, WeightingError};

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use super::round_to;
use crate::workflows::datasets::{StudentEnrolment, StudentKey, StudentNeedsProfile};

/// Score at or above which a student counts as high need.
pub const HIGH_NEED_THRESHOLD: f64 = 8.0;

const NO_NEEDS_BREAKDOWN: &str = "No specific needs identified";

/// The attribute a breakdown entry was awarded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedFactor {
    PupilPremium,
    LookedAfter,
    SenNeeds,
    Eal,
    LowReading,
    LowSpelling,
    Boxall,
    MedicalInfo,
    StageSupport,
}

/// Discrete contribution to a need score, kept for transparent breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub factor: NeedFactor,
    pub label: String,
    pub points: f64,
}

impl ScoreComponent {
    pub fn describe(&self) -> String {
        format!("{}: +{}", self.label, round_to(self.points, 2))
    }
}

/// Student need bands shared by colouring and the population statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedBand {
    None,
    Low,
    Medium,
    High,
}

impl NeedBand {
    pub fn from_score(score: f64) -> Self {
        if score <= 0.0 {
            Self::None
        } else if score < 4.0 {
            Self::Low
        } else if score < HIGH_NEED_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Total need score with its ordered breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeedScore {
    pub total: f64,
    pub components: Vec<ScoreComponent>,
}

impl NeedScore {
    pub fn band(&self) -> NeedBand {
        NeedBand::from_score(self.total)
    }

    pub fn breakdown(&self) -> String {
        if self.components.is_empty() {
            NO_NEEDS_BREAKDOWN.to_string()
        } else {
            self.components
                .iter()
                .map(ScoreComponent::describe)
                .collect::<Vec<_>>()
                .join("; ")
        }
    }
}

/// Scored student as it appears in rankings and class rollups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentNeed {
    #[serde(skip)]
    pub key: StudentKey,
    pub name: String,
    pub score: f64,
    pub band: NeedBand,
    pub breakdown: String,
    pub components: Vec<ScoreComponent>,
    pub class_count: usize,
    pub has_needs_record: bool,
}

/// Stateless scorer applying one weighting configuration to needs profiles.
pub struct NeedScoringEngine {
    weights: NeedWeights,
}

impl NeedScoringEngine {
    pub fn new(weights: NeedWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &NeedWeights {
        &self.weights
    }

    pub fn score(&self, profile: &StudentNeedsProfile) -> NeedScore {
        let components = rules::score_profile(profile, &self.weights);
        let total = components.iter().map(|component| component.points).sum();
        NeedScore { total, components }
    }

    /// Score every enrolled student, joining needs profiles by student key.
    ///
    /// Students without a needs record score as an absent profile. Output order follows
    /// `enrolments` regardless of how the work is scheduled.
    pub fn score_population(
        &self,
        enrolments: &[StudentEnrolment],
        needs: &[StudentNeedsProfile],
    ) -> Vec<StudentNeed> {
        let profiles: HashMap<&StudentKey, &StudentNeedsProfile> =
            needs.iter().map(|profile| (&profile.key, profile)).collect();

        enrolments
            .par_iter()
            .map(|enrolment| {
                let matched = profiles.get(&enrolment.key).copied();
                let score = match matched {
                    Some(profile) => self.score(profile),
                    None => self.score(&StudentNeedsProfile::absent(
                        enrolment.key.clone(),
                        enrolment.name.clone(),
                    )),
                };

                StudentNeed {
                    key: enrolment.key.clone(),
                    name: enrolment.name.clone(),
                    score: score.total,
                    band: score.band(),
                    breakdown: score.breakdown(),
                    components: score.components,
                    class_count: enrolment.classes.len(),
                    has_needs_record: matched.is_some(),
                }
            })
            .collect()
    }
}
