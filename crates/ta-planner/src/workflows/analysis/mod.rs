//! Need scoring, class aggregation, ranking, and the run orchestration around them.
//!
//! [`compute_report`] is the pure pipeline; [`NeedAnalysisService`] wraps it with the
//! config, dataset and result stores, and [`analysis_router`] exposes that over HTTP.

pub mod aggregation;
pub mod domain;
pub mod memory;
pub mod report;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use aggregation::{
    aggregate, Aggregation, AggregationPolicy, ClassAggregate, ClassMember, PriorityBand,
    TimetableGridEntry, TimetableSlot,
};
pub use domain::{
    AnalysisResult, ResultId, SchoolId, StoredAnalysis, WeightingConfig, WeightingConfigDraft,
    WeightingConfigId,
};
pub use memory::{InMemoryDatasets, InMemoryResults, InMemoryWeightingConfigs};
pub use report::{AnalysisReport, PopulationStatistics};
pub use repository::{DatasetStore, RepositoryError, ResultStore, WeightingConfigStore};
pub use router::analysis_router;
pub use scoring::{
    NeedBand, NeedFactor, NeedScore, NeedScoringEngine, NeedWeights, ScoreComponent,
    StudentNeed, WeightingError, HIGH_NEED_THRESHOLD,
};
pub use service::{AnalysisError, NeedAnalysisService};

use crate::workflows::datasets::DatasetSnapshot;

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Score every enrolled student, roll the scores up per class, and rank the results.
///
/// Scoring completes for the whole population before aggregation starts.
pub fn compute_report(
    snapshot: &DatasetSnapshot,
    weights: &NeedWeights,
    policy: &AggregationPolicy,
) -> AnalysisReport {
    let engine = NeedScoringEngine::new(weights.clone());
    let students = engine.score_population(&snapshot.enrolments, &snapshot.needs);
    let aggregation = aggregate(&snapshot.enrolments, &students, &snapshot.timetable, policy);
    AnalysisReport::build(students, aggregation)
}
