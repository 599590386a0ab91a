pub mod ranking;
pub mod slots;
pub mod statistics;

pub use statistics::PopulationStatistics;

use serde::Serialize;

use super::aggregation::{Aggregation, ClassAggregate, TimetableSlot};
use super::scoring::StudentNeed;

/// Ranked lists, statistics and grid for one run. Lists are never truncated here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub statistics: PopulationStatistics,
    pub top_students: Vec<StudentNeed>,
    pub top_classes: Vec<ClassAggregate>,
    pub timetable_grid: Vec<TimetableSlot>,
}

impl AnalysisReport {
    pub fn build(students: Vec<StudentNeed>, aggregation: Aggregation) -> Self {
        let statistics = PopulationStatistics::collect(
            &students,
            &aggregation.classes,
            aggregation.excluded_classes.len(),
        );

        Self {
            statistics,
            top_students: ranking::rank_students(students),
            top_classes: ranking::rank_classes(&aggregation.classes),
            timetable_grid: ranking::order_grid(aggregation.grid),
        }
    }

    pub fn student_prefix(&self, limit: Option<usize>) -> &[StudentNeed] {
        prefix(&self.top_students, limit)
    }

    pub fn class_prefix(&self, limit: Option<usize>) -> &[ClassAggregate] {
        prefix(&self.top_classes, limit)
    }
}

fn prefix<T>(items: &[T], limit: Option<usize>) -> &[T] {
    match limit {
        Some(limit) => &items[..limit.min(items.len())],
        None => items,
    }
}
