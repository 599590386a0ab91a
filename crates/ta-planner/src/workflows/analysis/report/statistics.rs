use serde::Serialize;

use crate::workflows::analysis::aggregation::ClassAggregate;
use crate::workflows::analysis::round_to;
use crate::workflows::analysis::scoring::{NeedBand, StudentNeed};

/// Population summary across every scored student and aggregated class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulationStatistics {
    pub total_students: usize,
    pub total_classes: usize,
    pub no_needs: usize,
    pub low_needs: usize,
    pub medium_needs: usize,
    pub high_needs: usize,
    pub average_score: f64,
    pub max_score: f64,
    pub average_class_score: f64,
    pub unmatched_students: usize,
    pub excluded_classes: usize,
}

impl PopulationStatistics {
    pub fn collect(
        students: &[StudentNeed],
        classes: &[ClassAggregate],
        excluded_classes: usize,
    ) -> Self {
        let mut statistics = Self {
            total_students: students.len(),
            excluded_classes,
            ..Self::default()
        };

        let mut total_score = 0.0;
        for student in students {
            match student.band {
                NeedBand::None => statistics.no_needs += 1,
                NeedBand::Low => statistics.low_needs += 1,
                NeedBand::Medium => statistics.medium_needs += 1,
                NeedBand::High => statistics.high_needs += 1,
            }
            if !student.has_needs_record {
                statistics.unmatched_students += 1;
            }
            total_score += student.score;
            statistics.max_score = statistics.max_score.max(student.score);
        }
        if !students.is_empty() {
            statistics.average_score = round_to(total_score / students.len() as f64, 2);
        }

        let populated: Vec<&ClassAggregate> = classes
            .iter()
            .filter(|class| class.student_count > 0)
            .collect();
        statistics.total_classes = populated.len();
        if !populated.is_empty() {
            let class_total: f64 = populated.iter().map(|class| class.weighted_score).sum();
            statistics.average_class_score = round_to(class_total / populated.len() as f64, 2);
        }

        statistics
    }

    pub fn banded_total(&self) -> usize {
        self.no_needs + self.low_needs + self.medium_needs + self.high_needs
    }
}
