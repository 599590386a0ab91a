use std::sync::Arc;

use super::domain::{
    DatasetKind, NormalizedDataset, StudentEnrolment, StudentNeedsProfile, TimetableSession,
};

/// Immutable view over the three datasets a run reads from.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    pub version: u64,
    pub enrolments: Arc<[StudentEnrolment]>,
    pub needs: Arc<[StudentNeedsProfile]>,
    pub timetable: Arc<[TimetableSession]>,
}

/// Latest ingested dataset per kind.
///
/// Installing a dataset produces a new value; readers holding the previous one keep
/// a consistent view until they drop it.
#[derive(Debug, Clone, Default)]
pub struct StagedDatasets {
    version: u64,
    enrolments: Option<Arc<[StudentEnrolment]>>,
    needs: Option<Arc<[StudentNeedsProfile]>>,
    timetable: Option<Arc<[TimetableSession]>>,
}

impl StagedDatasets {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn with_dataset(&self, dataset: NormalizedDataset) -> Self {
        let mut next = self.clone();
        next.version = self.version + 1;
        match dataset {
            NormalizedDataset::Enrolment(records) => next.enrolments = Some(records.into()),
            NormalizedDataset::Needs(records) => next.needs = Some(records.into()),
            NormalizedDataset::Timetable(records) => next.timetable = Some(records.into()),
        }
        next
    }

    pub fn cleared(&self) -> Self {
        Self {
            version: self.version + 1,
            ..Self::default()
        }
    }

    pub fn installed(&self) -> Vec<DatasetKind> {
        DatasetKind::ordered()
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    pub fn missing(&self) -> Vec<DatasetKind> {
        DatasetKind::ordered()
            .into_iter()
            .filter(|kind| !self.contains(*kind))
            .collect()
    }

    fn contains(&self, kind: DatasetKind) -> bool {
        match kind {
            DatasetKind::StudentsClasses => self.enrolments.is_some(),
            DatasetKind::StudentsSen => self.needs.is_some(),
            DatasetKind::Timetable => self.timetable.is_some(),
        }
    }

    /// Full snapshot, or the kinds that have never been ingested.
    pub fn snapshot(&self) -> Result<DatasetSnapshot, Vec<DatasetKind>> {
        match (&self.enrolments, &self.needs, &self.timetable) {
            (Some(enrolments), Some(needs), Some(timetable)) => Ok(DatasetSnapshot {
                version: self.version,
                enrolments: Arc::clone(enrolments),
                needs: Arc::clone(needs),
                timetable: Arc::clone(timetable),
            }),
            _ => Err(self.missing()),
        }
    }
}
