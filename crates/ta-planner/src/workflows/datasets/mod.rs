//! Ingestion of the enrolment, needs, and timetable uploads into canonical records.
//!
//! Every dataset is validated as a whole: a missing column, an uncoercible cell, or a
//! repeated key rejects the upload before anything downstream can observe it.

mod columns;
pub mod domain;
mod normalizer;
mod parser;
pub mod snapshot;

use std::fmt;
use std::io::Read;
use std::path::Path;

pub use domain::{
    DatasetKind, DatasetSummary, NormalizedDataset, StudentEnrolment, StudentKey,
    StudentNeedsProfile, TimetableSession,
};
pub use snapshot::{DatasetSnapshot, StagedDatasets};

/// A cell that could not be coerced, located by source line and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: u64,
    pub column: String,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} column '{}': {} (got '{}')",
            self.row, self.column, self.reason, self.value
        )
    }
}

fn summarize_rows(errors: &[RowError]) -> String {
    const SHOWN: usize = 5;
    let mut summary = errors
        .iter()
        .take(SHOWN)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    if errors.len() > SHOWN {
        summary.push_str(&format!("; and {} more", errors.len() - SHOWN));
    }
    summary
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("{dataset} dataset is missing required column(s): {}", .missing.join(", "))]
    Schema {
        dataset: DatasetKind,
        missing: Vec<String>,
    },
    #[error("{dataset} dataset rejected, {} invalid cell(s): {}", .errors.len(), summarize_rows(.errors))]
    RowValidation {
        dataset: DatasetKind,
        errors: Vec<RowError>,
    },
    #[error("{dataset} dataset repeats '{key}' on rows {first_row} and {second_row}")]
    DuplicateKey {
        dataset: DatasetKind,
        key: String,
        first_row: u64,
        second_row: u64,
    },
    #[error("{dataset} dataset is not valid delimited text: {source}")]
    Malformed {
        dataset: DatasetKind,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read {dataset} dataset: {source}")]
    Io {
        dataset: DatasetKind,
        #[source]
        source: std::io::Error,
    },
}

impl DatasetError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema { .. } | Self::Malformed { .. } => "SchemaError",
            Self::RowValidation { .. } => "RowValidationError",
            Self::DuplicateKey { .. } => "DuplicateKeyError",
            Self::Io { .. } => "IoError",
        }
    }

    pub fn dataset(&self) -> DatasetKind {
        match self {
            Self::Schema { dataset, .. }
            | Self::RowValidation { dataset, .. }
            | Self::DuplicateKey { dataset, .. }
            | Self::Malformed { dataset, .. }
            | Self::Io { dataset, .. } => *dataset,
        }
    }
}

/// Entry point turning raw delimited text into a [`NormalizedDataset`].
pub struct DatasetImporter;

impl DatasetImporter {
    pub fn from_path<P: AsRef<Path>>(
        kind: DatasetKind,
        path: P,
    ) -> Result<(NormalizedDataset, usize), DatasetError> {
        let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
            dataset: kind,
            source,
        })?;
        Self::from_reader(kind, file)
    }

    /// Parse and normalize one dataset, returning the records and the data-row count.
    pub fn from_reader<R: Read>(
        kind: DatasetKind,
        reader: R,
    ) -> Result<(NormalizedDataset, usize), DatasetError> {
        let table = parser::parse_table(reader).map_err(|source| DatasetError::Malformed {
            dataset: kind,
            source,
        })?;
        let rows = table.rows.len();

        let dataset = match kind {
            DatasetKind::StudentsClasses => {
                NormalizedDataset::Enrolment(normalizer::normalize_enrolment(&table)?)
            }
            DatasetKind::StudentsSen => {
                NormalizedDataset::Needs(normalizer::normalize_needs(&table)?)
            }
            DatasetKind::Timetable => {
                NormalizedDataset::Timetable(normalizer::normalize_timetable(&table)?)
            }
        };

        tracing::debug!(dataset = %kind, rows, records = dataset.len(), "dataset normalized");
        Ok((dataset, rows))
    }
}
