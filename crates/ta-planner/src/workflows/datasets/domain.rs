use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalizer::normalize_name;

/// The three tabular inputs an analysis run joins together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    StudentsClasses,
    StudentsSen,
    Timetable,
}

impl DatasetKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::StudentsClasses, Self::StudentsSen, Self::Timetable]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::StudentsClasses => "students_classes",
            Self::StudentsSen => "students_sen",
            Self::Timetable => "timetable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "students_classes" | "enrolment" | "enrollment" => Some(Self::StudentsClasses),
            "students_sen" | "needs" | "sen" => Some(Self::StudentsSen),
            "timetable" => Some(Self::Timetable),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Case-insensitive student identity shared by all three datasets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentKey(String);

impl StudentKey {
    pub fn new(raw: &str) -> Self {
        Self(normalize_name(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

/// A student and the distinct class codes they are enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentEnrolment {
    pub key: StudentKey,
    pub name: String,
    pub classes: BTreeSet<String>,
}

/// Support and needs attributes used by the need score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentNeedsProfile {
    pub key: StudentKey,
    pub name: String,
    pub pupil_premium: bool,
    pub looked_after: bool,
    pub sen_need_types: BTreeSet<String>,
    pub eal: bool,
    pub reading_score: Option<f64>,
    pub spelling_score: Option<f64>,
    pub boxall: bool,
    pub medical_entries: u32,
    pub support_stage: u32,
}

impl StudentNeedsProfile {
    /// Profile used for enrolled students that have no needs record.
    pub fn absent(key: StudentKey, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            pupil_premium: false,
            looked_after: false,
            sen_need_types: BTreeSet::new(),
            eal: false,
            reading_score: None,
            spelling_score: None,
            boxall: false,
            medical_entries: 0,
            support_stage: 0,
        }
    }
}

/// One timetabled lesson for a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableSession {
    pub day: String,
    pub time_slot: String,
    pub class_code: String,
    pub course_label: String,
    pub staff: String,
    pub room: String,
}

/// Canonical records produced by ingesting a single dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedDataset {
    Enrolment(Vec<StudentEnrolment>),
    Needs(Vec<StudentNeedsProfile>),
    Timetable(Vec<TimetableSession>),
}

impl NormalizedDataset {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::Enrolment(_) => DatasetKind::StudentsClasses,
            Self::Needs(_) => DatasetKind::StudentsSen,
            Self::Timetable(_) => DatasetKind::Timetable,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Enrolment(records) => records.len(),
            Self::Needs(records) => records.len(),
            Self::Timetable(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ingestion receipt returned to callers after a dataset is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub dataset: DatasetKind,
    pub rows: usize,
    pub records: usize,
    pub snapshot_version: u64,
}
