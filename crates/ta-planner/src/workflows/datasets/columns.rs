use super::domain::DatasetKind;
use super::normalizer::normalize_name;
use super::DatasetError;

/// A logical column and the header spellings accepted for it; the first alias is canonical.
pub(crate) struct ColumnSpec {
    pub(crate) aliases: &'static [&'static str],
}

impl ColumnSpec {
    pub(crate) fn label(&self) -> &'static str {
        self.aliases[0]
    }
}

pub(crate) const STUDENT_NAME: ColumnSpec = ColumnSpec {
    aliases: &["Name", "Student Name", "Student"],
};

pub(crate) const CLASS_LIST: ColumnSpec = ColumnSpec {
    aliases: &["Courses/classes", "Classes", "Class List"],
};

pub(crate) const PUPIL_PREMIUM: ColumnSpec = ColumnSpec {
    aliases: &[
        "Pupil Premium Recipient at any time this academic year?",
        "Pupil Premium",
    ],
};

pub(crate) const LOOKED_AFTER: ColumnSpec = ColumnSpec {
    aliases: &["Looked After (In Care) Status", "Looked After"],
};

pub(crate) const SEN_FLAG: ColumnSpec = ColumnSpec {
    aliases: &["SEN at any time this academic year?", "SEN"],
};

pub(crate) const SEN_NEEDS: ColumnSpec = ColumnSpec {
    aliases: &["SEN need(s)", "SEN Needs", "SEN Need Types"],
};

pub(crate) const EAL: ColumnSpec = ColumnSpec {
    aliases: &["EAL at any time this academic year?", "EAL"],
};

pub(crate) const READING_SCORE: ColumnSpec = ColumnSpec {
    aliases: &["Read. Comp. Standardised Score", "Reading Score"],
};

pub(crate) const SPELLING_SCORE: ColumnSpec = ColumnSpec {
    aliases: &["Spelling Standardised Score", "Spelling Score"],
};

pub(crate) const BOXALL: ColumnSpec = ColumnSpec {
    aliases: &["BOXALL", "Boxall Profile"],
};

pub(crate) const MEDICAL_COLUMNS: &[&str] = &[
    "Neurodiversity and/or Sensory Impairment",
    "Medical Information",
    "Health Care Plan/Risk Assessment",
];

pub(crate) const STAGE_COLUMNS: &[&str] = &["Stage 1", "Stage 2", "Stage 3", "Stage 4", "Stage 5"];

/// Enrolment entries that name a whole-year session rather than a taught class.
pub(crate) const NON_TEACHING_TOKENS: &[&str] = &["Assembly", "Pe/Games"];

pub(crate) const DAY: ColumnSpec = ColumnSpec {
    aliases: &["Day"],
};

pub(crate) const TIME_SLOT: ColumnSpec = ColumnSpec {
    aliases: &["Time Slot", "Period"],
};

pub(crate) const COURSE_CLASS: ColumnSpec = ColumnSpec {
    aliases: &["Course/Class", "Class Code", "Class"],
};

pub(crate) const STAFF: ColumnSpec = ColumnSpec {
    aliases: &["Staff", "Teacher"],
};

pub(crate) const ROOM: ColumnSpec = ColumnSpec {
    aliases: &["Room"],
};

pub(crate) const SUSPENDED: ColumnSpec = ColumnSpec {
    aliases: &["Suspended?", "Suspended"],
};

/// Header lookup tolerant of case, stray whitespace, and byte-order marks.
pub(crate) struct HeaderIndex {
    normalized: Vec<String>,
}

impl HeaderIndex {
    pub(crate) fn new(headers: &[String]) -> Self {
        Self {
            normalized: headers.iter().map(|header| normalize_name(header)).collect(),
        }
    }

    pub(crate) fn position_of(&self, name: &str) -> Option<usize> {
        let wanted = normalize_name(name);
        self.normalized.iter().position(|header| *header == wanted)
    }

    pub(crate) fn position(&self, spec: &ColumnSpec) -> Option<usize> {
        spec.aliases
            .iter()
            .find_map(|alias| self.position_of(alias))
    }
}

/// Accumulates every missing column so a single error names all of them.
///
/// Positions handed out before [`SchemaCheck::finish`] succeeds are placeholders.
pub(crate) struct SchemaCheck<'a> {
    dataset: DatasetKind,
    index: &'a HeaderIndex,
    missing: Vec<String>,
}

impl<'a> SchemaCheck<'a> {
    pub(crate) fn new(dataset: DatasetKind, index: &'a HeaderIndex) -> Self {
        Self {
            dataset,
            index,
            missing: Vec::new(),
        }
    }

    pub(crate) fn require(&mut self, spec: &ColumnSpec) -> usize {
        match self.index.position(spec) {
            Some(position) => position,
            None => {
                self.missing.push(spec.label().to_string());
                0
            }
        }
    }

    /// Resolve a column group where at least one member must be present.
    pub(crate) fn require_any(&mut self, label: &str, names: &[&str]) -> Vec<usize> {
        let positions = names
            .iter()
            .filter_map(|name| self.index.position_of(name))
            .collect::<Vec<_>>();
        if positions.is_empty() {
            self.missing.push(label.to_string());
        }
        positions
    }

    pub(crate) fn optional(&self, spec: &ColumnSpec) -> Option<usize> {
        self.index.position(spec)
    }

    pub(crate) fn finish(self) -> Result<(), DatasetError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::Schema {
                dataset: self.dataset,
                missing: self.missing,
            })
        }
    }
}
