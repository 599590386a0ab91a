use std::collections::{BTreeSet, HashMap};

use super::columns::{
    HeaderIndex, SchemaCheck, BOXALL, CLASS_LIST, COURSE_CLASS, DAY, EAL, LOOKED_AFTER,
    MEDICAL_COLUMNS, NON_TEACHING_TOKENS, PUPIL_PREMIUM, READING_SCORE, ROOM, SEN_FLAG,
    SEN_NEEDS, SPELLING_SCORE, STAFF, STAGE_COLUMNS, STUDENT_NAME, SUSPENDED, TIME_SLOT,
};
use super::domain::{
    DatasetKind, StudentEnrolment, StudentKey, StudentNeedsProfile, TimetableSession,
};
use super::parser::{RawRow, RawTable};
use super::{DatasetError, RowError};

pub(crate) fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

fn display_name(value: &str) -> String {
    value
        .replace(['\u{feff}', '\u{200b}'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a multi-valued cell on commas or semicolons, dropping empty tokens.
pub(crate) fn split_multi(value: &str) -> impl Iterator<Item = &str> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn is_non_teaching(code: &str) -> bool {
    NON_TEACHING_TOKENS
        .iter()
        .any(|token| token.eq_ignore_ascii_case(code))
}

/// Resolve `Maths: Year 7: 7E/Ma2JDI` style enrolment tokens to a class code.
///
/// Assemblies and games sessions resolve to `None`.
pub(crate) fn class_code_from_enrolment(token: &str) -> Option<String> {
    let token = token.trim();
    let code = if token.contains(':') {
        let segments = token.split(':').map(str::trim).collect::<Vec<_>>();
        let last = segments.last().copied().unwrap_or_default();
        if last.contains('/') {
            last
        } else {
            segments.first().copied().unwrap_or_default()
        }
    } else {
        token
    };

    Some(code.to_string()).filter(|code| !code.is_empty() && !is_non_teaching(code))
}

/// Timetable course labels carry the class code after the last `": "`.
pub(crate) fn class_code_from_timetable(value: &str) -> String {
    value
        .rsplit(": ")
        .next()
        .unwrap_or(value)
        .trim()
        .to_string()
}

fn is_blank(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || trimmed == "."
}

/// Presence-style cells count whenever they hold anything other than a blank or `.`.
pub(crate) fn is_present(cell: &str) -> bool {
    !is_blank(cell)
}

/// Looked-after status also reads an explicit `No` as absent.
pub(crate) fn is_looked_after(cell: &str) -> bool {
    is_present(cell) && !cell.trim().eq_ignore_ascii_case("no")
}

pub(crate) fn parse_flag(cell: &str) -> Result<bool, &'static str> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" | "" | "." => Ok(false),
        _ => Err("expected a yes/no value"),
    }
}

pub(crate) fn parse_score(cell: &str) -> Result<Option<f64>, &'static str> {
    if is_blank(cell) {
        return Ok(None);
    }

    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err("expected a numeric score"),
    }
}

/// Row-level coercion failures for one dataset.
struct RowIssues {
    dataset: DatasetKind,
    errors: Vec<RowError>,
}

impl RowIssues {
    fn new(dataset: DatasetKind) -> Self {
        Self {
            dataset,
            errors: Vec::new(),
        }
    }

    fn push(&mut self, row: &RawRow, column: &str, value: &str, reason: &str) {
        self.errors.push(RowError {
            row: row.line,
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        });
    }

    fn coerce<T: Default>(
        &mut self,
        row: &RawRow,
        position: usize,
        column: &str,
        parse: impl Fn(&str) -> Result<T, &'static str>,
    ) -> T {
        let value = row.cell(position);
        match parse(value) {
            Ok(parsed) => parsed,
            Err(reason) => {
                self.push(row, column, value, reason);
                T::default()
            }
        }
    }

    fn finish(self) -> Result<(), DatasetError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::RowValidation {
                dataset: self.dataset,
                errors: self.errors,
            })
        }
    }
}

/// Tracks join keys so repeated rows are reported instead of merged.
#[derive(Default)]
struct KeyRegistry {
    seen: HashMap<String, u64>,
    duplicate: Option<(String, u64, u64)>,
}

impl KeyRegistry {
    fn observe(&mut self, key: String, display: &str, line: u64) {
        match self.seen.get(&key) {
            Some(first) => {
                if self.duplicate.is_none() {
                    self.duplicate = Some((display.to_string(), *first, line));
                }
            }
            None => {
                self.seen.insert(key, line);
            }
        }
    }

    fn finish(self, dataset: DatasetKind) -> Result<(), DatasetError> {
        match self.duplicate {
            Some((key, first_row, second_row)) => Err(DatasetError::DuplicateKey {
                dataset,
                key,
                first_row,
                second_row,
            }),
            None => Ok(()),
        }
    }
}

pub(crate) fn normalize_enrolment(table: &RawTable) -> Result<Vec<StudentEnrolment>, DatasetError> {
    let dataset = DatasetKind::StudentsClasses;
    let index = HeaderIndex::new(&table.headers);
    let mut schema = SchemaCheck::new(dataset, &index);
    let name_col = schema.require(&STUDENT_NAME);
    let classes_col = schema.require(&CLASS_LIST);
    schema.finish()?;

    let mut issues = RowIssues::new(dataset);
    let mut keys = KeyRegistry::default();
    let mut students = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let raw_name = row.cell(name_col);
        let key = StudentKey::new(raw_name);
        if key.is_blank() {
            issues.push(row, STUDENT_NAME.label(), raw_name, "student name is blank");
            continue;
        }

        keys.observe(key.as_str().to_string(), raw_name, row.line);

        let classes = split_multi(row.cell(classes_col))
            .filter_map(class_code_from_enrolment)
            .collect::<BTreeSet<_>>();

        students.push(StudentEnrolment {
            key,
            name: display_name(raw_name),
            classes,
        });
    }

    issues.finish()?;
    keys.finish(dataset)?;
    Ok(students)
}

pub(crate) fn normalize_needs(table: &RawTable) -> Result<Vec<StudentNeedsProfile>, DatasetError> {
    let dataset = DatasetKind::StudentsSen;
    let index = HeaderIndex::new(&table.headers);
    let mut schema = SchemaCheck::new(dataset, &index);
    let name_col = schema.require(&STUDENT_NAME);
    let pupil_premium_col = schema.require(&PUPIL_PREMIUM);
    let sen_flag_col = schema.require(&SEN_FLAG);
    let sen_needs_col = schema.require(&SEN_NEEDS);
    let eal_col = schema.require(&EAL);
    let reading_col = schema.require(&READING_SCORE);
    let spelling_col = schema.require(&SPELLING_SCORE);
    let boxall_col = schema.require(&BOXALL);
    let medical_cols = schema.require_any("Medical Information", MEDICAL_COLUMNS);
    let stage_cols = schema.require_any("Stage 1", STAGE_COLUMNS);
    let looked_after_col = schema.optional(&LOOKED_AFTER);
    schema.finish()?;

    let mut issues = RowIssues::new(dataset);
    let mut keys = KeyRegistry::default();
    let mut profiles = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let raw_name = row.cell(name_col);
        let key = StudentKey::new(raw_name);
        if key.is_blank() {
            issues.push(row, STUDENT_NAME.label(), raw_name, "student name is blank");
            continue;
        }

        keys.observe(key.as_str().to_string(), raw_name, row.line);

        let pupil_premium = issues.coerce(row, pupil_premium_col, PUPIL_PREMIUM.label(), parse_flag);
        let sen = issues.coerce(row, sen_flag_col, SEN_FLAG.label(), parse_flag);
        let eal = issues.coerce(row, eal_col, EAL.label(), parse_flag);
        let reading_score = issues.coerce(row, reading_col, READING_SCORE.label(), parse_score);
        let spelling_score = issues.coerce(row, spelling_col, SPELLING_SCORE.label(), parse_score);

        let sen_need_types = if sen {
            split_multi(row.cell(sen_needs_col))
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
        } else {
            BTreeSet::new()
        };

        let looked_after = looked_after_col
            .map(|position| is_looked_after(row.cell(position)))
            .unwrap_or(false);

        let medical_entries = medical_cols
            .iter()
            .filter(|position| is_present(row.cell(**position)))
            .count() as u32;
        let support_stage = stage_cols
            .iter()
            .filter(|position| is_present(row.cell(**position)))
            .count() as u32;

        profiles.push(StudentNeedsProfile {
            key,
            name: display_name(raw_name),
            pupil_premium,
            looked_after,
            sen_need_types,
            eal,
            reading_score,
            spelling_score,
            boxall: is_present(row.cell(boxall_col)),
            medical_entries,
            support_stage,
        });
    }

    issues.finish()?;
    keys.finish(dataset)?;
    Ok(profiles)
}

pub(crate) fn normalize_timetable(table: &RawTable) -> Result<Vec<TimetableSession>, DatasetError> {
    let dataset = DatasetKind::Timetable;
    let index = HeaderIndex::new(&table.headers);
    let mut schema = SchemaCheck::new(dataset, &index);
    let day_col = schema.require(&DAY);
    let slot_col = schema.require(&TIME_SLOT);
    let class_col = schema.require(&COURSE_CLASS);
    let staff_col = schema.require(&STAFF);
    let room_col = schema.require(&ROOM);
    let suspended_col = schema.optional(&SUSPENDED);
    schema.finish()?;

    let mut issues = RowIssues::new(dataset);
    let mut keys = KeyRegistry::default();
    let mut sessions = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let day = display_name(row.cell(day_col));
        let time_slot = display_name(row.cell(slot_col));
        let course_label = display_name(row.cell(class_col));
        let class_code = class_code_from_timetable(&course_label);

        if day.is_empty() {
            issues.push(row, DAY.label(), "", "day is blank");
        }
        if time_slot.is_empty() {
            issues.push(row, TIME_SLOT.label(), "", "time slot is blank");
        }
        if class_code.is_empty() {
            issues.push(row, COURSE_CLASS.label(), &course_label, "class code is blank");
        }

        let suspended = suspended_col
            .map(|position| issues.coerce(row, position, SUSPENDED.label(), parse_flag))
            .unwrap_or(false);

        if suspended || day.is_empty() || time_slot.is_empty() || class_code.is_empty() {
            continue;
        }

        keys.observe(
            format!(
                "{}\u{1f}{}\u{1f}{}",
                normalize_name(&day),
                normalize_name(&time_slot),
                class_code
            ),
            &format!("{day} {time_slot} {class_code}"),
            row.line,
        );

        sessions.push(TimetableSession {
            day,
            time_slot,
            class_code,
            course_label,
            staff: display_name(row.cell(staff_col)),
            room: display_name(row.cell(room_col)),
        });
    }

    issues.finish()?;
    keys.finish(dataset)?;
    Ok(sessions)
}
