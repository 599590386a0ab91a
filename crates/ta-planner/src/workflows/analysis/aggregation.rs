use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::round_to;
use super::scoring::{StudentNeed, HIGH_NEED_THRESHOLD};
use crate::workflows::datasets::{StudentEnrolment, StudentKey, TimetableSession};

/// Optional class filters for whole-year assemblies and registration periods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationPolicy {
    pub max_class_size: Option<usize>,
    pub excluded_time_slots: Vec<String>,
}

impl AggregationPolicy {
    pub fn excludes_slot(&self, time_slot: &str) -> bool {
        self.excluded_time_slots
            .iter()
            .any(|fragment| time_slot.contains(fragment.as_str()))
    }
}

/// Class priority bins over the weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityBand {
    Low,
    Medium,
    High,
}

impl PriorityBand {
    pub fn from_weighted_score(weighted_score: f64) -> Self {
        if weighted_score >= 20.0 {
            Self::High
        } else if weighted_score >= 10.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMember {
    pub name: String,
    pub score: f64,
}

/// Rollup of the need scores of every student enrolled in one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassAggregate {
    pub class_code: String,
    pub student_count: usize,
    pub high_need_students: usize,
    pub total_need_score: f64,
    pub average_need_score: f64,
    pub max_need_score: f64,
    pub weighted_score: f64,
    pub priority: PriorityBand,
    pub students: Vec<ClassMember>,
}

impl ClassAggregate {
    fn from_members(class_code: String, mut students: Vec<ClassMember>) -> Self {
        let student_count = students.len();
        let total_need_score: f64 = students.iter().map(|member| member.score).sum();
        let high_need_students = students
            .iter()
            .filter(|member| member.score >= HIGH_NEED_THRESHOLD)
            .count();
        let max_need_score = students
            .iter()
            .map(|member| member.score)
            .fold(0.0, f64::max);
        let average_need_score = if student_count == 0 {
            0.0
        } else {
            round_to(total_need_score / student_count as f64, 2)
        };
        let weighted_score = round_to(total_need_score, 1);

        students.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            class_code,
            student_count,
            high_need_students,
            total_need_score,
            average_need_score,
            max_need_score,
            weighted_score,
            priority: PriorityBand::from_weighted_score(weighted_score),
            students,
        }
    }
}

/// A timetabled lesson annotated with its class rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimetableGridEntry {
    pub day: String,
    pub time_slot: String,
    pub class_code: String,
    pub course_label: String,
    pub staff: String,
    pub room: String,
    pub student_count: usize,
    pub high_need_students: usize,
    pub total_need_score: f64,
    pub average_need_score: f64,
    pub weighted_score: f64,
    pub priority: PriorityBand,
}

impl TimetableGridEntry {
    fn new(session: &TimetableSession, aggregate: Option<&ClassAggregate>) -> Self {
        Self {
            day: session.day.clone(),
            time_slot: session.time_slot.clone(),
            class_code: session.class_code.clone(),
            course_label: session.course_label.clone(),
            staff: session.staff.clone(),
            room: session.room.clone(),
            student_count: aggregate.map_or(0, |class| class.student_count),
            high_need_students: aggregate.map_or(0, |class| class.high_need_students),
            total_need_score: aggregate.map_or(0.0, |class| class.total_need_score),
            average_need_score: aggregate.map_or(0.0, |class| class.average_need_score),
            weighted_score: aggregate.map_or(0.0, |class| class.weighted_score),
            priority: aggregate.map_or(PriorityBand::Low, |class| class.priority),
        }
    }
}

/// All lessons sharing one time slot label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimetableSlot {
    pub time_slot: String,
    pub entries: Vec<TimetableGridEntry>,
}

/// Output of the join: class rollups in aggregation order and the unsorted grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub classes: Vec<ClassAggregate>,
    pub grid: Vec<TimetableSlot>,
    pub excluded_classes: Vec<String>,
}

/// Join enrolments, scores, and sessions into class rollups and a slot-keyed grid.
///
/// Classes keep the order in which enrolment first mentions them. Slots appear in timetable
/// order and entries within a slot follow class aggregation order, with timetable-only
/// classes last. Ranking decides the presentation order.
pub fn aggregate(
    enrolments: &[StudentEnrolment],
    students: &[StudentNeed],
    timetable: &[TimetableSession],
    policy: &AggregationPolicy,
) -> Aggregation {
    let scores: HashMap<&StudentKey, &StudentNeed> =
        students.iter().map(|student| (&student.key, student)).collect();

    let mut order: Vec<String> = Vec::new();
    let mut members: HashMap<String, Vec<ClassMember>> = HashMap::new();
    for enrolment in enrolments {
        let score = scores
            .get(&enrolment.key)
            .map_or(0.0, |student| student.score);
        for class_code in &enrolment.classes {
            let roster = members.entry(class_code.clone()).or_insert_with(|| {
                order.push(class_code.clone());
                Vec::new()
            });
            roster.push(ClassMember {
                name: enrolment.name.clone(),
                score,
            });
        }
    }

    let excluded_by_slot: HashSet<&str> = timetable
        .iter()
        .filter(|session| policy.excludes_slot(&session.time_slot))
        .map(|session| session.class_code.as_str())
        .collect();

    let mut classes = Vec::with_capacity(order.len());
    let mut excluded_classes = Vec::new();
    for class_code in order {
        let roster = members.remove(&class_code).unwrap_or_default();
        let oversized = policy
            .max_class_size
            .is_some_and(|limit| roster.len() > limit);
        if oversized || excluded_by_slot.contains(class_code.as_str()) {
            excluded_classes.push(class_code);
            continue;
        }
        classes.push(ClassAggregate::from_members(class_code, roster));
    }

    let grid = build_grid(&classes, &excluded_classes, timetable, policy);

    tracing::debug!(
        classes = classes.len(),
        excluded = excluded_classes.len(),
        slots = grid.len(),
        "class aggregation complete"
    );

    Aggregation {
        classes,
        grid,
        excluded_classes,
    }
}

fn build_grid(
    classes: &[ClassAggregate],
    excluded_classes: &[String],
    timetable: &[TimetableSession],
    policy: &AggregationPolicy,
) -> Vec<TimetableSlot> {
    let lookup: HashMap<&str, (usize, &ClassAggregate)> = classes
        .iter()
        .enumerate()
        .map(|(position, class)| (class.class_code.as_str(), (position, class)))
        .collect();
    let excluded: HashSet<&str> = excluded_classes.iter().map(String::as_str).collect();

    let mut slots: Vec<TimetableSlot> = Vec::new();
    let mut slot_index: HashMap<&str, usize> = HashMap::new();
    for session in timetable {
        if policy.excludes_slot(&session.time_slot)
            || excluded.contains(session.class_code.as_str())
        {
            continue;
        }

        let aggregate = lookup.get(session.class_code.as_str()).copied();
        let entry = TimetableGridEntry::new(session, aggregate.map(|(_, class)| class));
        let index = *slot_index
            .entry(session.time_slot.as_str())
            .or_insert_with(|| {
                slots.push(TimetableSlot {
                    time_slot: session.time_slot.clone(),
                    entries: Vec::new(),
                });
                slots.len() - 1
            });
        slots[index].entries.push(entry);
    }

    let position = |code: &str| lookup.get(code).map_or(usize::MAX, |(position, _)| *position);
    for slot in &mut slots {
        slot.entries.sort_by_key(|entry| position(&entry.class_code));
    }

    slots
}
