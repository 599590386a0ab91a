use std::cmp::Ordering;

use super::slots::compare_slots;
use crate::workflows::analysis::aggregation::{ClassAggregate, TimetableGridEntry, TimetableSlot};
use crate::workflows::analysis::scoring::StudentNeed;

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

fn weekday_rank(day: &str) -> usize {
    let lowered = day.trim().to_lowercase();
    WEEKDAYS
        .iter()
        .position(|weekday| lowered.starts_with(&weekday[..3]))
        .unwrap_or(WEEKDAYS.len())
}

/// Every student, score descending, ties by name ascending.
pub fn rank_students(mut students: Vec<StudentNeed>) -> Vec<StudentNeed> {
    students.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.key.cmp(&b.key))
    });
    students
}

/// Classes with enrolled students, weighted score descending, ties by class code.
pub fn rank_classes(classes: &[ClassAggregate]) -> Vec<ClassAggregate> {
    let mut ranked: Vec<ClassAggregate> = classes
        .iter()
        .filter(|class| class.student_count > 0)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        b.weighted_score
            .total_cmp(&a.weighted_score)
            .then_with(|| a.class_code.cmp(&b.class_code))
    });
    ranked
}

fn compare_entries(a: &TimetableGridEntry, b: &TimetableGridEntry) -> Ordering {
    b.weighted_score
        .total_cmp(&a.weighted_score)
        .then_with(|| a.class_code.cmp(&b.class_code))
        .then_with(|| weekday_rank(&a.day).cmp(&weekday_rank(&b.day)))
        .then_with(|| a.day.cmp(&b.day))
}

/// Canonical grid order: slots by embedded clock time, entries by priority.
pub fn order_grid(mut grid: Vec<TimetableSlot>) -> Vec<TimetableSlot> {
    grid.sort_by(|a, b| compare_slots(&a.time_slot, &b.time_slot));
    for slot in &mut grid {
        slot.entries.sort_by(compare_entries);
    }
    grid
}
