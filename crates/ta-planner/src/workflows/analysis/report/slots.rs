use std::cmp::Ordering;

use chrono::NaiveTime;

/// Start time embedded in a slot label such as `"09:00 - 10:00"` or `"P1 8.40am"`.
pub fn slot_start(label: &str) -> Option<NaiveTime> {
    label
        .split(|c: char| c.is_whitespace() || c == '-' || c == '(' || c == ')')
        .filter(|token| !token.is_empty())
        .find_map(parse_clock)
}

fn parse_clock(token: &str) -> Option<NaiveTime> {
    let lowered = token.to_ascii_lowercase();
    let (digits, meridiem) = if let Some(rest) = lowered.strip_suffix("am") {
        (rest, Some(false))
    } else if let Some(rest) = lowered.strip_suffix("pm") {
        (rest, Some(true))
    } else {
        (lowered.as_str(), None)
    };

    let (hours, minutes) = digits.split_once([':', '.'])?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    let mut hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;

    match meridiem {
        Some(true) if hours < 12 => hours += 12,
        Some(false) if hours == 12 => hours = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Parseable slots first in clock order, then the rest lexicographically.
pub fn compare_slots(left: &str, right: &str) -> Ordering {
    match (slot_start(left), slot_start(right)) {
        (Some(a), Some(b)) => a.cmp(&b).then_with(|| left.cmp(right)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.cmp(right),
    }
}
