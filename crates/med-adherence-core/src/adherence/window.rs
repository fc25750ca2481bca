//! Trailing-window computation.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::clock::ReferenceZone;
use crate::models::{DayState, DayStatus, DoseLogEntry};

/// Compute `days` day-statuses ending at `today`, oldest first.
///
/// Entries may arrive in any order and may include days outside the window;
/// those are ignored. Within a day the entry with the greatest `logged_at`
/// wins, and equal instants fall back to the greater id.
///
/// Returns an empty window when `days` is zero or reaches back past the
/// earliest representable date.
pub fn adherence_window(
    entries: &[DoseLogEntry],
    today: NaiveDate,
    days: u32,
    zone: &ReferenceZone,
) -> Vec<DayStatus> {
    let Some(first_day) = first_day_of(today, days) else {
        return Vec::new();
    };

    let winners = latest_per_day(
        entries
            .iter()
            .map(|entry| (zone.calendar_day(entry.logged_at), entry))
            .filter(|(day, _)| *day >= first_day && *day <= today),
    );

    (0..days)
        .map(|index| {
            let date = first_day + Duration::days(i64::from(index));
            let status = winners
                .get(&date)
                .map(|entry| DayState::from(entry.status))
                .unwrap_or(DayState::Pending);
            DayStatus {
                day_index: index,
                date,
                status,
            }
        })
        .collect()
}

/// Reduce day-tagged entries to the authoritative entry for each day.
pub fn latest_per_day<'a>(
    entries: impl IntoIterator<Item = (NaiveDate, &'a DoseLogEntry)>,
) -> HashMap<NaiveDate, &'a DoseLogEntry> {
    let mut winners: HashMap<NaiveDate, &DoseLogEntry> = HashMap::new();
    for (day, entry) in entries {
        winners
            .entry(day)
            .and_modify(|current| {
                if entry.recency_key() > current.recency_key() {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }
    winners
}

/// UTC interval that contains every instant the window can use.
///
/// Lets the store hand over only the relevant slice of a long history.
/// A window reaching past the earliest date starts at `NaiveDate::MIN`.
pub fn window_bounds(
    today: NaiveDate,
    days: u32,
    zone: &ReferenceZone,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let first_day = first_day_of(today, days.max(1)).unwrap_or(NaiveDate::MIN);
    let (start, _) = zone.day_bounds(first_day);
    let (_, end) = zone.day_bounds(today);
    (start, end)
}

fn first_day_of(today: NaiveDate, days: u32) -> Option<NaiveDate> {
    let span = i64::from(days.checked_sub(1)?);
    today.checked_sub_signed(Duration::days(span))
}
