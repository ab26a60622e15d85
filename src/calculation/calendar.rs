//! Calendar projection.
//!
//! Maps schedules to timed calendar events keyed by schedule id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Schedule, Worker};

/// A timed calendar event derived from a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Globally unique id, `"{schedule_id}@{domain}"`.
    pub uid: String,
    /// Event start, UTC basic ISO (`20260119T090000Z`).
    pub start: String,
    /// Event end, UTC basic ISO.
    pub end: String,
    /// `"Shift - {worker name}"`.
    pub summary: String,
    /// The schedule's notes, empty when there are none.
    pub description: String,
}

/// Formats an instant as UTC basic ISO 8601 without separators.
///
/// ```
/// use shift_engine::calculation::format_ics_timestamp;
/// use chrono::{TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2026, 1, 19, 9, 0, 0).unwrap();
/// assert_eq!(format_ics_timestamp(t), "20260119T090000Z");
/// ```
pub fn format_ics_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Projects schedules into calendar events, in input order.
///
/// A schedule whose worker is missing from `workers` is summarized with
/// the worker id instead of a name.
pub fn project_calendar(
    schedules: &[Schedule],
    workers: &[Worker],
    uid_domain: &str,
) -> Vec<CalendarEvent> {
    let names: HashMap<&str, &str> = workers
        .iter()
        .map(|w| (w.id.as_str(), w.name.as_str()))
        .collect();

    schedules
        .iter()
        .map(|schedule| {
            let name = names
                .get(schedule.worker_id.as_str())
                .copied()
                .unwrap_or(schedule.worker_id.as_str());
            CalendarEvent {
                uid: format!("{}@{}", schedule.id, uid_domain),
                start: format_ics_timestamp(schedule.start_time),
                end: format_ics_timestamp(schedule.end_time),
                summary: format!("Shift - {}", name),
                description: schedule.notes.clone().unwrap_or_default(),
            }
        })
        .collect()
}
