//! Recurring template expansion.
//!
//! Projects each worker's weekly template onto an inclusive range of
//! calendar days, producing one generated [`Schedule`] per matching day.
//! Days without an entry are skipped silently; malformed entries are
//! reported as diagnostics and skipped, never aborting the expansion for
//! other workers or days.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use serde_json::Value;
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::models::{Schedule, ScheduleOrigin, Worker, weekday_name};

/// Notes attached to generated schedules unless configured otherwise.
pub const DEFAULT_GENERATED_NOTE: &str = "Auto-generated";

/// Longest range, in days, that a single expansion accepts by default.
pub const DEFAULT_MAX_GENERATION_DAYS: u32 = 366;

/// A parsed template entry: local start and end time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    /// Local start time.
    pub start: NaiveTime,
    /// Local end time. When earlier than `start` the window ends on the
    /// following day.
    pub end: NaiveTime,
}

impl ShiftWindow {
    /// Returns true when the window ends on the day after it starts.
    pub fn crosses_midnight(&self) -> bool {
        self.end < self.start
    }
}

/// Settings for an expansion run.
#[derive(Debug, Clone)]
pub struct ExpansionOptions {
    /// Offset used to place local template times on the timeline.
    pub utc_offset: FixedOffset,
    /// Notes written on each generated schedule.
    pub notes: String,
    /// Longest accepted range in days.
    pub max_days: u32,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            notes: DEFAULT_GENERATED_NOTE.to_string(),
            max_days: DEFAULT_MAX_GENERATION_DAYS,
        }
    }
}

/// Output of [`expand_templates`].
#[derive(Debug, Default)]
pub struct ExpansionResult {
    /// Generated schedules, ordered by day and then by worker input order.
    pub schedules: Vec<Schedule>,
    /// One [`EngineError::MalformedTemplateEntry`] per skipped entry.
    pub skipped: Vec<EngineError>,
}

/// Parses a `"HH:MM"` time of day.
///
/// The hour may be written with one or two digits; the minute must have
/// two. Returns `None` for anything else, including out-of-range values.
///
/// # Example
///
/// ```
/// use shift_engine::calculation::parse_clock_time;
/// use chrono::NaiveTime;
///
/// assert_eq!(parse_clock_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
/// assert_eq!(parse_clock_time("7:05"), NaiveTime::from_hms_opt(7, 5, 0));
/// assert_eq!(parse_clock_time("24:00"), None);
/// assert_eq!(parse_clock_time("noon"), None);
/// ```
pub fn parse_clock_time(text: &str) -> Option<NaiveTime> {
    let (hour, minute) = text.trim().split_once(':')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(hour) || hour.len() > 2 || !all_digits(minute) || minute.len() != 2 {
        return None;
    }
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

fn field<'a>(entry: &'a Value, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| entry.get(name)?.as_str())
}

/// Interprets one raw template entry.
///
/// The entry must be an object with string `start` and `end` fields
/// (`startTime`/`endTime` are accepted too), both in `"HH:MM"` form, and
/// must not describe a zero-length window.
pub fn parse_template_entry(
    worker_id: &str,
    weekday: &str,
    entry: &Value,
) -> EngineResult<ShiftWindow> {
    let malformed = |message: &str| EngineError::MalformedTemplateEntry {
        worker_id: worker_id.to_string(),
        weekday: weekday.to_string(),
        message: message.to_string(),
    };

    if !entry.is_object() {
        return Err(malformed("entry is not an object"));
    }
    let start = field(entry, &["start", "startTime"]).ok_or_else(|| malformed("missing start"))?;
    let end = field(entry, &["end", "endTime"]).ok_or_else(|| malformed("missing end"))?;

    let start = parse_clock_time(start)
        .ok_or_else(|| malformed(&format!("start '{}' is not HH:MM", start)))?;
    let end =
        parse_clock_time(end).ok_or_else(|| malformed(&format!("end '{}' is not HH:MM", end)))?;

    if start == end {
        return Err(malformed("start and end are equal"));
    }

    Ok(ShiftWindow { start, end })
}

/// Checks that a range is ordered and no longer than `max_days`.
pub fn validate_range(start: NaiveDate, end: NaiveDate, max_days: u32) -> EngineResult<()> {
    if start > end {
        return Err(EngineError::InvalidDateRange {
            start,
            end,
            message: "start is after end".to_string(),
        });
    }
    let days = (end - start).num_days() + 1;
    if days > i64::from(max_days) {
        return Err(EngineError::InvalidDateRange {
            start,
            end,
            message: format!("range spans {} days, limit is {}", days, max_days),
        });
    }
    Ok(())
}

fn local_instant(offset: &FixedOffset, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn schedule_for(
    worker: &Worker,
    day: NaiveDate,
    window: ShiftWindow,
    options: &ExpansionOptions,
) -> Option<Schedule> {
    let end_day = if window.crosses_midnight() {
        day + Duration::days(1)
    } else {
        day
    };
    let start = local_instant(&options.utc_offset, day, window.start)?;
    let end = local_instant(&options.utc_offset, end_day, window.end)?;

    Some(Schedule::new(
        worker.id.clone(),
        start,
        end,
        Some(options.notes.clone()),
        ScheduleOrigin::Generated,
    ))
}

/// Expands worker templates over an inclusive date range.
///
/// # Arguments
///
/// * `start` - First calendar day of the range
/// * `end` - Last calendar day of the range (inclusive)
/// * `workers` - Candidate workers; inactive workers and workers without a
///   template are ignored
/// * `options` - Offset, notes and range limit
///
/// # Returns
///
/// An [`ExpansionResult`], or [`EngineError::InvalidDateRange`] if the
/// range is reversed or longer than `options.max_days`.
///
/// # Example
///
/// ```
/// use shift_engine::calculation::{expand_templates, ExpansionOptions};
/// use shift_engine::models::{RecurringTemplate, Role, Worker};
/// use chrono::NaiveDate;
///
/// let mut worker = Worker::new("w_001", "org_1", "Dana", Role::Employee);
/// worker.recurring_template = Some(
///     RecurringTemplate::parse(r#"{"Monday": {"start": "09:00", "end": "17:00"}}"#).unwrap(),
/// );
///
/// // 2026-01-19 is a Monday
/// let result = expand_templates(
///     NaiveDate::from_ymd_opt(2026, 1, 19).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 25).unwrap(),
///     &[worker],
///     &ExpansionOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(result.schedules.len(), 1);
/// ```
pub fn expand_templates(
    start: NaiveDate,
    end: NaiveDate,
    workers: &[Worker],
    options: &ExpansionOptions,
) -> EngineResult<ExpansionResult> {
    validate_range(start, end, options.max_days)?;

    let templated: Vec<_> = workers
        .iter()
        .filter(|w| w.is_active)
        .filter_map(|w| w.recurring_template.as_ref().map(|t| (w, t)))
        .filter(|(_, t)| !t.is_empty())
        .collect();

    let mut result = ExpansionResult::default();

    for day in start.iter_days().take_while(|d| *d <= end) {
        let weekday = day.weekday();
        for (worker, template) in &templated {
            let Some(entry) = template.entry(weekday) else {
                continue;
            };

            let window = match parse_template_entry(&worker.id, weekday_name(weekday), entry) {
                Ok(window) => window,
                Err(err) => {
                    warn!(worker_id = %worker.id, date = %day, error = %err, "Skipping template entry");
                    result.skipped.push(err);
                    continue;
                }
            };

            match schedule_for(worker, day, window, options) {
                Some(schedule) => result.schedules.push(schedule),
                None => {
                    let err = EngineError::MalformedTemplateEntry {
                        worker_id: worker.id.clone(),
                        weekday: weekday_name(weekday).to_string(),
                        message: format!("no instant for {} at offset {}", day, options.utc_offset),
                    };
                    warn!(worker_id = %worker.id, date = %day, error = %err, "Skipping template entry");
                    result.skipped.push(err);
                }
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecurringTemplate, Role};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn worker_with(id: &str, template: Option<&str>) -> Worker {
        let mut worker = Worker::new(id, "org_1", format!("Worker {}", id), Role::Employee);
        worker.recurring_template = template.map(|t| RecurringTemplate::parse(t).unwrap());
        worker
    }

    // 2026-01-19 is a Monday
    fn week() -> (NaiveDate, NaiveDate) {
        (date(2026, 1, 19), date(2026, 1, 25))
    }

    #[test]
    fn test_monday_only_template_generates_one_schedule() {
        let (start, end) = week();
        let worker = worker_with("w_1", Some(r#"{"Monday": {"start": "09:00", "end": "17:00"}}"#));

        let result = expand_templates(start, end, &[worker], &ExpansionOptions::default()).unwrap();

        assert_eq!(result.schedules.len(), 1);
        let schedule = &result.schedules[0];
        assert_eq!(schedule.worker_id, "w_1");
        assert_eq!(schedule.start_time, utc("2026-01-19T09:00:00Z"));
        assert_eq!(schedule.end_time, utc("2026-01-19T17:00:00Z"));
        assert_eq!(schedule.origin, ScheduleOrigin::Generated);
        assert_eq!(schedule.notes.as_deref(), Some("Auto-generated"));
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_worker_without_template_produces_nothing() {
        let (start, end) = week();
        let result =
            expand_templates(start, end, &[worker_with("w_1", None)], &ExpansionOptions::default())
                .unwrap();

        assert!(result.schedules.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_inactive_worker_is_skipped() {
        let (start, end) = week();
        let mut worker = worker_with("w_1", Some(r#"{"Monday": {"start": "09:00", "end": "17:00"}}"#));
        worker.is_active = false;

        let result = expand_templates(start, end, &[worker], &ExpansionOptions::default()).unwrap();
        assert!(result.schedules.is_empty());
    }

    #[test]
    fn test_malformed_entry_does_not_abort_other_workers() {
        let (start, end) = week();
        let broken = worker_with(
            "w_bad",
            Some(r#"{"Monday": {"start": "nine", "end": "17:00"}, "Tuesday": "09:00-17:00"}"#),
        );
        let good = worker_with("w_good", Some(r#"{"Monday": {"start": "08:00", "end": "12:00"}}"#));

        let result =
            expand_templates(start, end, &[broken, good], &ExpansionOptions::default()).unwrap();

        assert_eq!(result.schedules.len(), 1);
        assert_eq!(result.schedules[0].worker_id, "w_good");
        assert_eq!(result.skipped.len(), 2);
        assert!(result
            .skipped
            .iter()
            .all(|e| matches!(e, EngineError::MalformedTemplateEntry { .. })));
    }

    #[test]
    fn test_output_ordered_by_day_then_worker() {
        let (start, end) = week();
        let template = r#"{"Monday": {"start": "09:00", "end": "17:00"}, "Wednesday": {"start": "10:00", "end": "14:00"}}"#;
        let a = worker_with("w_a", Some(template));
        let b = worker_with("w_b", Some(template));

        let result = expand_templates(start, end, &[a, b], &ExpansionOptions::default()).unwrap();

        let order: Vec<_> = result
            .schedules
            .iter()
            .map(|s| (s.start_time.date_naive(), s.worker_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (date(2026, 1, 19), "w_a"),
                (date(2026, 1, 19), "w_b"),
                (date(2026, 1, 21), "w_a"),
                (date(2026, 1, 21), "w_b"),
            ]
        );
    }

    #[test]
    fn test_overnight_entry_ends_next_day() {
        let (start, end) = week();
        let worker = worker_with("w_1", Some(r#"{"Friday": {"start": "22:00", "end": "06:00"}}"#));

        let result = expand_templates(start, end, &[worker], &ExpansionOptions::default()).unwrap();

        assert_eq!(result.schedules.len(), 1);
        assert_eq!(result.schedules[0].start_time, utc("2026-01-23T22:00:00Z"));
        assert_eq!(result.schedules[0].end_time, utc("2026-01-24T06:00:00Z"));
    }

    #[test]
    fn test_zero_length_entry_is_malformed() {
        let (start, end) = week();
        let worker = worker_with("w_1", Some(r#"{"Monday": {"start": "09:00", "end": "09:00"}}"#));

        let result = expand_templates(start, end, &[worker], &ExpansionOptions::default()).unwrap();
        assert!(result.schedules.is_empty());
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn test_local_offset_is_applied() {
        let (start, end) = week();
        let worker = worker_with("w_1", Some(r#"{"Monday": {"startTime": "09:00", "endTime": "17:00"}}"#));
        let options = ExpansionOptions {
            utc_offset: FixedOffset::east_opt(10 * 3600).unwrap(),
            ..ExpansionOptions::default()
        };

        let result = expand_templates(start, end, &[worker], &options).unwrap();

        assert_eq!(result.schedules[0].start_time, utc("2026-01-18T23:00:00Z"));
        assert_eq!(result.schedules[0].end_time, utc("2026-01-19T07:00:00Z"));
    }

    #[test]
    fn test_single_day_range() {
        let worker = worker_with("w_1", Some(r#"{"Monday": {"start": "09:00", "end": "17:00"}}"#));
        let monday = date(2026, 1, 19);

        let result =
            expand_templates(monday, monday, &[worker], &ExpansionOptions::default()).unwrap();
        assert_eq!(result.schedules.len(), 1);
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let result = expand_templates(
            date(2026, 1, 25),
            date(2026, 1, 19),
            &[],
            &ExpansionOptions::default(),
        );
        assert!(matches!(result, Err(EngineError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_oversize_range_is_rejected() {
        let options = ExpansionOptions {
            max_days: 7,
            ..ExpansionOptions::default()
        };
        assert!(expand_templates(date(2026, 1, 19), date(2026, 1, 25), &[], &options).is_ok());
        assert!(matches!(
            expand_templates(date(2026, 1, 19), date(2026, 1, 26), &[], &options),
            Err(EngineError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_parse_clock_time_rejects_bad_forms() {
        assert_eq!(parse_clock_time("9:5"), None);
        assert_eq!(parse_clock_time("09:60"), None);
        assert_eq!(parse_clock_time("-1:00"), None);
        assert_eq!(parse_clock_time("09:00:00"), None);
        assert_eq!(parse_clock_time(""), None);
        assert_eq!(parse_clock_time(" 23:59 "), NaiveTime::from_hms_opt(23, 59, 0));
    }
}
