//! Schedule model.
//!
//! A schedule is a planned work period. It is independent of
//! [`Shift`](super::Shift): a schedule is a plan, a shift is what happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a schedule came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleOrigin {
    /// Entered by a manager.
    Manual,
    /// Produced by the recurring template expander.
    Generated,
}

impl ScheduleOrigin {
    /// Returns the storage form of the origin.
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleOrigin::Manual => "manual",
            ScheduleOrigin::Generated => "generated",
        }
    }
}

impl std::str::FromStr for ScheduleOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ScheduleOrigin::Manual),
            "generated" => Ok(ScheduleOrigin::Generated),
            other => Err(format!("unknown schedule origin: {}", other)),
        }
    }
}

/// A planned work period for a worker.
///
/// # Example
///
/// ```
/// use shift_engine::models::{Schedule, ScheduleOrigin};
/// use chrono::{TimeZone, Utc};
///
/// let schedule = Schedule::new(
///     "w_001",
///     Utc.with_ymd_and_hms(2026, 1, 19, 9, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2026, 1, 19, 17, 0, 0).unwrap(),
///     Some("Front desk".to_string()),
///     ScheduleOrigin::Manual,
/// );
/// assert_eq!(schedule.origin, ScheduleOrigin::Manual);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Unique identifier for the schedule.
    pub id: String,
    /// The worker the schedule is for.
    pub worker_id: String,
    /// Planned start.
    pub start_time: DateTime<Utc>,
    /// Planned end.
    pub end_time: DateTime<Utc>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Whether the schedule was entered by hand or generated.
    pub origin: ScheduleOrigin,
}

impl Schedule {
    /// Creates a schedule with a fresh id.
    pub fn new(
        worker_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        notes: Option<String>,
        origin: ScheduleOrigin,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            worker_id: worker_id.into(),
            start_time,
            end_time,
            notes,
            origin,
        }
    }
}
