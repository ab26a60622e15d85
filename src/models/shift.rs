//! Shift model and related types.
//!
//! This module defines the Shift struct and ShiftStatus enum for
//! representing worked time. The end time, status and total hours of a
//! shift only change together, through methods that recompute
//! `total_hours` from the timestamps.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::{calculate_duration, format_duration};
use crate::error::{EngineError, EngineResult};

/// Lifecycle status of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// The worker is on the clock.
    Active,
    /// The shift has an end time and computed hours.
    Completed,
}

impl ShiftStatus {
    /// Returns the storage form of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftStatus::Active => "active",
            ShiftStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for ShiftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ShiftStatus::Active),
            "completed" => Ok(ShiftStatus::Completed),
            other => Err(format!("unknown shift status: {}", other)),
        }
    }
}

/// Represents a concrete, timestamped record of worked time.
///
/// # Examples
///
/// ```
/// use shift_engine::models::{Shift, ShiftStatus};
/// use chrono::{TimeZone, Utc};
/// use rust_decimal::Decimal;
///
/// let start = Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap();
/// let mut shift = Shift::open("w_001", start);
/// assert_eq!(shift.status(), ShiftStatus::Active);
/// assert_eq!(shift.total_hours(), None);
///
/// shift.complete(Utc.with_ymd_and_hms(2026, 1, 20, 17, 30, 0).unwrap());
/// assert_eq!(shift.total_hours(), Some(Decimal::new(850, 2)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shift {
    /// Unique identifier for the shift.
    pub id: String,
    /// The worker who worked the shift.
    pub worker_id: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    status: ShiftStatus,
    total_hours: Option<Decimal>,
}

impl Shift {
    /// Opens a new active shift starting at `start`.
    pub fn open(worker_id: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            worker_id: worker_id.into(),
            start_time: start,
            end_time: None,
            status: ShiftStatus::Active,
            total_hours: None,
        }
    }

    /// Creates an already completed shift, as entered by a manager.
    ///
    /// Returns [`EngineError::InvalidShift`] if `end` is before `start`.
    pub fn completed(
        worker_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Self> {
        let mut shift = Self::open(worker_id, start);
        ensure_ordered(&shift.id, start, end)?;
        shift.complete(end);
        Ok(shift)
    }

    /// Rebuilds a shift from a persisted row.
    ///
    /// Stores use this to materialize what they wrote; the stored
    /// `total_hours` is trusted as-is.
    pub fn restore(
        id: String,
        worker_id: String,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        status: ShiftStatus,
        total_hours: Option<Decimal>,
    ) -> Self {
        Self {
            id,
            worker_id,
            start_time,
            end_time,
            status,
            total_hours,
        }
    }

    /// Closes the shift at `end`, setting the end time, status and total
    /// hours together.
    ///
    /// An `end` before the start yields negative hours; the live clock
    /// never rejects a clock-out.
    pub fn complete(&mut self, end: DateTime<Utc>) {
        self.end_time = Some(end);
        self.status = ShiftStatus::Completed;
        self.total_hours = Some(calculate_duration(self.start_time, end));
    }

    /// Replaces the shift's timestamps, recomputing the total hours.
    ///
    /// When `end` is `None` the existing end time (if any) is kept. Giving an
    /// end to an active shift completes it.
    pub fn retime(&mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> EngineResult<()> {
        match end.or(self.end_time) {
            Some(end) => {
                ensure_ordered(&self.id, start, end)?;
                self.start_time = start;
                self.complete(end);
            }
            None => self.start_time = start,
        }
        Ok(())
    }

    /// The instant the shift started.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// The instant the shift ended, if it has.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// The shift's lifecycle status.
    pub fn status(&self) -> ShiftStatus {
        self.status
    }

    /// Hours worked, present only once the shift is completed.
    pub fn total_hours(&self) -> Option<Decimal> {
        self.total_hours
    }

    /// Returns true while the worker is on the clock.
    pub fn is_active(&self) -> bool {
        self.status == ShiftStatus::Active
    }

    /// Human-readable duration such as `"8h 30m"`, once completed.
    pub fn duration_label(&self) -> Option<String> {
        self.total_hours.map(format_duration)
    }
}

fn ensure_ordered(shift_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> EngineResult<()> {
    if end < start {
        return Err(EngineError::InvalidShift {
            shift_id: shift_id.to_string(),
            message: format!("end time {} is before start time {}", end, start),
        });
    }
    Ok(())
}
