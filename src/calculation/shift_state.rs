//! Clock-in/clock-out state machine.
//!
//! A worker is either [`ShiftState::Idle`] or [`ShiftState::Active`] with
//! exactly one open shift. The functions here are pure: they take the
//! current state and a request and return the records to persist. Making
//! the read-decide-write sequence atomic is the job of the store, see
//! [`ShiftStore::apply_transition`](crate::store::ShiftStore::apply_transition).

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{GeoLocation, Shift, TimeEntry, TimeEntryType};

/// The clock state of a single worker.
#[derive(Debug, Clone, PartialEq)]
pub enum ShiftState {
    /// No open shift.
    Idle,
    /// One open shift.
    Active(Shift),
}

impl ShiftState {
    /// Builds the state from the worker's open shift, if any.
    pub fn from_active(shift: Option<Shift>) -> Self {
        match shift {
            Some(shift) => ShiftState::Active(shift),
            None => ShiftState::Idle,
        }
    }

    /// Returns the state name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ShiftState::Idle => "idle",
            ShiftState::Active(_) => "active",
        }
    }
}

/// Input to a clock transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockRequest {
    /// The worker clocking.
    pub worker_id: String,
    /// When the transition happens.
    pub at: DateTime<Utc>,
    /// The device location, if reported.
    pub location: Option<GeoLocation>,
}

impl ClockRequest {
    /// Creates a request, truncating `at` to millisecond precision so the
    /// persisted timestamps and the computed hours agree.
    pub fn new(
        worker_id: impl Into<String>,
        at: DateTime<Utc>,
        location: Option<GeoLocation>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            at: at.trunc_subsecs(3),
            location,
        }
    }
}

/// Which transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockEvent {
    /// A shift was opened.
    ClockedIn,
    /// A shift was completed.
    ClockedOut,
}

/// The records produced by a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockTransition {
    /// Which transition happened.
    pub event: ClockEvent,
    /// The new or updated shift.
    pub shift: Shift,
    /// The audit entry for the transition.
    pub entry: TimeEntry,
}

fn invalid(state: &ShiftState, request: &ClockRequest, attempted: &str) -> EngineError {
    EngineError::InvalidStateTransition {
        worker_id: request.worker_id.clone(),
        state: state.name().to_string(),
        attempted: attempted.to_string(),
    }
}

/// Opens a shift for an idle worker.
///
/// # Returns
///
/// A [`ClockTransition`] with a new active shift starting at `request.at`
/// and a `clock_in` entry, or [`EngineError::InvalidStateTransition`] if
/// the worker already has an open shift.
///
/// # Example
///
/// ```
/// use shift_engine::calculation::{clock_in, ClockEvent, ClockRequest, ShiftState};
/// use chrono::{TimeZone, Utc};
///
/// let request = ClockRequest::new("w_001", Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap(), None);
/// let transition = clock_in(&ShiftState::Idle, &request).unwrap();
/// assert_eq!(transition.event, ClockEvent::ClockedIn);
/// assert!(transition.shift.is_active());
///
/// let again = clock_in(&ShiftState::Active(transition.shift), &request);
/// assert!(again.is_err());
/// ```
pub fn clock_in(state: &ShiftState, request: &ClockRequest) -> EngineResult<ClockTransition> {
    if let ShiftState::Active(_) = state {
        return Err(invalid(state, request, "clock in"));
    }

    let shift = Shift::open(request.worker_id.clone(), request.at);
    let entry = TimeEntry::new(
        shift.id.clone(),
        TimeEntryType::ClockIn,
        request.at,
        request.location,
    );

    Ok(ClockTransition {
        event: ClockEvent::ClockedIn,
        shift,
        entry,
    })
}

/// Completes the open shift of an active worker.
///
/// The shift's end time, status and total hours are set together from
/// `request.at`. Returns [`EngineError::InvalidStateTransition`] if the
/// worker is idle.
pub fn clock_out(state: &ShiftState, request: &ClockRequest) -> EngineResult<ClockTransition> {
    let ShiftState::Active(open) = state else {
        return Err(invalid(state, request, "clock out"));
    };

    let mut shift = open.clone();
    shift.complete(request.at);
    let entry = TimeEntry::new(
        shift.id.clone(),
        TimeEntryType::ClockOut,
        request.at,
        request.location,
    );

    Ok(ClockTransition {
        event: ClockEvent::ClockedOut,
        shift,
        entry,
    })
}

/// Clocks out when a shift is open, clocks in otherwise.
pub fn toggle(state: &ShiftState, request: &ClockRequest) -> EngineResult<ClockTransition> {
    match state {
        ShiftState::Active(_) => clock_out(state, request),
        ShiftState::Idle => clock_in(state, request),
    }
}
