//! Persistence port for the Shift & Schedule Engine.
//!
//! The engine never talks to a database directly. It goes through the
//! [`ShiftStore`] trait, which has two adapters:
//!
//! - [`MemoryStore`]: everything behind one mutex, for tests and embedding
//! - [`SqliteStore`]: a SQLite database with a partial unique index that
//!   backs the one-active-shift-per-worker rule
//!
//! # Example
//!
//! ```
//! use shift_engine::calculation::{toggle, ClockEvent, ClockRequest};
//! use shift_engine::models::{Role, Worker};
//! use shift_engine::store::{MemoryStore, ShiftStore};
//! use chrono::Utc;
//!
//! let store = MemoryStore::new();
//! store.save_worker(&Worker::new("w_001", "org_1", "Dana", Role::Employee))?;
//!
//! let request = ClockRequest::new("w_001", Utc::now(), None);
//! let transition = store.apply_transition("w_001", &mut |state| toggle(state, &request))?;
//! assert_eq!(transition.event, ClockEvent::ClockedIn);
//! assert!(store.active_shift("w_001")?.is_some());
//! # Ok::<(), shift_engine::error::EngineError>(())
//! ```

mod memory;
mod sqlite;

use chrono::{DateTime, Utc};

use crate::calculation::{ClockTransition, ShiftState};
use crate::error::{EngineError, EngineResult};
use crate::models::{Schedule, Shift, ShiftStatus, TimeEntry, Worker};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Decides a clock transition from the worker's current state.
pub type TransitionFn<'a> = dyn FnMut(&ShiftState) -> EngineResult<ClockTransition> + 'a;

/// Error for an edit whose source copy no longer matches the stored shift.
pub(crate) fn stale_edit(stored: &Shift) -> EngineError {
    EngineError::InvalidStateTransition {
        worker_id: stored.worker_id.clone(),
        state: stored.status().as_str().to_string(),
        attempted: "edit a shift that changed since it was read".to_string(),
    }
}

/// Filter for [`ShiftStore::list_shifts`]. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftQuery {
    /// Organization to scope to.
    pub org_id: String,
    /// Only this worker's shifts.
    pub worker_id: Option<String>,
    /// Only shifts with this status.
    pub status: Option<ShiftStatus>,
    /// Shifts starting at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Shifts starting at or before this instant.
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of shifts returned.
    pub limit: Option<usize>,
}

impl ShiftQuery {
    /// A query for every shift in an organization.
    pub fn for_org(org_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            ..Self::default()
        }
    }

    pub(crate) fn matches(&self, shift: &Shift) -> bool {
        self.worker_id.as_ref().is_none_or(|w| *w == shift.worker_id)
            && self.status.is_none_or(|s| s == shift.status())
            && self.from.is_none_or(|f| shift.start_time() >= f)
            && self.to.is_none_or(|t| shift.start_time() <= t)
    }
}

/// Filter for [`ShiftStore::list_schedules`]. Results are oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleQuery {
    /// Organization to scope to.
    pub org_id: String,
    /// Only this worker's schedules.
    pub worker_id: Option<String>,
    /// Schedules starting at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Schedules starting at or before this instant.
    pub to: Option<DateTime<Utc>>,
}

impl ScheduleQuery {
    /// A query for every schedule in an organization.
    pub fn for_org(org_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            ..Self::default()
        }
    }

    pub(crate) fn matches(&self, schedule: &Schedule) -> bool {
        self.worker_id.as_ref().is_none_or(|w| *w == schedule.worker_id)
            && self.from.is_none_or(|f| schedule.start_time >= f)
            && self.to.is_none_or(|t| schedule.start_time <= t)
    }
}

/// Transactional storage for workers, shifts, time entries and schedules.
///
/// Reads that take an `org_id` only see records of workers in that
/// organization. Multi-record writes are all-or-nothing.
pub trait ShiftStore: Send + Sync {
    /// Inserts or replaces a worker.
    fn save_worker(&self, worker: &Worker) -> EngineResult<()>;

    /// Looks up a worker within an organization.
    fn get_worker(&self, org_id: &str, worker_id: &str) -> EngineResult<Option<Worker>>;

    /// Lists an organization's workers ordered by id.
    fn list_workers(&self, org_id: &str) -> EngineResult<Vec<Worker>>;

    /// Returns the worker's open shift, if any.
    fn active_shift(&self, worker_id: &str) -> EngineResult<Option<Shift>>;

    /// Reads the worker's state, lets `decide` pick a transition and
    /// persists the resulting shift and time entry, all as one atomic unit.
    ///
    /// Concurrent calls for the same worker are serialized, so two
    /// simultaneous toggles can never both observe an idle worker. If
    /// `decide` fails nothing is written and its error is returned.
    fn apply_transition(
        &self,
        worker_id: &str,
        decide: &mut TransitionFn<'_>,
    ) -> EngineResult<ClockTransition>;

    /// Inserts a shift created outside the live clock.
    fn insert_shift(&self, shift: &Shift) -> EngineResult<()>;

    /// Replaces `previous` with `shift` if the stored shift still equals
    /// `previous`, checking and writing as one atomic unit.
    ///
    /// Fails with `NotFound` if the shift does not exist, and with
    /// `InvalidStateTransition` if it changed since `previous` was read.
    fn update_shift(&self, previous: &Shift, shift: &Shift) -> EngineResult<()>;

    /// Looks up a shift within an organization.
    fn get_shift(&self, org_id: &str, shift_id: &str) -> EngineResult<Option<Shift>>;

    /// Lists shifts matching a query, newest first.
    fn list_shifts(&self, query: &ShiftQuery) -> EngineResult<Vec<Shift>>;

    /// Lists a shift's time entries in timestamp order.
    fn time_entries(&self, shift_id: &str) -> EngineResult<Vec<TimeEntry>>;

    /// Inserts schedules as a single batch: all persist or none do.
    fn insert_schedules(&self, schedules: &[Schedule]) -> EngineResult<()>;

    /// Deletes a schedule. Fails with `NotFound` if it is not in the organization.
    fn delete_schedule(&self, org_id: &str, schedule_id: &str) -> EngineResult<()>;

    /// Lists schedules matching a query, oldest first.
    fn list_schedules(&self, query: &ScheduleQuery) -> EngineResult<Vec<Schedule>>;
}
