//! Engine services.
//!
//! The services bind the pure calculation functions to a [`ShiftStore`],
//! scoping every operation to the caller's organization and enforcing the
//! manager-only operations.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shift_engine::config::ConfigLoader;
//! use shift_engine::engine::Engine;
//! use shift_engine::models::{Actor, Role, Worker};
//! use shift_engine::store::{MemoryStore, ShiftStore};
//! use chrono::Utc;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.save_worker(&Worker::new("w_001", "org_1", "Dana", Role::Employee))?;
//! let engine = Engine::new(store, &ConfigLoader::default());
//!
//! let actor = Actor::new("w_001", "org_1", Role::Employee);
//! engine.clock.toggle(&actor, Utc::now(), None)?;
//! assert!(engine.clock.current_shift(&actor)?.is_some());
//! # Ok::<(), shift_engine::error::EngineError>(())
//! ```

mod clock;
mod reports;
mod schedules;

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, Worker};
use crate::store::ShiftStore;

pub use clock::ClockService;
pub use reports::ReportService;
pub use schedules::{GenerationReport, ScheduleService};

/// All engine services over one shared store.
#[derive(Clone)]
pub struct Engine {
    /// Clock transitions and shift records.
    pub clock: ClockService,
    /// Schedules and templates.
    pub schedules: ScheduleService,
    /// Payroll and calendar exports.
    pub reports: ReportService,
}

impl Engine {
    /// Builds every service over `store` using `config`.
    pub fn new(store: Arc<dyn ShiftStore>, config: &ConfigLoader) -> Self {
        Self {
            clock: ClockService::new(Arc::clone(&store), config),
            schedules: ScheduleService::new(Arc::clone(&store), config),
            reports: ReportService::new(store, config),
        }
    }
}

/// Loads a worker of the actor's organization or fails with `NotFound`.
pub(crate) fn require_worker(
    store: &dyn ShiftStore,
    actor: &Actor,
    worker_id: &str,
) -> EngineResult<Worker> {
    store
        .get_worker(&actor.org_id, worker_id)?
        .ok_or_else(|| EngineError::not_found("worker", worker_id))
}

/// Converts an inclusive range of local dates into UTC instants covering
/// the first millisecond of `start` through the last millisecond of `end`.
pub(crate) fn day_bounds(
    offset: FixedOffset,
    start: NaiveDate,
    end: NaiveDate,
) -> EngineResult<(DateTime<Utc>, DateTime<Utc>)> {
    if start > end {
        return Err(EngineError::InvalidDateRange {
            start,
            end,
            message: "start is after end".to_string(),
        });
    }
    let midnight = |date: NaiveDate| {
        offset
            .from_local_datetime(&date.and_time(chrono::NaiveTime::MIN))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    };
    let out_of_range = || EngineError::InvalidDateRange {
        start,
        end,
        message: "dates are out of range".to_string(),
    };

    let from = midnight(start).ok_or_else(out_of_range)?;
    let next_day = end.succ_opt().ok_or_else(out_of_range)?;
    let to = midnight(next_day).ok_or_else(out_of_range)? - Duration::milliseconds(1);
    Ok((from, to))
}
