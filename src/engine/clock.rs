//! Clock service: live transitions, history and manager overrides.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, SubsecRound, Utc};
use tracing::info;

use crate::calculation::{self, ClockRequest, ClockTransition, ShiftState};
use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, GeoLocation, Shift, TimeEntry};
use crate::store::{ShiftQuery, ShiftStore};

use super::{day_bounds, require_worker};

type Decide = fn(&ShiftState, &ClockRequest) -> EngineResult<ClockTransition>;

/// Clock-in/clock-out and shift record operations.
#[derive(Clone)]
pub struct ClockService {
    store: Arc<dyn ShiftStore>,
    offset: FixedOffset,
    history_limit: usize,
    recent_limit: usize,
}

impl ClockService {
    /// Creates the service.
    pub fn new(store: Arc<dyn ShiftStore>, config: &ConfigLoader) -> Self {
        Self {
            store,
            offset: config.utc_offset(),
            history_limit: config.config().history.history_limit,
            recent_limit: config.config().history.recent_limit,
        }
    }

    fn transition(
        &self,
        actor: &Actor,
        at: DateTime<Utc>,
        location: Option<GeoLocation>,
        decide: Decide,
    ) -> EngineResult<ClockTransition> {
        require_worker(self.store.as_ref(), actor, &actor.worker_id)?;
        let request = ClockRequest::new(actor.worker_id.clone(), at, location);

        let transition = self
            .store
            .apply_transition(&actor.worker_id, &mut |state| decide(state, &request))?;

        info!(
            worker_id = %actor.worker_id,
            shift_id = %transition.shift.id,
            event = ?transition.event,
            total_hours = ?transition.shift.total_hours(),
            "Clock transition recorded"
        );
        Ok(transition)
    }

    /// Clocks the actor out if they have an open shift, in otherwise.
    pub fn toggle(
        &self,
        actor: &Actor,
        at: DateTime<Utc>,
        location: Option<GeoLocation>,
    ) -> EngineResult<ClockTransition> {
        self.transition(actor, at, location, calculation::toggle)
    }

    /// Opens a shift for the actor; fails if one is already open.
    pub fn clock_in(
        &self,
        actor: &Actor,
        at: DateTime<Utc>,
        location: Option<GeoLocation>,
    ) -> EngineResult<ClockTransition> {
        self.transition(actor, at, location, calculation::clock_in)
    }

    /// Completes the actor's open shift; fails if none is open.
    pub fn clock_out(
        &self,
        actor: &Actor,
        at: DateTime<Utc>,
        location: Option<GeoLocation>,
    ) -> EngineResult<ClockTransition> {
        self.transition(actor, at, location, calculation::clock_out)
    }

    /// The actor's open shift, if any.
    pub fn current_shift(&self, actor: &Actor) -> EngineResult<Option<Shift>> {
        self.store.active_shift(&actor.worker_id)
    }

    /// The actor's most recent shifts, newest first.
    pub fn history(&self, actor: &Actor) -> EngineResult<Vec<Shift>> {
        self.store.list_shifts(&ShiftQuery {
            worker_id: Some(actor.worker_id.clone()),
            limit: Some(self.history_limit),
            ..ShiftQuery::for_org(actor.org_id.clone())
        })
    }

    /// Every shift in the actor's organization (manager only).
    ///
    /// With a range, all shifts starting within those local days are
    /// returned; without one, only the most recent.
    pub fn organization_shifts(
        &self,
        actor: &Actor,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> EngineResult<Vec<Shift>> {
        actor.require_manager("list organization shifts")?;

        let mut query = ShiftQuery::for_org(actor.org_id.clone());
        match range {
            Some((start, end)) => {
                let (from, to) = day_bounds(self.offset, start, end)?;
                query.from = Some(from);
                query.to = Some(to);
            }
            None => query.limit = Some(self.recent_limit),
        }
        self.store.list_shifts(&query)
    }

    /// The audit trail of a shift. Employees may only read their own.
    pub fn time_entries(&self, actor: &Actor, shift_id: &str) -> EngineResult<Vec<TimeEntry>> {
        let shift = self
            .store
            .get_shift(&actor.org_id, shift_id)?
            .filter(|s| actor.role.is_manager() || s.worker_id == actor.worker_id)
            .ok_or_else(|| EngineError::not_found("shift", shift_id))?;
        self.store.time_entries(&shift.id)
    }

    /// Records a completed shift entered by a manager.
    pub fn create_manual_shift(
        &self,
        actor: &Actor,
        worker_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Shift> {
        actor.require_manager("create a manual shift")?;
        require_worker(self.store.as_ref(), actor, worker_id)?;

        let shift = Shift::completed(worker_id, start.trunc_subsecs(3), end.trunc_subsecs(3))?;
        self.store.insert_shift(&shift)?;

        info!(manager_id = %actor.worker_id, worker_id, shift_id = %shift.id, "Manual shift created");
        Ok(shift)
    }

    /// Replaces a shift's timestamps (manager only), recomputing its hours.
    ///
    /// Without `end` the shift keeps its current end time. Giving an end to
    /// an open shift completes it.
    pub fn edit_shift(
        &self,
        actor: &Actor,
        shift_id: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> EngineResult<Shift> {
        actor.require_manager("edit a shift")?;

        let current = self
            .store
            .get_shift(&actor.org_id, shift_id)?
            .ok_or_else(|| EngineError::not_found("shift", shift_id))?;
        let mut shift = current.clone();
        shift.retime(start.trunc_subsecs(3), end.map(|e| e.trunc_subsecs(3)))?;
        // A clock-out landing after the read makes `current` stale and the write fails.
        self.store.update_shift(&current, &shift)?;

        info!(manager_id = %actor.worker_id, shift_id, total_hours = ?shift.total_hours(), "Shift edited");
        Ok(shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::ClockEvent;
    use crate::models::{Role, ShiftStatus, Worker};
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, minute, 0).unwrap()
    }

    fn setup() -> (ClockService, Actor, Actor) {
        let store = Arc::new(MemoryStore::new());
        store
            .save_worker(&Worker::new("w_1", "org_1", "Dana", Role::Employee))
            .unwrap();
        store
            .save_worker(&Worker::new("m_1", "org_1", "Morgan", Role::Manager))
            .unwrap();
        store
            .save_worker(&Worker::new("w_x", "org_2", "Other", Role::Employee))
            .unwrap();
        let service = ClockService::new(store, &ConfigLoader::default());
        (
            service,
            Actor::new("w_1", "org_1", Role::Employee),
            Actor::new("m_1", "org_1", Role::Manager),
        )
    }

    #[test]
    fn test_toggle_in_then_out() {
        let (service, employee, _) = setup();

        let first = service.toggle(&employee, at(20, 9, 0), None).unwrap();
        assert_eq!(first.event, ClockEvent::ClockedIn);
        assert!(service.current_shift(&employee).unwrap().is_some());

        let second = service.toggle(&employee, at(20, 17, 0), None).unwrap();
        assert_eq!(second.event, ClockEvent::ClockedOut);
        assert_eq!(second.shift.total_hours(), Some(Decimal::new(800, 2)));
        assert!(service.current_shift(&employee).unwrap().is_none());
    }

    #[test]
    fn test_clock_out_while_idle_is_invalid() {
        let (service, employee, _) = setup();
        let result = service.clock_out(&employee, at(20, 17, 0), None);
        assert!(matches!(result, Err(EngineError::InvalidStateTransition { .. })));
        assert!(service.history(&employee).unwrap().is_empty());
    }

    #[test]
    fn test_double_clock_in_is_invalid() {
        let (service, employee, _) = setup();
        service.clock_in(&employee, at(20, 9, 0), None).unwrap();
        let result = service.clock_in(&employee, at(20, 9, 1), None);
        assert!(matches!(result, Err(EngineError::InvalidStateTransition { .. })));
    }

    #[test]
    fn test_unknown_worker_cannot_clock() {
        let (service, _, _) = setup();
        let stranger = Actor::new("w_x", "org_1", Role::Employee);
        let result = service.toggle(&stranger, at(20, 9, 0), None);
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_manual_shift_requires_manager() {
        let (service, employee, manager) = setup();

        let denied = service.create_manual_shift(&employee, "w_1", at(19, 9, 0), at(19, 17, 0));
        assert!(matches!(denied, Err(EngineError::AccessDenied { .. })));

        let shift = service
            .create_manual_shift(&manager, "w_1", at(19, 9, 0), at(19, 13, 30))
            .unwrap();
        assert_eq!(shift.status(), ShiftStatus::Completed);
        assert_eq!(shift.total_hours(), Some(Decimal::new(450, 2)));
    }

    #[test]
    fn test_manual_shift_for_other_org_worker_is_not_found() {
        let (service, _, manager) = setup();
        let result = service.create_manual_shift(&manager, "w_x", at(19, 9, 0), at(19, 17, 0));
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_edit_recomputes_hours() {
        let (service, employee, manager) = setup();
        service.toggle(&employee, at(20, 9, 0), None).unwrap();
        let closed = service.toggle(&employee, at(20, 17, 0), None).unwrap();

        let edited = service
            .edit_shift(&manager, &closed.shift.id, at(20, 8, 45), None)
            .unwrap();
        assert_eq!(edited.total_hours(), Some(Decimal::new(825, 2)));
        assert_eq!(service.history(&employee).unwrap()[0], edited);
    }

    #[test]
    fn test_edit_rejects_reversed_times() {
        let (service, _, manager) = setup();
        let shift = service
            .create_manual_shift(&manager, "w_1", at(19, 9, 0), at(19, 17, 0))
            .unwrap();

        let result = service.edit_shift(&manager, &shift.id, at(19, 18, 0), None);
        assert!(matches!(result, Err(EngineError::InvalidShift { .. })));
    }

    #[test]
    fn test_edit_unknown_shift_is_not_found() {
        let (service, _, manager) = setup();
        let result = service.edit_shift(&manager, "missing", at(19, 9, 0), None);
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_organization_shifts_by_range() {
        let (service, _, manager) = setup();
        service
            .create_manual_shift(&manager, "w_1", at(19, 9, 0), at(19, 17, 0))
            .unwrap();
        service
            .create_manual_shift(&manager, "w_1", at(21, 9, 0), at(21, 17, 0))
            .unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
        let shifts = service
            .organization_shifts(&manager, Some((day, day)))
            .unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(service.organization_shifts(&manager, None).unwrap().len(), 2);
    }

    #[test]
    fn test_time_entries_hidden_from_other_employees() {
        let (service, employee, manager) = setup();
        let opened = service.toggle(&employee, at(20, 9, 0), None).unwrap();

        let store_view = service.time_entries(&manager, &opened.shift.id).unwrap();
        assert_eq!(store_view.len(), 1);
        assert_eq!(service.time_entries(&employee, &opened.shift.id).unwrap().len(), 1);

        let coworker = Actor::new("m_1", "org_1", Role::Employee);
        assert!(matches!(
            service.time_entries(&coworker, &opened.shift.id),
            Err(EngineError::NotFound { .. })
        ));
    }

    /// Delegates to a memory store, clocking the worker out right after the
    /// first shift lookup.
    struct ClockOutAfterRead {
        inner: MemoryStore,
        fired: std::sync::atomic::AtomicBool,
    }

    impl ShiftStore for ClockOutAfterRead {
        fn save_worker(&self, worker: &Worker) -> EngineResult<()> {
            self.inner.save_worker(worker)
        }
        fn get_worker(&self, org_id: &str, worker_id: &str) -> EngineResult<Option<Worker>> {
            self.inner.get_worker(org_id, worker_id)
        }
        fn list_workers(&self, org_id: &str) -> EngineResult<Vec<Worker>> {
            self.inner.list_workers(org_id)
        }
        fn active_shift(&self, worker_id: &str) -> EngineResult<Option<Shift>> {
            self.inner.active_shift(worker_id)
        }
        fn apply_transition(
            &self,
            worker_id: &str,
            decide: &mut crate::store::TransitionFn<'_>,
        ) -> EngineResult<ClockTransition> {
            self.inner.apply_transition(worker_id, decide)
        }
        fn insert_shift(&self, shift: &Shift) -> EngineResult<()> {
            self.inner.insert_shift(shift)
        }
        fn update_shift(&self, previous: &Shift, shift: &Shift) -> EngineResult<()> {
            self.inner.update_shift(previous, shift)
        }
        fn get_shift(&self, org_id: &str, shift_id: &str) -> EngineResult<Option<Shift>> {
            let found = self.inner.get_shift(org_id, shift_id)?;
            if let Some(shift) = &found {
                if !self.fired.swap(true, std::sync::atomic::Ordering::SeqCst) {
                    let request = ClockRequest::new(shift.worker_id.clone(), at(20, 17, 0), None);
                    self.inner.apply_transition(&shift.worker_id, &mut |state| {
                        calculation::clock_out(state, &request)
                    })?;
                }
            }
            Ok(found)
        }
        fn list_shifts(&self, query: &ShiftQuery) -> EngineResult<Vec<Shift>> {
            self.inner.list_shifts(query)
        }
        fn time_entries(&self, shift_id: &str) -> EngineResult<Vec<TimeEntry>> {
            self.inner.time_entries(shift_id)
        }
        fn insert_schedules(&self, schedules: &[crate::models::Schedule]) -> EngineResult<()> {
            self.inner.insert_schedules(schedules)
        }
        fn delete_schedule(&self, org_id: &str, schedule_id: &str) -> EngineResult<()> {
            self.inner.delete_schedule(org_id, schedule_id)
        }
        fn list_schedules(
            &self,
            query: &crate::store::ScheduleQuery,
        ) -> EngineResult<Vec<crate::models::Schedule>> {
            self.inner.list_schedules(query)
        }
    }

    #[test]
    fn test_edit_does_not_overwrite_concurrent_clock_out() {
        let store = Arc::new(ClockOutAfterRead {
            inner: MemoryStore::new(),
            fired: std::sync::atomic::AtomicBool::new(false),
        });
        store
            .save_worker(&Worker::new("w_1", "org_1", "Dana", Role::Employee))
            .unwrap();
        let service = ClockService::new(store.clone(), &ConfigLoader::default());
        let employee = Actor::new("w_1", "org_1", Role::Employee);
        let manager = Actor::new("m_1", "org_1", Role::Manager);

        let opened = service.clock_in(&employee, at(20, 9, 0), None).unwrap();
        let result = service.edit_shift(&manager, &opened.shift.id, at(20, 8, 0), None);
        assert!(matches!(result, Err(EngineError::InvalidStateTransition { .. })));

        let stored = store.inner.get_shift("org_1", &opened.shift.id).unwrap().unwrap();
        assert_eq!(stored.status(), ShiftStatus::Completed);
        assert_eq!(stored.start_time(), at(20, 9, 0));
        assert_eq!(stored.end_time(), Some(at(20, 17, 0)));
        assert_eq!(stored.total_hours(), Some(Decimal::new(800, 2)));
        assert_eq!(store.inner.time_entries(&opened.shift.id).unwrap().len(), 2);

        // Re-reading the completed shift lets the edit through.
        let edited = service
            .edit_shift(&manager, &opened.shift.id, at(20, 8, 0), None)
            .unwrap();
        assert_eq!(edited.total_hours(), Some(Decimal::new(900, 2)));
    }
}
