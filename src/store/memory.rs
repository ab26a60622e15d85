//! In-memory store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::calculation::{ClockEvent, ClockTransition, ShiftState};
use crate::error::{EngineError, EngineResult};
use crate::models::{Schedule, Shift, TimeEntry, Worker};

use super::{ScheduleQuery, ShiftQuery, ShiftStore, TransitionFn, stale_edit};

#[derive(Debug, Default)]
struct Inner {
    workers: BTreeMap<String, Worker>,
    shifts: HashMap<String, Shift>,
    entries: Vec<TimeEntry>,
    schedules: Vec<Schedule>,
}

impl Inner {
    fn worker_in_org(&self, org_id: &str, worker_id: &str) -> bool {
        self.workers
            .get(worker_id)
            .is_some_and(|w| w.org_id == org_id)
    }

    fn active_for(&self, worker_id: &str) -> Option<&Shift> {
        self.shifts
            .values()
            .find(|s| s.worker_id == worker_id && s.is_active())
    }

    fn ensure_single_active(&self, shift: &Shift) -> EngineResult<()> {
        if !shift.is_active() {
            return Ok(());
        }
        match self.active_for(&shift.worker_id) {
            Some(open) if open.id != shift.id => Err(EngineError::InvalidStateTransition {
                worker_id: shift.worker_id.clone(),
                state: "active".to_string(),
                attempted: "open a second shift".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// A [`ShiftStore`] that keeps everything in process memory.
///
/// Every operation takes a single mutex, which makes each call atomic and
/// serializes concurrent transitions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| EngineError::persistence("memory store lock poisoned"))
    }
}

impl ShiftStore for MemoryStore {
    fn save_worker(&self, worker: &Worker) -> EngineResult<()> {
        self.lock()?
            .workers
            .insert(worker.id.clone(), worker.clone());
        Ok(())
    }

    fn get_worker(&self, org_id: &str, worker_id: &str) -> EngineResult<Option<Worker>> {
        Ok(self
            .lock()?
            .workers
            .get(worker_id)
            .filter(|w| w.org_id == org_id)
            .cloned())
    }

    fn list_workers(&self, org_id: &str) -> EngineResult<Vec<Worker>> {
        Ok(self
            .lock()?
            .workers
            .values()
            .filter(|w| w.org_id == org_id)
            .cloned()
            .collect())
    }

    fn active_shift(&self, worker_id: &str) -> EngineResult<Option<Shift>> {
        Ok(self.lock()?.active_for(worker_id).cloned())
    }

    fn apply_transition(
        &self,
        worker_id: &str,
        decide: &mut TransitionFn<'_>,
    ) -> EngineResult<ClockTransition> {
        let mut inner = self.lock()?;
        let state = ShiftState::from_active(inner.active_for(worker_id).cloned());
        let transition = decide(&state)?;

        match transition.event {
            ClockEvent::ClockedIn => inner.ensure_single_active(&transition.shift)?,
            ClockEvent::ClockedOut if !inner.shifts.contains_key(&transition.shift.id) => {
                return Err(EngineError::not_found("shift", transition.shift.id.clone()));
            }
            ClockEvent::ClockedOut => {}
        }

        inner
            .shifts
            .insert(transition.shift.id.clone(), transition.shift.clone());
        inner.entries.push(transition.entry.clone());
        debug!(worker_id, shift_id = %transition.shift.id, event = ?transition.event, "Applied transition");
        Ok(transition)
    }

    fn insert_shift(&self, shift: &Shift) -> EngineResult<()> {
        let mut inner = self.lock()?;
        inner.ensure_single_active(shift)?;
        inner.shifts.insert(shift.id.clone(), shift.clone());
        Ok(())
    }

    fn update_shift(&self, previous: &Shift, shift: &Shift) -> EngineResult<()> {
        let mut inner = self.lock()?;
        let stored = inner
            .shifts
            .get(&shift.id)
            .ok_or_else(|| EngineError::not_found("shift", shift.id.clone()))?;
        if stored != previous {
            return Err(stale_edit(stored));
        }
        inner.ensure_single_active(shift)?;
        inner.shifts.insert(shift.id.clone(), shift.clone());
        Ok(())
    }

    fn get_shift(&self, org_id: &str, shift_id: &str) -> EngineResult<Option<Shift>> {
        let inner = self.lock()?;
        Ok(inner
            .shifts
            .get(shift_id)
            .filter(|s| inner.worker_in_org(org_id, &s.worker_id))
            .cloned())
    }

    fn list_shifts(&self, query: &ShiftQuery) -> EngineResult<Vec<Shift>> {
        let inner = self.lock()?;
        let mut shifts: Vec<Shift> = inner
            .shifts
            .values()
            .filter(|s| inner.worker_in_org(&query.org_id, &s.worker_id) && query.matches(s))
            .cloned()
            .collect();
        shifts.sort_by(|a, b| b.start_time().cmp(&a.start_time()));
        if let Some(limit) = query.limit {
            shifts.truncate(limit);
        }
        Ok(shifts)
    }

    fn time_entries(&self, shift_id: &str) -> EngineResult<Vec<TimeEntry>> {
        let mut entries: Vec<TimeEntry> = self
            .lock()?
            .entries
            .iter()
            .filter(|e| e.shift_id == shift_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    fn insert_schedules(&self, schedules: &[Schedule]) -> EngineResult<()> {
        let mut inner = self.lock()?;
        if let Some(orphan) = schedules
            .iter()
            .find(|s| !inner.workers.contains_key(&s.worker_id))
        {
            return Err(EngineError::not_found("worker", orphan.worker_id.clone()));
        }
        inner.schedules.extend(schedules.iter().cloned());
        debug!(count = schedules.len(), "Inserted schedules");
        Ok(())
    }

    fn delete_schedule(&self, org_id: &str, schedule_id: &str) -> EngineResult<()> {
        let mut inner = self.lock()?;
        let position = inner
            .schedules
            .iter()
            .position(|s| s.id == schedule_id && inner.worker_in_org(org_id, &s.worker_id))
            .ok_or_else(|| EngineError::not_found("schedule", schedule_id))?;
        inner.schedules.remove(position);
        Ok(())
    }

    fn list_schedules(&self, query: &ScheduleQuery) -> EngineResult<Vec<Schedule>> {
        let inner = self.lock()?;
        let mut schedules: Vec<Schedule> = inner
            .schedules
            .iter()
            .filter(|s| inner.worker_in_org(&query.org_id, &s.worker_id) && query.matches(s))
            .cloned()
            .collect();
        schedules.sort_by_key(|s| s.start_time);
        Ok(schedules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{ClockRequest, clock_in, clock_out, toggle};
    use crate::models::{Role, ScheduleOrigin};
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 20, hour, 0, 0).unwrap()
    }

    fn store_with_workers() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .save_worker(&Worker::new("w_1", "org_1", "Dana", Role::Employee))
            .unwrap();
        store
            .save_worker(&Worker::new("w_2", "org_2", "Lee", Role::Employee))
            .unwrap();
        store
    }

    #[test]
    fn test_transition_persists_shift_and_entry() {
        let store = store_with_workers();
        let request = ClockRequest::new("w_1", at(9), None);

        let transition = store
            .apply_transition("w_1", &mut |state| clock_in(state, &request))
            .unwrap();

        assert_eq!(store.active_shift("w_1").unwrap(), Some(transition.shift.clone()));
        assert_eq!(store.time_entries(&transition.shift.id).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_decision_writes_nothing() {
        let store = store_with_workers();
        let request = ClockRequest::new("w_1", at(9), None);

        let result = store.apply_transition("w_1", &mut |state| clock_out(state, &request));

        assert!(matches!(result, Err(EngineError::InvalidStateTransition { .. })));
        assert!(store.list_shifts(&ShiftQuery::for_org("org_1")).unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_toggles_never_open_two_shifts() {
        let store = Arc::new(store_with_workers());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let request = ClockRequest::new("w_1", at(9) + chrono::Duration::minutes(i), None);
                    store
                        .apply_transition("w_1", &mut |state| clock_in(state, &request))
                        .is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        let active: Vec<_> = store
            .list_shifts(&ShiftQuery::for_org("org_1"))
            .unwrap()
            .into_iter()
            .filter(|s| s.is_active())
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn test_insert_second_active_shift_is_rejected() {
        let store = store_with_workers();
        store.insert_shift(&Shift::open("w_1", at(9))).unwrap();

        let result = store.insert_shift(&Shift::open("w_1", at(10)));
        assert!(matches!(result, Err(EngineError::InvalidStateTransition { .. })));
    }

    #[test]
    fn test_update_unknown_shift_is_not_found() {
        let store = store_with_workers();
        let shift = Shift::open("w_1", at(9));
        let result = store.update_shift(&shift, &shift);
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_update_from_stale_copy_is_rejected() {
        let store = store_with_workers();
        let opened = store
            .apply_transition("w_1", &mut |state| {
                clock_in(state, &ClockRequest::new("w_1", at(9), None))
            })
            .unwrap();
        let stale = opened.shift.clone();
        store
            .apply_transition("w_1", &mut |state| {
                clock_out(state, &ClockRequest::new("w_1", at(17), None))
            })
            .unwrap();

        let mut edited = stale.clone();
        edited.retime(at(8), None).unwrap();
        let result = store.update_shift(&stale, &edited);
        assert!(matches!(result, Err(EngineError::InvalidStateTransition { .. })));

        let stored = store.get_shift("org_1", &stale.id).unwrap().unwrap();
        assert_eq!(stored.end_time(), Some(at(17)));
        assert!(!stored.is_active());
    }

    #[test]
    fn test_reads_are_org_scoped() {
        let store = store_with_workers();
        let shift = Shift::completed("w_2", at(9), at(17)).unwrap();
        store.insert_shift(&shift).unwrap();

        assert!(store.get_shift("org_1", &shift.id).unwrap().is_none());
        assert!(store.get_shift("org_2", &shift.id).unwrap().is_some());
        assert!(store.get_worker("org_1", "w_2").unwrap().is_none());
        assert_eq!(store.list_workers("org_2").unwrap().len(), 1);
    }

    #[test]
    fn test_list_shifts_newest_first_with_limit() {
        let store = store_with_workers();
        for hour in [8, 12, 10] {
            store
                .insert_shift(&Shift::completed("w_1", at(hour), at(hour + 1)).unwrap())
                .unwrap();
        }

        let query = ShiftQuery {
            limit: Some(2),
            ..ShiftQuery::for_org("org_1")
        };
        let shifts = store.list_shifts(&query).unwrap();
        let starts: Vec<_> = shifts.iter().map(|s| s.start_time()).collect();
        assert_eq!(starts, vec![at(12), at(10)]);
    }

    #[test]
    fn test_schedule_batch_with_unknown_worker_inserts_nothing() {
        let store = store_with_workers();
        let batch = vec![
            Schedule::new("w_1", at(9), at(17), None, ScheduleOrigin::Generated),
            Schedule::new("w_ghost", at(9), at(17), None, ScheduleOrigin::Generated),
        ];

        assert!(store.insert_schedules(&batch).is_err());
        assert!(store
            .list_schedules(&ScheduleQuery::for_org("org_1"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_schedule_is_org_scoped() {
        let store = store_with_workers();
        let schedule = Schedule::new("w_1", at(9), at(17), None, ScheduleOrigin::Manual);
        store.insert_schedules(std::slice::from_ref(&schedule)).unwrap();

        assert!(matches!(
            store.delete_schedule("org_2", &schedule.id),
            Err(EngineError::NotFound { .. })
        ));
        store.delete_schedule("org_1", &schedule.id).unwrap();
        assert!(matches!(
            store.delete_schedule("org_1", &schedule.id),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_toggle_round_trip_through_store() {
        let store = store_with_workers();
        let clock = |hour| {
            let request = ClockRequest::new("w_1", at(hour), None);
            store.apply_transition("w_1", &mut |state| toggle(state, &request))
        };

        clock(9).unwrap();
        let out = clock(17).unwrap();

        assert_eq!(out.event, ClockEvent::ClockedOut);
        assert!(store.active_shift("w_1").unwrap().is_none());
        let entries = store.time_entries(&out.shift.id).unwrap();
        assert_eq!(entries.len(), 2);
    }
}
