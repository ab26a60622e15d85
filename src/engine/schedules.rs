//! Schedule service: manual schedules, template generation and templates.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, SubsecRound, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::calculation::{ExpansionOptions, expand_templates};
use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, RecurringTemplate, Schedule, ScheduleOrigin, Worker};
use crate::store::{ScheduleQuery, ShiftStore};

use super::{day_bounds, require_worker};

/// Outcome of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Number of schedules persisted.
    pub count: usize,
    /// The persisted schedules.
    pub schedules: Vec<Schedule>,
    /// Descriptions of the template entries that were skipped.
    pub skipped: Vec<String>,
}

/// Schedule planning operations.
#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn ShiftStore>,
    expansion: ExpansionOptions,
}

impl ScheduleService {
    /// Creates the service.
    pub fn new(store: Arc<dyn ShiftStore>, config: &ConfigLoader) -> Self {
        Self {
            store,
            expansion: config.expansion_options().clone(),
        }
    }

    fn offset(&self) -> FixedOffset {
        self.expansion.utc_offset
    }

    /// Creates a manual schedule for a worker of the manager's organization.
    pub fn create(
        &self,
        actor: &Actor,
        worker_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        notes: Option<String>,
    ) -> EngineResult<Schedule> {
        actor.require_manager("create a schedule")?;
        require_worker(self.store.as_ref(), actor, worker_id)?;

        if end < start {
            return Err(EngineError::InvalidSchedule {
                message: format!("end {} is before start {}", end, start),
            });
        }

        let schedule = Schedule::new(
            worker_id,
            start.trunc_subsecs(3),
            end.trunc_subsecs(3),
            notes,
            ScheduleOrigin::Manual,
        );
        self.store.insert_schedules(std::slice::from_ref(&schedule))?;

        info!(manager_id = %actor.worker_id, worker_id, schedule_id = %schedule.id, "Schedule created");
        Ok(schedule)
    }

    /// Expands every active worker's template over the inclusive range and
    /// persists the result as one batch.
    ///
    /// Malformed template entries are skipped and reported, never fatal.
    pub fn generate(
        &self,
        actor: &Actor,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<GenerationReport> {
        actor.require_manager("generate schedules")?;

        let workers = self.store.list_workers(&actor.org_id)?;
        let expansion = expand_templates(start, end, &workers, &self.expansion)?;

        if !expansion.schedules.is_empty() {
            self.store.insert_schedules(&expansion.schedules)?;
        }

        let skipped: Vec<String> = expansion.skipped.iter().map(|e| e.to_string()).collect();
        if !skipped.is_empty() {
            warn!(org_id = %actor.org_id, skipped = skipped.len(), "Template entries skipped during generation");
        }
        info!(
            org_id = %actor.org_id,
            %start,
            %end,
            generated = expansion.schedules.len(),
            "Schedules generated"
        );

        Ok(GenerationReport {
            count: expansion.schedules.len(),
            schedules: expansion.schedules,
            skipped,
        })
    }

    /// Deletes a schedule of the manager's organization.
    pub fn delete(&self, actor: &Actor, schedule_id: &str) -> EngineResult<()> {
        actor.require_manager("delete a schedule")?;
        self.store.delete_schedule(&actor.org_id, schedule_id)?;
        info!(manager_id = %actor.worker_id, schedule_id, "Schedule deleted");
        Ok(())
    }

    /// Lists schedules, oldest first, optionally limited to local days.
    ///
    /// Managers see the whole organization; employees only their own.
    pub fn list(
        &self,
        actor: &Actor,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> EngineResult<Vec<Schedule>> {
        let mut query = ScheduleQuery::for_org(actor.org_id.clone());
        if !actor.role.is_manager() {
            query.worker_id = Some(actor.worker_id.clone());
        }
        if let Some((start, end)) = range {
            let (from, to) = day_bounds(self.offset(), start, end)?;
            query.from = Some(from);
            query.to = Some(to);
        }
        self.store.list_schedules(&query)
    }

    /// Replaces a worker's recurring template. `None` clears it.
    pub fn set_template(
        &self,
        actor: &Actor,
        worker_id: &str,
        template: Option<RecurringTemplate>,
    ) -> EngineResult<Worker> {
        actor.require_manager("change a recurring template")?;

        let mut worker = require_worker(self.store.as_ref(), actor, worker_id)?;
        worker.recurring_template = template.filter(|t| !t.is_empty());
        self.store.save_worker(&worker)?;

        info!(manager_id = %actor.worker_id, worker_id, "Recurring template updated");
        Ok(worker)
    }
}
