//! Report service: payroll and calendar exports.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::info;

use crate::calculation::{
    CalendarEvent, PayrollRow, WorkerPayTotal, project_calendar, project_payroll,
    summarize_payroll,
};
use crate::config::ConfigLoader;
use crate::error::EngineResult;
use crate::export;
use crate::models::{Actor, ShiftStatus};
use crate::store::{ScheduleQuery, ShiftQuery, ShiftStore};

use super::day_bounds;

/// Manager-only read projections.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn ShiftStore>,
    offset: FixedOffset,
    uid_domain: String,
    product_id: String,
}

impl ReportService {
    /// Creates the service.
    pub fn new(store: Arc<dyn ShiftStore>, config: &ConfigLoader) -> Self {
        let calendar = &config.config().calendar;
        Self {
            store,
            offset: config.utc_offset(),
            uid_domain: calendar.uid_domain.clone(),
            product_id: calendar.product_id.clone(),
        }
    }

    /// Payroll rows for the organization's completed shifts, optionally
    /// limited to shifts starting within the local days of `range`.
    pub fn payroll(
        &self,
        actor: &Actor,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> EngineResult<Vec<PayrollRow>> {
        actor.require_manager("export payroll")?;

        let mut query = ShiftQuery {
            status: Some(ShiftStatus::Completed),
            ..ShiftQuery::for_org(actor.org_id.clone())
        };
        if let Some((start, end)) = range {
            let (from, to) = day_bounds(self.offset, start, end)?;
            query.from = Some(from);
            query.to = Some(to);
        }

        let shifts = self.store.list_shifts(&query)?;
        let workers = self.store.list_workers(&actor.org_id)?;
        let rows = project_payroll(&shifts, &workers, range, self.offset);

        info!(org_id = %actor.org_id, rows = rows.len(), "Payroll projected");
        Ok(rows)
    }

    /// Payroll totals per worker.
    pub fn payroll_summary(
        &self,
        actor: &Actor,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> EngineResult<Vec<WorkerPayTotal>> {
        Ok(summarize_payroll(&self.payroll(actor, range)?))
    }

    /// The payroll report as CSV.
    pub fn payroll_csv(
        &self,
        actor: &Actor,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> EngineResult<String> {
        export::payroll_csv(&self.payroll(actor, range)?)
    }

    /// Calendar events for every schedule of the organization.
    pub fn calendar(&self, actor: &Actor) -> EngineResult<Vec<CalendarEvent>> {
        actor.require_manager("export the calendar")?;

        let schedules = self
            .store
            .list_schedules(&ScheduleQuery::for_org(actor.org_id.clone()))?;
        let workers = self.store.list_workers(&actor.org_id)?;
        Ok(project_calendar(&schedules, &workers, &self.uid_domain))
    }

    /// The calendar as an iCalendar document.
    pub fn calendar_ics(&self, actor: &Actor) -> EngineResult<String> {
        let events = self.calendar(actor)?;
        info!(org_id = %actor.org_id, events = events.len(), "Calendar exported");
        Ok(export::calendar_ics(&events, &self.product_id, Utc::now()))
    }
}
