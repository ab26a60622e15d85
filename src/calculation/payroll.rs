//! Payroll projection.
//!
//! Turns completed shifts into payroll rows. The projection is a read-only
//! view: hours come from each shift's stored `total_hours` and are never
//! recomputed from its timestamps.

use std::collections::{BTreeMap, HashMap};

use chrono::{FixedOffset, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Shift, Worker};

/// One payroll line for one completed shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRow {
    /// The shift this row is derived from.
    pub shift_id: String,
    /// The worker who worked the shift.
    pub worker_id: String,
    /// The worker's display name.
    pub worker_name: String,
    /// Hourly rate applied (zero when the worker has none).
    pub pay_rate: Decimal,
    /// Local calendar date the shift started on.
    pub shift_date: NaiveDate,
    /// Stored hours of the shift.
    pub total_hours: Decimal,
    /// `total_hours × pay_rate`, rounded to cents.
    pub total_pay: Decimal,
}

/// Hours and pay summed per worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPayTotal {
    /// The worker.
    pub worker_id: String,
    /// The worker's display name.
    pub worker_name: String,
    /// Number of shifts included.
    pub shift_count: usize,
    /// Sum of stored hours.
    pub total_hours: Decimal,
    /// Sum of row pay.
    pub total_pay: Decimal,
}

fn round_cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Projects completed shifts into payroll rows.
///
/// # Arguments
///
/// * `shifts` - Candidate shifts; active shifts are ignored
/// * `workers` - Worker records used for names and rates
/// * `range` - Optional inclusive range of local start dates
/// * `offset` - Offset used to derive each shift's local date
///
/// # Returns
///
/// Rows ordered by shift start time. Shifts whose worker is not in
/// `workers` are skipped with a warning.
///
/// # Example
///
/// ```
/// use shift_engine::calculation::project_payroll;
/// use shift_engine::models::{Role, Shift, Worker};
/// use chrono::{Offset, TimeZone, Utc};
/// use rust_decimal::Decimal;
///
/// let mut worker = Worker::new("w_001", "org_1", "Dana", Role::Employee);
/// worker.pay_rate = Some(Decimal::new(2500, 2));
/// let shift = Shift::completed(
///     "w_001",
///     Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2026, 1, 20, 17, 30, 0).unwrap(),
/// )
/// .unwrap();
///
/// let rows = project_payroll(&[shift], &[worker], None, Utc.fix());
/// assert_eq!(rows[0].total_pay, Decimal::new(21250, 2));
/// ```
pub fn project_payroll(
    shifts: &[Shift],
    workers: &[Worker],
    range: Option<(NaiveDate, NaiveDate)>,
    offset: FixedOffset,
) -> Vec<PayrollRow> {
    let by_id: HashMap<&str, &Worker> = workers.iter().map(|w| (w.id.as_str(), w)).collect();

    let mut completed: Vec<&Shift> = shifts
        .iter()
        .filter(|s| s.total_hours().is_some())
        .collect();
    completed.sort_by_key(|s| s.start_time());

    completed
        .into_iter()
        .filter_map(|shift| {
            let shift_date = shift.start_time().with_timezone(&offset).date_naive();
            if let Some((start, end)) = range {
                if shift_date < start || shift_date > end {
                    return None;
                }
            }

            let Some(worker) = by_id.get(shift.worker_id.as_str()) else {
                warn!(shift_id = %shift.id, worker_id = %shift.worker_id, "Shift has no known worker");
                return None;
            };

            let total_hours = shift.total_hours()?;
            let pay_rate = worker.effective_pay_rate();

            Some(PayrollRow {
                shift_id: shift.id.clone(),
                worker_id: worker.id.clone(),
                worker_name: worker.name.clone(),
                pay_rate,
                shift_date,
                total_hours,
                total_pay: round_cents(total_hours * pay_rate),
            })
        })
        .collect()
}

/// Sums payroll rows per worker, ordered by worker id.
pub fn summarize_payroll(rows: &[PayrollRow]) -> Vec<WorkerPayTotal> {
    let mut totals: BTreeMap<&str, WorkerPayTotal> = BTreeMap::new();

    for row in rows {
        let total = totals
            .entry(row.worker_id.as_str())
            .or_insert_with(|| WorkerPayTotal {
                worker_id: row.worker_id.clone(),
                worker_name: row.worker_name.clone(),
                shift_count: 0,
                total_hours: Decimal::ZERO,
                total_pay: Decimal::ZERO,
            });
        total.shift_count += 1;
        total.total_hours += row.total_hours;
        total.total_pay += row.total_pay;
    }

    totals.into_values().collect()
}
