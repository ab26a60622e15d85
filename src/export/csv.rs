use csv::Writer;

use crate::calculation::PayrollRow;
use crate::error::{EngineError, EngineResult};

/// Column names of the payroll report.
pub const PAYROLL_HEADER: [&str; 6] = [
    "Employee ID",
    "Name",
    "Pay Rate",
    "Date",
    "Hours Worked",
    "Total Pay",
];

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::ExportFailure {
            message: err.to_string(),
        }
    }
}

/// Encodes payroll rows as CSV, one line per shift after the header.
///
/// Dates are written as `YYYY-MM-DD`, hours and pay with two decimals.
///
/// ```
/// use shift_engine::export::payroll_csv;
///
/// let csv = payroll_csv(&[]).unwrap();
/// assert_eq!(csv, "Employee ID,Name,Pay Rate,Date,Hours Worked,Total Pay\n");
/// ```
pub fn payroll_csv(rows: &[PayrollRow]) -> EngineResult<String> {
    let mut wtr = Writer::from_writer(Vec::new());

    wtr.write_record(PAYROLL_HEADER)?;

    for row in rows {
        wtr.write_record(&[
            row.worker_id.clone(),
            row.worker_name.clone(),
            row.pay_rate.to_string(),
            row.shift_date.format("%Y-%m-%d").to_string(),
            row.total_hours.to_string(),
            row.total_pay.to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().map_err(|e| EngineError::ExportFailure {
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| EngineError::ExportFailure {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn row(worker_name: &str, hours: Decimal, pay: Decimal) -> PayrollRow {
        PayrollRow {
            shift_id: "s_1".to_string(),
            worker_id: "w_001".to_string(),
            worker_name: worker_name.to_string(),
            pay_rate: Decimal::new(2500, 2),
            shift_date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            total_hours: hours,
            total_pay: pay,
        }
    }

    #[test]
    fn test_row_layout() {
        let csv = payroll_csv(&[row("Dana", Decimal::new(850, 2), Decimal::new(21250, 2))]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Employee ID,Name,Pay Rate,Date,Hours Worked,Total Pay");
        assert_eq!(lines[1], "w_001,Dana,25.00,2026-01-20,8.50,212.50");
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let csv = payroll_csv(&[row("Lee, Dana", Decimal::new(100, 2), Decimal::new(2500, 2))]).unwrap();
        assert!(csv.contains("\"Lee, Dana\""));
    }
}
