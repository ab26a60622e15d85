//! Report encoders.
//!
//! - [`payroll_csv`]: payroll rows as a CSV document
//! - [`calendar_ics`]: calendar events as an iCalendar document

mod csv;
mod ics;

pub use self::csv::{PAYROLL_HEADER, payroll_csv};
pub use self::ics::{calendar_ics, escape_text};
