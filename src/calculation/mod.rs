//! Calculation logic for the Shift & Schedule Engine.
//!
//! This module contains the pure parts of the engine: duration arithmetic,
//! the clock-in/clock-out state machine, recurring template expansion, and
//! the payroll and calendar projections. Nothing here touches storage.

mod calendar;
mod duration;
mod payroll;
mod shift_state;
mod template_expansion;

pub use calendar::{CalendarEvent, format_ics_timestamp, project_calendar};
pub use duration::{
    HOURS_SCALE, MILLIS_PER_HOUR, calculate_duration, duration_minutes, format_duration,
};
pub use payroll::{PayrollRow, WorkerPayTotal, project_payroll, summarize_payroll};
pub use shift_state::{
    ClockEvent, ClockRequest, ClockTransition, ShiftState, clock_in, clock_out, toggle,
};
pub use template_expansion::{
    DEFAULT_GENERATED_NOTE, DEFAULT_MAX_GENERATION_DAYS, ExpansionOptions, ExpansionResult,
    ShiftWindow, expand_templates, parse_clock_time, parse_template_entry, validate_range,
};
