//! Core data models for the Shift & Schedule Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod actor;
mod schedule;
mod shift;
mod time_entry;
mod worker;

pub use actor::Actor;
pub use schedule::{Schedule, ScheduleOrigin};
pub use shift::{Shift, ShiftStatus};
pub use time_entry::{GeoLocation, TimeEntry, TimeEntryType};
pub use worker::{RecurringTemplate, Role, Worker, weekday_name};
