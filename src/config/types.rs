//! Configuration types for the engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file. Every field has a
//! default, so a partial file (or no file) is valid.

use chrono::FixedOffset;
use serde::Deserialize;

use crate::calculation::{DEFAULT_GENERATED_NOTE, DEFAULT_MAX_GENERATION_DAYS, ExpansionOptions};

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./data/shifts.db".to_string(),
        }
    }
}

/// Schedule generation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Offset of the organization's local time from UTC, in minutes.
    /// Template times and payroll dates are interpreted in this offset.
    pub utc_offset_minutes: i32,
    /// Longest range a single generation request may cover.
    pub max_generation_days: u32,
    /// Notes written on generated schedules.
    pub generated_note: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            max_generation_days: DEFAULT_MAX_GENERATION_DAYS,
            generated_note: DEFAULT_GENERATED_NOTE.to_string(),
        }
    }
}

/// Listing limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Shifts returned by a worker's own history.
    pub history_limit: usize,
    /// Shifts returned by an organization listing without a date range.
    pub recent_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            recent_limit: 100,
        }
    }
}

/// Calendar export settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Domain part of each event UID.
    pub uid_domain: String,
    /// `PRODID` of exported calendars.
    pub product_id: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            uid_domain: "shift-engine.local".to_string(),
            product_id: "-//Shift Engine//NONSGML v1.0//EN".to_string(),
        }
    }
}

/// The complete engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Schedule generation settings.
    pub schedule: ScheduleConfig,
    /// Listing limits.
    pub history: HistoryConfig,
    /// Calendar export settings.
    pub calendar: CalendarConfig,
}

impl EngineConfig {
    /// The organization's UTC offset, or `None` if out of range.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.schedule.utc_offset_minutes.checked_mul(60)?)
    }

    /// Expansion options derived from the schedule section.
    pub fn expansion_options(&self) -> Option<ExpansionOptions> {
        Some(ExpansionOptions {
            utc_offset: self.utc_offset()?,
            notes: self.schedule.generated_note.clone(),
            max_days: self.schedule.max_generation_days,
        })
    }
}
