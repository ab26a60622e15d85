//! Error types for the Shift & Schedule Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while tracking shifts and
//! generating schedules.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the Shift & Schedule Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use shift_engine::error::EngineError;
///
/// let error = EngineError::NotFound {
///     entity: "schedule".to_string(),
///     id: "sch_001".to_string(),
/// };
/// assert_eq!(error.to_string(), "schedule not found: sch_001");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// A clock transition was requested that the current shift state does not allow.
    #[error("Invalid state transition for worker '{worker_id}': cannot {attempted} while {state}")]
    InvalidStateTransition {
        /// The worker whose state was checked.
        worker_id: String,
        /// The state the worker was in (`idle` or `active`).
        state: String,
        /// The transition that was attempted (`clock in` or `clock out`).
        attempted: String,
    },

    /// A record referenced by id does not exist in the caller's organization.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record (`shift`, `schedule`, `worker`).
        entity: String,
        /// The id that was looked up.
        id: String,
    },

    /// A recurring template entry could not be interpreted.
    #[error("Malformed template entry for worker '{worker_id}' on {weekday}: {message}")]
    MalformedTemplateEntry {
        /// The worker owning the template.
        worker_id: String,
        /// The weekday key of the entry.
        weekday: String,
        /// What was wrong with the entry.
        message: String,
    },

    /// The persistent store failed to complete an operation.
    #[error("Persistence failure: {message}")]
    PersistenceFailure {
        /// A description of the storage error.
        message: String,
    },

    /// A manually entered shift was invalid.
    #[error("Invalid shift '{shift_id}': {message}")]
    InvalidShift {
        /// The ID of the invalid shift (or `new` for a shift being created).
        shift_id: String,
        /// A description of what made the shift invalid.
        message: String,
    },

    /// A manually entered schedule was invalid.
    #[error("Invalid schedule: {message}")]
    InvalidSchedule {
        /// A description of what made the schedule invalid.
        message: String,
    },

    /// A date range was reversed or too long.
    #[error("Invalid date range {start} to {end}: {message}")]
    InvalidDateRange {
        /// The first day of the range.
        start: NaiveDate,
        /// The last day of the range.
        end: NaiveDate,
        /// Why the range was rejected.
        message: String,
    },

    /// A report could not be encoded.
    #[error("Export failed: {message}")]
    ExportFailure {
        /// A description of the encoding error.
        message: String,
    },

    /// The caller's role does not permit the operation.
    #[error("Access denied: {operation} requires a manager")]
    AccessDenied {
        /// The operation that was refused.
        operation: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::NotFound`] of the given entity kind.
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    /// Shorthand for a [`EngineError::PersistenceFailure`].
    pub fn persistence(message: impl Into<String>) -> Self {
        EngineError::PersistenceFailure {
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
