//! Shift & Schedule Engine
//!
//! This crate tracks worked time and planned time for an organization's
//! workers: a per-worker clock state machine that allows at most one open
//! shift, decimal duration arithmetic, recurring weekly templates expanded
//! into schedules, and payroll and calendar projections.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod models;
pub mod store;
