//! Configuration loading and management for the engine.
//!
//! This module loads the engine configuration from a YAML file: listener
//! and database settings, the organization's UTC offset, listing limits and
//! calendar export identifiers.
//!
//! # Example
//!
//! ```no_run
//! use shift_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/engine.yaml").unwrap();
//! println!("Database: {}", config.config().database.path);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CalendarConfig, DatabaseConfig, EngineConfig, HistoryConfig, ScheduleConfig, ServerConfig,
};
