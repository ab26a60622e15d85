//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use chrono::FixedOffset;

use crate::calculation::ExpansionOptions;
use crate::error::{EngineError, EngineResult};

use super::types::EngineConfig;

/// Loads and provides access to the engine configuration.
///
/// # File Format
///
/// ```yaml
/// server:
///   bind: 0.0.0.0
///   port: 3000
/// database:
///   path: ./data/shifts.db
/// schedule:
///   utc_offset_minutes: 600
///   max_generation_days: 366
///   generated_note: Auto-generated
/// history:
///   history_limit: 50
///   recent_limit: 100
/// calendar:
///   uid_domain: shifts.example.com
///   product_id: -//Example//Shifts//EN
/// ```
///
/// Every section and field is optional.
///
/// # Example
///
/// ```no_run
/// use shift_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/engine.yaml").unwrap();
/// println!("Listening on port {}", loader.config().server.port);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
    expansion: ExpansionOptions,
}

impl ConfigLoader {
    /// Loads configuration from the specified file.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The file is missing ([`EngineError::ConfigNotFound`])
    /// - The file is not valid YAML or has wrongly typed fields, or the
    ///   UTC offset is out of range ([`EngineError::ConfigParseError`])
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::from_yaml(&content).map_err(|message| EngineError::ConfigParseError {
            path: path_str,
            message,
        })
    }

    /// Parses configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        let config: EngineConfig = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        Self::from_config(config)
    }

    /// Wraps an already built configuration, validating derived values.
    pub fn from_config(config: EngineConfig) -> Result<Self, String> {
        let expansion = config.expansion_options().ok_or_else(|| {
            format!(
                "schedule.utc_offset_minutes {} is out of range",
                config.schedule.utc_offset_minutes
            )
        })?;
        Ok(Self { config, expansion })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the options used for template expansion.
    pub fn expansion_options(&self) -> &ExpansionOptions {
        &self.expansion
    }

    /// Returns the organization's UTC offset.
    pub fn utc_offset(&self) -> FixedOffset {
        self.expansion.utc_offset
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            expansion: ExpansionOptions::default(),
        }
    }
}
