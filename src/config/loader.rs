//! Configuration Loader
//!
//! Layered configuration loading: typed defaults, an optional config file,
//! and `TABLEWISE_`-prefixed environment overrides, highest last. Loading
//! never depends on a file being present; defaults alone produce a valid
//! configuration.

use super::TablewiseConfig;
use crate::error::{Result, TablewiseError};
use config::{Config, Environment, File};
use tracing::debug;

impl TablewiseConfig {
    /// Load configuration from defaults, `config/tablewise.{toml,yaml,json}`
    /// if present, and `TABLEWISE_`-prefixed environment variables
    /// (`TABLEWISE_WORKFLOW__MAX_CONCURRENT=5`).
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/tablewise")
    }

    /// Load configuration with an explicit file stem, for tests and embedders
    pub fn load_from_path(path: &str) -> Result<Self> {
        let defaults = Config::try_from(&TablewiseConfig::default())
            .map_err(|e| TablewiseError::ConfigurationError(e.to_string()))?;

        let merged = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("TABLEWISE").separator("__"))
            .build()
            .map_err(|e| TablewiseError::ConfigurationError(e.to_string()))?;

        let config: TablewiseConfig = merged
            .try_deserialize()
            .map_err(|e| TablewiseError::ConfigurationError(e.to_string()))?;

        config.validate()?;

        debug!(
            max_concurrent = config.workflow.max_concurrent,
            batch_size = config.workflow.batch_size,
            quality_threshold = config.quality.default_threshold,
            "Configuration loaded"
        );

        Ok(config)
    }
}
