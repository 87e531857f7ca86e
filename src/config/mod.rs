//! Configuration management for the reactive model.
//!
//! Hierarchical loading with priority:
//! 1. Default values (hardcoded)
//! 2. Optional config file
//! 3. Environment variables (highest priority)

mod bundle;
pub use bundle::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Bundling deadline parameters
    #[serde(default)]
    pub bundle: BundleConfig,
}

impl Settings {
    /// Load configuration from an optional file, the `MODEL_CONFIG_PATH`
    /// file if set, then `MODEL__`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        if let Some(path) = path {
            config = config.add_source(File::with_name(path).required(true));
        }
        if let Ok(path) = env::var("MODEL_CONFIG_PATH") {
            config = config.add_source(File::with_name(&path));
        }

        // Environment variables (highest priority)
        config = config.add_source(
            Environment::with_prefix("MODEL")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates all model subsystem configurations
    pub fn validate(&self) -> Result<()> {
        self.bundle.validate()?;
        Ok(())
    }
}
