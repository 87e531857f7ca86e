use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Configuration for the bundling (state export) protocol
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BundleConfig {
    /// Deadline (in milliseconds) for the model to reach quiescence before
    /// a bundle attempt fails with a timeout
    /// Default value is set via default_bundle_timeout_ms() function
    #[serde(default = "default_bundle_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_bundle_timeout_ms(),
        }
    }
}

impl BundleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms < 1 {
            return Err(Error::Config(ConfigError::Message(
                "bundle.timeout_ms must be at least 1ms".into(),
            )));
        }
        Ok(())
    }
}

// in ms
fn default_bundle_timeout_ms() -> u64 {
    1000
}
