//! SimpleChat CLI Configuration
//!
//! Defaults cover everything; an optional TOML file passed with `--config`
//! may override individual fields:
//!
//! ```toml
//! default_port = 50051
//! retry_delay_secs = 60
//! max_frame_len = 1048576
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use simplechat_core::{SessionConfig, DEFAULT_MAX_FRAME_LEN, DEFAULT_PORT, DEFAULT_RETRY_DELAY};

use crate::error::{CliError, Result};

/// Settings for the `simplechat` binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Port used when none is given on the command line
    pub default_port: u16,
    /// Delay between reconnection attempts in client mode
    pub retry_delay_secs: u64,
    /// Largest accepted frame payload in bytes
    pub max_frame_len: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            retry_delay_secs: DEFAULT_RETRY_DELAY.as_secs(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<()> {
        if self.default_port == 0 {
            return Err(CliError::Config(
                "Default port must be greater than 0".to_string(),
            ));
        }
        if self.max_frame_len == 0 {
            return Err(CliError::Config(
                "Max frame length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Session settings for a participant named `name`
    pub fn session_config(&self, name: &str) -> SessionConfig {
        SessionConfig::new(name).with_max_frame_len(self.max_frame_len)
    }
}
