//! Encoder configuration
//!
//! Optional settings loaded from a TOML file. Command-line values take
//! precedence over anything set here.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::console::ColorMode;
use crate::error::{EncodeError, Result};
use crate::profile::DEFAULT_QUALITY;

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Quality level used when none is given on the command line (1-4)
    pub quality: i32,

    /// How often the progress bar is refreshed, in milliseconds
    pub poll_interval_ms: u64,

    /// Terminal color policy
    pub color: ColorMode,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            poll_interval_ms: 100,
            color: ColorMode::Auto,
            log_level: "warn".to_string(),
        }
    }
}

impl EncoderConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EncodeError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| EncodeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| EncodeError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Progress refresh interval, at least one millisecond.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
