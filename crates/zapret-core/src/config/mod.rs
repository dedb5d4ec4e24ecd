//! Configuration management
//!
//! Strongly-typed TOML configuration. Every section has defaults, so an empty
//! file (or no file at all) is a valid configuration.

use crate::error::{Error, Result};
use crate::mode::Mode;
use crate::provider::DEFAULT_PROVIDER;
use crate::resources::{ResourceLayout, DEFAULT_EXECUTABLE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound for the settle and probe delays
pub const MAX_DELAY_MS: u64 = 60_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider, mode and resource location
    pub general: GeneralConfig,

    /// External process settings
    pub process: ProcessConfig,

    /// Service-control collaborator
    pub service: ServiceConfig,

    /// Notification settings
    pub notifications: NotificationConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::ConfigNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::from)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let exe = self.process.executable.trim();
        if exe.is_empty() {
            return Err(Error::config_value("process.executable", "Must not be empty"));
        }
        if exe.contains(['/', '\\']) {
            return Err(Error::config_value(
                "process.executable",
                "Must be a file name inside bin/, not a path",
            ));
        }

        if self.process.settle_delay_ms > MAX_DELAY_MS {
            return Err(Error::config_value(
                "process.settle_delay_ms",
                format!("Must be at most {MAX_DELAY_MS}"),
            ));
        }
        if self.process.probe_delay_ms > MAX_DELAY_MS {
            return Err(Error::config_value(
                "process.probe_delay_ms",
                format!("Must be at most {MAX_DELAY_MS}"),
            ));
        }

        if self.service.name.trim().is_empty() {
            return Err(Error::config_value("service.name", "Must not be empty"));
        }

        Ok(())
    }

    /// Resource layout for this configuration
    ///
    /// Without an explicit `general.base_dir` the directory of the running
    /// binary is used.
    pub fn layout(&self) -> ResourceLayout {
        match self.general.base_dir {
            Some(ref dir) => ResourceLayout::new(dir.clone(), self.process.executable.clone()),
            None => ResourceLayout::beside_current_exe(self.process.executable.clone()),
        }
    }
}

/// Provider, mode and resource location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Provider name; unknown names behave like `Auto`
    pub provider: String,
    /// Aggressiveness mode
    pub mode: Mode,
    /// Directory containing `bin/` and `lists/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            mode: Mode::Optimized,
            base_dir: None,
        }
    }
}

/// External process settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Image name inside `bin/`
    pub executable: String,
    /// Wait after terminating old instances (ms)
    pub settle_delay_ms: u64,
    /// Wait before the liveness probe (ms)
    pub probe_delay_ms: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            settle_delay_ms: 500,
            probe_delay_ms: 1000,
        }
    }
}

/// Service-control collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name queried in the service manager
    pub name: String,
    /// Control script; defaults to `service.bat` / `service.sh` in the base directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "zapret".to_string(),
            script: None,
        }
    }
}

/// Notification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Surface notifications to the user
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
