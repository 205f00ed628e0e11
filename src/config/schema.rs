//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::port::PortConfiguration;
use crate::protocol::SearchBudget;
use crate::session::{EngineIdentity, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link to the device
    pub serial: SerialConfig,
    /// Identity reported to the GUI
    pub engine: EngineConfig,
    /// Search timeout policy
    pub search: SearchConfig,
    /// Connection retry policy
    pub connection: ConnectionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the bridge cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::validation("serial.port", "must not be empty"));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::validation("serial.baud_rate", "must be > 0"));
        }
        if self.serial.timeout_secs == 0 {
            return Err(ConfigError::validation("serial.timeout_secs", "must be > 0"));
        }
        if self.engine.name.trim().is_empty() {
            return Err(ConfigError::validation("engine.name", "must not be empty"));
        }
        if self.search.fallback_move.trim().is_empty() {
            return Err(ConfigError::validation(
                "search.fallback_move",
                "must not be empty",
            ));
        }
        if self.search.max_budget_ms == 0 {
            return Err(ConfigError::validation("search.max_budget_ms", "must be > 0"));
        }
        if self.connection.max_attempts == 0 {
            return Err(ConfigError::validation(
                "connection.max_attempts",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Serial port section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port name, e.g. "COM15" or "/dev/ttyACM0"
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Initial transport timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: 115_200,
            timeout_secs: 3,
        }
    }
}

impl SerialConfig {
    /// Get the timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Transport settings for this section (8N1, no flow control).
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration::with_baud(self.baud_rate, self.timeout())
    }
}

#[cfg(target_os = "windows")]
fn default_port() -> &'static str {
    "COM15"
}

#[cfg(not(target_os = "windows"))]
fn default_port() -> &'static str {
    "/dev/ttyACM0"
}

/// Engine identity section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub name: String,
    pub author: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let identity = EngineIdentity::default();
        Self {
            name: identity.name,
            author: identity.author,
        }
    }
}

impl EngineConfig {
    pub fn identity(&self) -> EngineIdentity {
        EngineIdentity {
            name: self.name.clone(),
            author: self.author.clone(),
        }
    }
}

/// Search timeout section. All values in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Move sent when the device gives no result in time
    pub fallback_move: String,
    /// Added to movetime or the clock share
    pub buffer_ms: u64,
    /// Budget when `go` carries no time information
    pub default_budget_ms: u64,
    /// Lower bound of the clock share
    pub min_clock_share_ms: u64,
    /// Upper bound of the clock share
    pub max_clock_share_ms: u64,
    /// Ceiling on any budget
    pub max_budget_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let budget = SearchBudget::default();
        Self {
            fallback_move: crate::engine::DEFAULT_FALLBACK_MOVE.to_string(),
            buffer_ms: budget.buffer.as_millis() as u64,
            default_budget_ms: budget.default_budget.as_millis() as u64,
            min_clock_share_ms: budget.min_clock_share.as_millis() as u64,
            max_clock_share_ms: budget.max_clock_share.as_millis() as u64,
            max_budget_ms: budget.max_budget.as_millis() as u64,
        }
    }
}

impl SearchConfig {
    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            buffer: Duration::from_millis(self.buffer_ms),
            default_budget: Duration::from_millis(self.default_budget_ms),
            min_clock_share: Duration::from_millis(self.min_clock_share_ms),
            max_clock_share: Duration::from_millis(self.max_clock_share_ms),
            max_budget: Duration::from_millis(self.max_budget_ms),
        }
    }
}

/// Connection retry section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Open attempts before running without a device
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds
    pub backoff_ms: u64,
    /// Pause after opening in milliseconds
    pub warmup_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            max_attempts: retry.max_attempts,
            backoff_ms: retry.backoff.as_millis() as u64,
            warmup_ms: retry.warmup.as_millis() as u64,
        }
    }
}

impl ConnectionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
            warmup: Duration::from_millis(self.warmup_ms),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log protocol traffic at debug level
    pub debug: bool,
    /// Append logs to this file instead of stderr
    pub file: Option<PathBuf>,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}
