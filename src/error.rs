//! Crate-level error type.
//!
//! Device problems never surface here: the relay engine absorbs them and
//! answers the GUI with fallbacks. What remains are failures that end the
//! process: a broken interface channel, bad configuration, logging setup.

use crate::config::ConfigError;
use thiserror::Error;

/// A specialized `Result` type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Unified application error type.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Reading commands from the GUI failed.
    #[error("interface channel read failed: {0}")]
    Interface(#[source] std::io::Error),

    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The log file could not be opened.
    #[error("failed to open log file '{path}': {source}")]
    LogFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The global tracing subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}
