use std::path::PathBuf;
use thiserror::Error;

/// Why the bridge configuration could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named file does not exist.
    #[error("config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("cannot read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("cannot render config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("cannot write config file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value the bridge cannot run with, keyed by `section.field`.
    #[error("bad value for {key}: {message}")]
    ValidationError { key: String, message: String },

    /// A `UCI_BRIDGE_*` override that does not parse.
    #[error("bad value in ${var}: {message}")]
    EnvParseError { var: String, message: String },
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
