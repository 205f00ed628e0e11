//! Transport errors and their classification.
//!
//! The relay engine never inspects which transport failed. It only asks two
//! questions of an error: is this the device being quiet, or is the link
//! gone?

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure of a transport operation.
#[derive(Debug, Error)]
pub enum PortError {
    /// No device under that name.
    #[error("device not found: {0}")]
    NotFound(String),

    #[error("device I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The driver rejected the port settings.
    #[error("invalid port settings: {0}")]
    Config(String),

    /// Nothing arrived within the read timeout.
    #[error("no data within {0:?}")]
    Timeout(Duration),

    /// The session currently has no link.
    #[error("device not connected")]
    NotConnected,

    #[error("serial driver error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout(duration)
    }

    /// The idle condition of a timed read. Callers keep collecting.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// Anything that is not idleness means the link must be re-acquired.
    pub fn is_connection_lost(&self) -> bool {
        !self.is_timeout()
    }
}
