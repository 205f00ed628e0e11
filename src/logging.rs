//! Diagnostic logging setup.
//!
//! Stdout carries the UCI protocol, so log records go to stderr or to an
//! appended log file, never to stdout.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{BridgeError, BridgeResult};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// debug flag.
pub fn init_logging(config: &LoggingConfig) -> BridgeResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.debug)));

    match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| BridgeError::LogFile {
                    path: path.clone(),
                    source,
                })?;
            install(filter, config.format, Mutex::new(file), false)
        }
        None => install(filter, config.format, std::io::stderr, true),
    }
}

fn install<W>(filter: EnvFilter, format: LogFormat, writer: W, ansi: bool) -> BridgeResult<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    let result = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| BridgeError::Logging(e.to_string()))
}
