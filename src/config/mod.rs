//! Configuration module for the bridge.
//!
//! This module provides TOML-based configuration with environment variable
//! overrides. Command-line flags are applied on top by the binary.
//!
//! # Configuration Resolution
//!
//! 1. `UCI_BRIDGE_CONFIG` environment variable (explicit path)
//! 2. `./bridge.toml` (current directory)
//! 3. `<platform config dir>/uci-serial-bridge/bridge.toml`
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `UCI_BRIDGE_<SECTION>_<KEY>`, e.g.
//! `UCI_BRIDGE_SERIAL_PORT=COM3` or `UCI_BRIDGE_LOGGING_DEBUG=1`.
//!
//! # Example
//!
//! ```toml
//! [serial]
//! port = "COM15"
//! baud_rate = 115200
//! timeout_secs = 3
//!
//! [engine]
//! name = "PicoChess"
//! author = "arnisz"
//!
//! [logging]
//! debug = true
//! file = "bridge.log"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
    CONFIG_FILE_NAME,
};
pub use schema::{
    Config, ConnectionConfig, EngineConfig, LogFormat, LoggingConfig, SearchConfig, SerialConfig,
};
