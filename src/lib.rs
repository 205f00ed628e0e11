//! UCI Serial Bridge Library
//!
//! Relays the UCI protocol between a chess GUI on stdin/stdout and a chess
//! engine running on a microcontroller behind a serial port. The bridge keeps
//! the GUI conversation valid when the device is missing, slow, or silent:
//! handshakes are completed locally and searches always end in a result.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `error`: Unified error handling
//! - `port`: Port abstraction layer and line framing
//! - `link`: Connectors and the shared device link
//! - `protocol`: UCI command classification and timeout budgets
//! - `session`: Connection lifecycle with bounded retries
//! - `engine`: Per-command relay handlers
//! - `output`: Serialized writes to the GUI
//! - `logging`: Diagnostic log setup
//! - `stdio`: Command loop over stdin

pub mod config;
pub mod engine;
pub mod error;
pub mod link;
pub mod logging;
pub mod output;
pub mod port;
pub mod protocol;
pub mod session;
pub mod stdio;

// Re-export commonly used types for convenience
pub use engine::{Flow, RelayEngine, Timings, DEFAULT_FALLBACK_MOVE};
pub use error::{BridgeError, BridgeResult};
pub use link::{Connector, DeviceLink, FnConnector, PortAdapter, SerialConnector};
pub use output::{CapturedOutput, GuiWriter};
pub use port::{
    FramingPolicy, MockPortHandle, MockSerialPort, PortConfiguration, PortError, ReadEvent,
    SerialPortAdapter, SyncSerialPort,
};
pub use protocol::{Command, GoParams, SearchBudget};
pub use session::{EngineIdentity, RetryPolicy, Session};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
