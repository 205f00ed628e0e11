//! Port abstraction layer for serial communication.
//!
//! Provides the blocking transport trait, the real `serialport`-backed
//! implementation, a scripted mock for tests, and line framing on top.

pub mod error;
pub mod framing;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use framing::{read_line, read_line_cancellable, FramingPolicy};
pub use mock::{MockPortHandle, MockSerialPort, ReadEvent};
pub use sync_port::*;
pub use traits::*;
