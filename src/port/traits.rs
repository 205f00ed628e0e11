//! Transport abstraction underneath the device link.
//!
//! The link only needs a blocking byte pipe with an adjustable read timeout.
//! [`SerialPortAdapter`] captures exactly that, so a scripted mock can stand
//! in for the microcontroller.

use super::error::PortError;
use std::io;
use std::time::Duration;

/// Settings used when opening the device.
///
/// Character framing is fixed at 8 data bits, no parity, one stop bit and
/// no flow control, which is what the engine firmware speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,
    /// Read/write timeout in effect right after opening.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self::with_baud(115_200, Duration::from_secs(3))
    }
}

impl PortConfiguration {
    pub fn with_baud(baud_rate: u32, timeout: Duration) -> Self {
        Self { baud_rate, timeout }
    }
}

/// Blocking byte transport.
///
/// Reads wait at most for the timeout last given to
/// [`set_timeout`](Self::set_timeout); a read that times out returns an
/// error for which [`PortError::is_timeout`] is true.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write some of `data`, returning how many bytes were accepted.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read into `buffer`, returning how many bytes arrived.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Port name, e.g. `COM15`.
    fn name(&self) -> &str;

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Write all of `data`, retrying short writes.
    fn write_all_bytes(&mut self, mut data: &[u8]) -> Result<(), PortError> {
        while !data.is_empty() {
            match self.write_bytes(data)? {
                0 => {
                    return Err(PortError::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "device accepted no bytes",
                    )))
                }
                n => data = &data[n..],
            }
        }
        Ok(())
    }
}
