//! Line framing over a byte-oriented serial transport.
//!
//! The device's output has no message boundaries of its own, so every read
//! the bridge performs goes through [`read_line`]: bytes are pulled one at a
//! time with a short per-byte timeout until a newline arrives or the device
//! has been quiet for longer than the collection deadline.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default per-byte read timeout.
pub const DEFAULT_BYTE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default quiet period after which a partial line is returned.
pub const DEFAULT_LINE_DEADLINE: Duration = Duration::from_secs(2);

/// Default cap on a single line.
pub const DEFAULT_MAX_LINE_LEN: usize = 4096;

/// Timing and size limits for [`read_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramingPolicy {
    /// Timeout applied to each single-byte read.
    pub byte_timeout: Duration,
    /// How long the device may stay silent before the call gives up.
    /// Restarted whenever a byte arrives.
    pub line_deadline: Duration,
    /// Lines longer than this are returned unterminated.
    pub max_line_len: usize,
}

impl Default for FramingPolicy {
    fn default() -> Self {
        Self {
            byte_timeout: DEFAULT_BYTE_TIMEOUT,
            line_deadline: DEFAULT_LINE_DEADLINE,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// Read one line from the port.
///
/// Returns the collected text with surrounding whitespace (including the
/// `\r\n` terminator) trimmed. When the deadline passes without a
/// terminator the partial buffer is returned, possibly empty; this is not an
/// error. Only transport failures other than a timeout are propagated.
pub fn read_line(
    port: &mut dyn SerialPortAdapter,
    policy: &FramingPolicy,
) -> Result<String, PortError> {
    read_line_cancellable(port, policy, &AtomicBool::new(false))
}

/// [`read_line`] that also stops once `cancel` is set, returning whatever
/// was collected. The flag is checked before every byte read, so the port
/// is given up within one `byte_timeout` of the flag being raised.
pub fn read_line_cancellable(
    port: &mut dyn SerialPortAdapter,
    policy: &FramingPolicy,
    cancel: &AtomicBool,
) -> Result<String, PortError> {
    port.set_timeout(policy.byte_timeout)?;

    let mut buffer: Vec<u8> = Vec::with_capacity(64);
    let mut byte = [0u8; 1];
    let mut last_activity = Instant::now();

    while last_activity.elapsed() < policy.line_deadline {
        if cancel.load(Ordering::Acquire) {
            debug!(len = buffer.len(), "line read cancelled");
            break;
        }
        match port.read_bytes(&mut byte) {
            Ok(0) => continue,
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                buffer.push(byte[0]);
                last_activity = Instant::now();
                if buffer.len() >= policy.max_line_len {
                    debug!(len = buffer.len(), "line cap reached without terminator");
                    break;
                }
            }
            Err(e) if e.is_timeout() => {
                trace!("byte timeout on {}", port.name());
                continue;
            }
            Err(e) => return Err(e),
        }
    }

    let line = String::from_utf8_lossy(&buffer).trim().to_string();
    if !line.is_empty() {
        debug!("Device -> Bridge: {}", line);
    }
    Ok(line)
}
