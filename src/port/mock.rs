//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates a device on the far end of the
//! serial link without requiring hardware. The port itself is handed to the
//! bridge; the test keeps a [`MockPortHandle`] to script what the device
//! sends and to inspect what the bridge wrote.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// One scripted step of the device's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A byte arrives.
    Byte(u8),
    /// The device stays silent for this long. Like a real port, a read
    /// waits at most the configured timeout and reports a timeout; the rest
    /// of the silence carries over to the following reads.
    Stall(Duration),
    /// The device vanishes partway through a read: the read blocks for this
    /// long, then fails with `BrokenPipe`.
    Disconnect(Duration),
    /// The read fails with an I/O error of this kind.
    Fail(io::ErrorKind),
}

/// Inner state of the mock port, shared between the port and its handles.
#[derive(Debug, Default)]
struct MockPortState {
    /// Events returned by read operations, in order.
    read_queue: VecDeque<ReadEvent>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Scripted replies, queued whenever the matching command line is written.
    replies: Vec<(String, Vec<ReadEvent>)>,
    /// Whether writes should fail as if the cable were pulled.
    fail_writes: bool,
    /// Timeout last configured through `set_timeout`.
    timeout: Duration,
    /// Whether the port has been dropped (closed) by its owner.
    closed: bool,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use uci_serial_bridge::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// let device = port.handle();
/// device.reply_to("isready", &["readyok"]);
///
/// port.write_bytes(b"isready\n").unwrap();
/// assert_eq!(device.written_lines(), vec!["isready".to_string()]);
/// assert_eq!(device.available_bytes(), "readyok\n".len());
/// ```
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, shared with every handle.
    state: Arc<Mutex<MockPortState>>,
}

/// Test-side view of a [`MockSerialPort`] that outlives the port itself.
#[derive(Debug, Clone)]
pub struct MockPortHandle {
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_millis(100),
                ..Default::default()
            })),
        }
    }

    /// A handle for scripting and inspecting this port.
    pub fn handle(&self) -> MockPortHandle {
        MockPortHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl MockPortHandle {
    /// Open a fresh port onto the same simulated device, as a reconnect would.
    pub fn reopen(&self, name: impl Into<String>) -> MockSerialPort {
        self.state.lock().closed = false;
        MockSerialPort {
            name: name.into(),
            state: Arc::clone(&self.state),
        }
    }

    /// Queue raw bytes to be returned by subsequent reads.
    pub fn enqueue_read(&self, data: &[u8]) {
        let mut state = self.state.lock();
        state.read_queue.extend(data.iter().copied().map(ReadEvent::Byte));
    }

    /// Queue a newline-terminated line.
    pub fn enqueue_line(&self, line: &str) {
        self.enqueue_read(format!("{line}\n").as_bytes());
    }

    /// Queue a period of silence.
    pub fn enqueue_stall(&self, duration: Duration) {
        self.state.lock().read_queue.push_back(ReadEvent::Stall(duration));
    }

    /// Queue a read failure.
    pub fn enqueue_error(&self, kind: io::ErrorKind) {
        self.state.lock().read_queue.push_back(ReadEvent::Fail(kind));
    }

    /// Whenever `command` is written, queue `lines` as the device's answer.
    pub fn reply_to(&self, command: &str, lines: &[&str]) {
        let events = lines
            .iter()
            .flat_map(|line| format!("{line}\n").into_bytes())
            .map(ReadEvent::Byte)
            .collect();
        self.reply_script(command, events);
    }

    /// Whenever `command` is written, queue `events` as the device's answer.
    pub fn reply_script(&self, command: &str, events: Vec<ReadEvent>) {
        self.state.lock().replies.push((command.to_string(), events));
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Written data split into trimmed, non-empty lines.
    pub fn written_lines(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .write_log
            .iter()
            .flat_map(|chunk| {
                String::from_utf8_lossy(chunk)
                    .lines()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Get the timeout last configured on the port.
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }

    /// Whether the owning side has dropped (closed) the port.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Get the number of scripted bytes still waiting to be read.
    pub fn available_bytes(&self) -> usize {
        self.state
            .lock()
            .read_queue
            .iter()
            .filter(|e| matches!(e, ReadEvent::Byte(_)))
            .count()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.fail_writes {
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock device disconnected",
            )));
        }

        state.write_log.push(data.to_vec());

        let text = String::from_utf8_lossy(data).into_owned();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let queued: Vec<ReadEvent> = state
                .replies
                .iter()
                .filter(|(command, _)| command == line)
                .flat_map(|(_, events)| events.iter().cloned())
                .collect();
            state.read_queue.extend(queued);
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        if buffer.is_empty() {
            return Ok(0);
        }

        let (wait, kind) = {
            let mut state = self.state.lock();
            match state.read_queue.pop_front() {
                Some(ReadEvent::Byte(first)) => {
                    buffer[0] = first;
                    let mut n = 1;
                    while n < buffer.len() {
                        match state.read_queue.front() {
                            Some(ReadEvent::Byte(b)) => {
                                buffer[n] = *b;
                                state.read_queue.pop_front();
                                n += 1;
                            }
                            _ => break,
                        }
                    }
                    return Ok(n);
                }
                Some(ReadEvent::Fail(kind)) => {
                    return Err(PortError::Io(io::Error::new(kind, "mock read failure")));
                }
                Some(ReadEvent::Stall(duration)) => {
                    let wait = duration.min(state.timeout);
                    if duration > wait {
                        state.read_queue.push_front(ReadEvent::Stall(duration - wait));
                    }
                    (wait, io::ErrorKind::TimedOut)
                }
                Some(ReadEvent::Disconnect(after)) => (after, io::ErrorKind::BrokenPipe),
                None => (state.timeout, io::ErrorKind::TimedOut),
            }
        };

        // Sleep outside the lock so the test side can keep scripting.
        std::thread::sleep(wait);
        let message = match kind {
            io::ErrorKind::TimedOut => "Operation timed out",
            _ => "mock device disconnected",
        };
        Err(PortError::Io(io::Error::new(kind, message)))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }
}

impl Drop for MockSerialPort {
    fn drop(&mut self) {
        self.state.lock().closed = true;
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .finish()
    }
}
