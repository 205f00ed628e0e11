//! Line output towards the GUI.
//!
//! Every response line goes through one [`GuiWriter`]. Writes are serialized
//! and flushed line by line, since the GUI reacts to each line as it arrives
//! and the abandoned search reader may still be running on another thread.

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, error};

type Sink = Box<dyn Write + Send>;

/// Cloneable, thread-safe writer for interface lines.
#[derive(Clone)]
pub struct GuiWriter {
    sink: Arc<Mutex<Sink>>,
}

impl GuiWriter {
    /// Writer over any sink.
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    /// Writer over the process's stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Send one line to the GUI. Blank lines are dropped.
    ///
    /// A failed write is logged but not propagated: losing the GUI's stdout
    /// surfaces on the next stdin read anyway.
    pub fn send(&self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        debug!("Bridge -> GUI: {}", line);

        let mut sink = self.sink.lock();
        if let Err(e) = writeln!(sink, "{line}").and_then(|_| sink.flush()) {
            error!("failed to write to GUI: {}", e);
        }
    }
}

impl std::fmt::Debug for GuiWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuiWriter").finish_non_exhaustive()
    }
}

/// In-memory sink whose contents stay readable after being handed to a
/// [`GuiWriter`].
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, split into lines.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buffer.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Number of lines equal to `line`.
    pub fn count(&self, line: &str) -> usize {
        self.lines().iter().filter(|l| l.as_str() == line).count()
    }

    /// Number of lines starting with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
