//! Device link: the bridge's single handle on the serial peer.
//!
//! The transport is blocking, so each operation runs on Tokio's blocking
//! pool with the adapter behind a mutex. Clones share the same port; the
//! port closes when the last clone is dropped.

use crate::port::{
    read_line, read_line_cancellable, FramingPolicy, PortConfiguration, PortError,
    SerialPortAdapter, SyncSerialPort,
};
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Boxed transport held by a link.
pub type PortAdapter = Box<dyn SerialPortAdapter>;

/// Opens the transport behind a [`DeviceLink`].
#[cfg_attr(test, mockall::automock)]
pub trait Connector: Send + Sync {
    /// Open a fresh transport to the device.
    fn open(&self) -> Result<PortAdapter, PortError>;

    /// Human-readable endpoint, for logs.
    fn endpoint(&self) -> String;
}

/// Connector for a real serial port.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    pub port_name: String,
    pub config: PortConfiguration,
}

impl SerialConnector {
    pub fn new(port_name: impl Into<String>, config: PortConfiguration) -> Self {
        Self {
            port_name: port_name.into(),
            config,
        }
    }
}

impl Connector for SerialConnector {
    fn open(&self) -> Result<PortAdapter, PortError> {
        let port = SyncSerialPort::open(&self.port_name, self.config)?;
        Ok(Box::new(port))
    }

    fn endpoint(&self) -> String {
        format!("{} @ {} baud", self.port_name, self.config.baud_rate)
    }
}

/// Connector backed by a closure, handy for tests and embedding.
pub struct FnConnector<F> {
    open: F,
    endpoint: String,
}

impl<F> FnConnector<F>
where
    F: Fn() -> Result<PortAdapter, PortError> + Send + Sync,
{
    pub fn new(endpoint: impl Into<String>, open: F) -> Self {
        Self {
            open,
            endpoint: endpoint.into(),
        }
    }
}

impl<F> Connector for FnConnector<F>
where
    F: Fn() -> Result<PortAdapter, PortError> + Send + Sync,
{
    fn open(&self) -> Result<PortAdapter, PortError> {
        (self.open)()
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

/// Shared, line-oriented handle on an open transport.
#[derive(Clone)]
pub struct DeviceLink {
    port: Arc<Mutex<PortAdapter>>,
    name: String,
    framing: FramingPolicy,
}

impl DeviceLink {
    pub fn new(port: PortAdapter, framing: FramingPolicy) -> Self {
        let name = port.name().to_string();
        Self {
            port: Arc::new(Mutex::new(port)),
            name,
            framing,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send one command line, newline-terminated. Blank input is a no-op.
    pub async fn write_line(&self, line: &str) -> Result<(), PortError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        debug!("Bridge -> Device: {}", line);

        let payload = format!("{line}\n").into_bytes();
        let port = Arc::clone(&self.port);
        tokio::task::spawn_blocking(move || port.lock().write_all_bytes(&payload))
            .await
            .map_err(|e| PortError::Io(std::io::Error::other(e)))?
    }

    /// Read one framed line; empty when the device stayed silent.
    pub async fn read_line(&self) -> Result<String, PortError> {
        self.read_line_with(self.framing, None).await
    }

    /// Like [`read_line`](Self::read_line), but give up on silence at `deadline`.
    pub async fn read_line_until(&self, deadline: Instant) -> Result<String, PortError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let policy = FramingPolicy {
            line_deadline: remaining.min(self.framing.line_deadline),
            ..self.framing
        };
        self.read_line_with(policy, None).await
    }

    /// Like [`read_line`](Self::read_line), but release the port as soon as
    /// `cancel` is raised, even while bytes keep arriving.
    pub async fn read_line_cancellable(
        &self,
        cancel: Arc<AtomicBool>,
    ) -> Result<String, PortError> {
        self.read_line_with(self.framing, Some(cancel)).await
    }

    async fn read_line_with(
        &self,
        policy: FramingPolicy,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<String, PortError> {
        let port = Arc::clone(&self.port);
        tokio::task::spawn_blocking(move || {
            let mut port = port.lock();
            match cancel {
                Some(flag) => read_line_cancellable(&mut **port, &policy, &flag),
                None => read_line(&mut **port, &policy),
            }
        })
        .await
        .map_err(|e| PortError::Io(std::io::Error::other(e)))?
    }
}

impl std::fmt::Debug for DeviceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLink")
            .field("name", &self.name)
            .field("framing", &self.framing)
            .finish()
    }
}
