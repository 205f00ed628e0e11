//! Session state and the device connection lifecycle.
//!
//! A [`Session`] is created once at startup and owns the only
//! [`DeviceLink`]. The link is optional: when the device cannot be reached
//! the session stays usable in the disconnected state and every handler
//! falls back to synthesized responses.

use crate::link::{Connector, DeviceLink};
use crate::port::FramingPolicy;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Name and author the bridge reports in its `id` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineIdentity {
    pub name: String,
    pub author: String,
}

impl Default for EngineIdentity {
    fn default() -> Self {
        Self {
            name: "PicoChess".to_string(),
            author: "arnisz".to_string(),
        }
    }
}

/// Bounded retry policy for opening the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up; at least one is always made.
    pub max_attempts: u32,
    /// Pause after a failed attempt.
    pub backoff: Duration,
    /// Pause after a successful open so the device can boot.
    pub warmup: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(200),
            warmup: Duration::from_millis(100),
        }
    }
}

/// The bridge's long-lived mutable context.
pub struct Session {
    connector: Box<dyn Connector>,
    framing: FramingPolicy,
    retry: RetryPolicy,
    identity: EngineIdentity,
    ready: bool,
    link: Option<DeviceLink>,
}

impl Session {
    /// A disconnected session. Call [`acquire`](Self::acquire) to connect.
    pub fn new(connector: Box<dyn Connector>, identity: EngineIdentity) -> Self {
        Self {
            connector,
            framing: FramingPolicy::default(),
            retry: RetryPolicy::default(),
            identity,
            ready: false,
            link: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_framing(mut self, framing: FramingPolicy) -> Self {
        self.framing = framing;
        self
    }

    pub fn identity(&self) -> &EngineIdentity {
        &self.identity
    }

    pub fn endpoint(&self) -> String {
        self.connector.endpoint()
    }

    pub fn link(&self) -> Option<&DeviceLink> {
        self.link.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Open the device link, retrying per the policy.
    ///
    /// Returns whether the session is connected afterwards. Failure is
    /// logged, never raised: the bridge keeps serving the GUI without a
    /// device.
    pub async fn acquire(&mut self) -> bool {
        if self.link.is_some() {
            return true;
        }

        let endpoint = self.connector.endpoint();
        let attempts = self.retry.max_attempts.max(1);
        info!("connecting to device at {}", endpoint);

        let mut last_error = None;
        for attempt in 1..=attempts {
            debug!("connection attempt {}/{}", attempt, attempts);
            match self.connector.open() {
                Ok(port) => {
                    self.link = Some(DeviceLink::new(port, self.framing));
                    tokio::time::sleep(self.retry.warmup).await;
                    info!("connected to {}", endpoint);
                    return true;
                }
                Err(e) => {
                    debug!("attempt {} failed: {}", attempt, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                }
            }
        }

        if let Some(e) = last_error {
            error!(
                "failed to connect to {} after {} attempts: {}",
                endpoint, attempts, e
            );
        }
        warn!("continuing without device, using fallback responses");
        false
    }

    /// Close the device link if one is open. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(link) = self.link.take() {
            info!("closing device link {}", link.name());
        }
    }

    /// Drop the current link and try to open a fresh one.
    pub async fn reconnect(&mut self) -> bool {
        info!("reconnecting to device");
        self.release();
        self.acquire().await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.connector.endpoint())
            .field("identity", &self.identity)
            .field("ready", &self.ready)
            .field("link", &self.link)
            .finish()
    }
}
