//! Shared test utilities for the bridge integration tests.
//!
//! This module provides common test infrastructure including:
//! - Relay engines wired to a scripted mock device
//! - Millisecond timings so full command loops run quickly
//! - Connectors that fail a set number of times before succeeding

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uci_serial_bridge::engine::{RelayEngine, Timings};
use uci_serial_bridge::link::{FnConnector, PortAdapter};
use uci_serial_bridge::output::{CapturedOutput, GuiWriter};
use uci_serial_bridge::port::{FramingPolicy, MockPortHandle, MockSerialPort, PortError};
use uci_serial_bridge::protocol::SearchBudget;
use uci_serial_bridge::session::{EngineIdentity, RetryPolicy, Session};

pub const MOCK_PORT: &str = "MOCK0";

/// Handler timings scaled down to milliseconds.
pub fn fast_timings() -> Timings {
    Timings {
        handshake_deadline: Duration::from_millis(200),
        handshake_settle: Duration::from_millis(1),
        ready_deadline: Duration::from_millis(150),
        ready_settle: Duration::from_millis(1),
        quit_grace: Duration::from_millis(1),
        forward_settle: Duration::from_millis(1),
        reply_deadline: Duration::from_millis(80),
        poll_interval: Duration::from_millis(1),
        search_poll: Duration::from_millis(1),
    }
}

pub fn fast_framing() -> FramingPolicy {
    FramingPolicy {
        byte_timeout: Duration::from_millis(2),
        line_deadline: Duration::from_millis(40),
        ..FramingPolicy::default()
    }
}

pub fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff: Duration::from_millis(1),
        warmup: Duration::from_millis(1),
    }
}

/// Budget with a 30 ms buffer and a 200 ms default.
pub fn short_budget() -> SearchBudget {
    SearchBudget {
        buffer: Duration::from_millis(30),
        default_budget: Duration::from_millis(200),
        min_clock_share: Duration::from_millis(10),
        max_clock_share: Duration::from_millis(300),
        max_budget: Duration::from_secs(5),
    }
}

fn build_engine<F>(connector: FnConnector<F>) -> (RelayEngine, CapturedOutput)
where
    F: Fn() -> Result<PortAdapter, PortError> + Send + Sync + 'static,
{
    let session = Session::new(Box::new(connector), EngineIdentity::default())
        .with_framing(fast_framing())
        .with_retry(quick_retry());
    let captured = CapturedOutput::new();
    let engine = RelayEngine::new(session, GuiWriter::new(captured.clone()))
        .with_timings(fast_timings())
        .with_budget(short_budget());
    (engine, captured)
}

/// An engine whose connector always opens the returned mock device.
pub fn engine_with_device() -> (RelayEngine, MockPortHandle, CapturedOutput) {
    let device = MockSerialPort::new(MOCK_PORT).handle();
    let opener = device.clone();
    let (engine, captured) = build_engine(FnConnector::new(MOCK_PORT, move || {
        Ok(Box::new(opener.reopen(MOCK_PORT)) as PortAdapter)
    }));
    (engine, device, captured)
}

/// An engine whose connector never finds a device.
pub fn engine_without_device() -> (RelayEngine, CapturedOutput) {
    build_engine(FnConnector::new("nowhere", || {
        Err(PortError::not_found("nowhere"))
    }))
}

/// An engine whose connector fails `failures` times, then opens the device.
/// The returned counter reports how many opens were attempted.
pub fn engine_with_flaky_device(
    failures: usize,
) -> (RelayEngine, MockPortHandle, CapturedOutput, Arc<AtomicUsize>) {
    let device = MockSerialPort::new(MOCK_PORT).handle();
    let opener = device.clone();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let (engine, captured) = build_engine(FnConnector::new(MOCK_PORT, move || {
        let attempt = counter.fetch_add(1, Ordering::SeqCst);
        if attempt < failures {
            Err(PortError::not_found(MOCK_PORT))
        } else {
            Ok(Box::new(opener.reopen(MOCK_PORT)) as PortAdapter)
        }
    }));
    (engine, device, captured, attempts)
}

/// Lines starting with `bestmove`.
pub fn result_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|l| l.starts_with("bestmove"))
        .cloned()
        .collect()
}
