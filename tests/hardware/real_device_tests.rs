//! Tests against a real engine device.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=COM15                 # or /dev/ttyACM0 on Linux
//! export TEST_BAUD=115200                # optional, default: 115200
//!
//! cargo test -- --ignored
//! ```

use std::env;
use std::time::Duration;
use uci_serial_bridge::engine::RelayEngine;
use uci_serial_bridge::link::SerialConnector;
use uci_serial_bridge::output::{CapturedOutput, GuiWriter};
use uci_serial_bridge::port::{
    read_line, FramingPolicy, PortConfiguration, SerialPortAdapter, SyncSerialPort,
};
use uci_serial_bridge::session::{EngineIdentity, Session};

/// Test port configuration from environment.
struct TestPortConfig {
    port_name: String,
    baud_rate: u32,
}

impl TestPortConfig {
    fn from_env() -> Option<Self> {
        let Some(port_name) = env::var("TEST_PORT").ok() else {
            println!("Skipping hardware test: TEST_PORT not set");
            return None;
        };
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(115_200);
        Some(Self {
            port_name,
            baud_rate,
        })
    }

    fn port_config(&self) -> PortConfiguration {
        PortConfiguration::with_baud(self.baud_rate, Duration::from_secs(3))
    }
}

#[test]
#[ignore] // Run with --ignored flag
fn test_device_answers_isready() {
    let Some(cfg) = TestPortConfig::from_env() else {
        return;
    };

    let mut port = SyncSerialPort::open(&cfg.port_name, cfg.port_config()).expect("open port");
    port.write_all_bytes(b"isready\n").expect("write isready");

    let policy = FramingPolicy::default();
    let mut seen = Vec::new();
    for _ in 0..5 {
        let line = read_line(&mut port, &policy).expect("read line");
        if line == "readyok" {
            return;
        }
        seen.push(line);
    }
    panic!("device never answered readyok, saw: {seen:?}");
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_relay_session_against_device() {
    let Some(cfg) = TestPortConfig::from_env() else {
        return;
    };

    let connector = SerialConnector::new(cfg.port_name.clone(), cfg.port_config());
    let session = Session::new(Box::new(connector), EngineIdentity::default());
    let captured = CapturedOutput::new();
    let mut engine = RelayEngine::new(session, GuiWriter::new(captured.clone()));

    assert!(engine.start().await, "could not connect to {}", cfg.port_name);

    engine.handle("uci").await;
    engine.handle("isready").await;
    engine.handle("position startpos").await;
    engine.handle("go movetime 1000").await;
    engine.handle("quit").await;

    assert_eq!(captured.count("uciok"), 1);
    assert_eq!(captured.count("readyok"), 1);
    assert_eq!(captured.count_prefix("bestmove"), 1);
}
