//! Handshake and readiness guarantees.

use crate::common::*;
use pretty_assertions::assert_eq;
use std::time::Duration;
use uci_serial_bridge::engine::Flow;
use uci_serial_bridge::port::ReadEvent;

fn assert_single_handshake(lines: &[String]) {
    let count = |needle: &str| lines.iter().filter(|l| l.as_str() == needle).count();
    assert_eq!(count("uciok"), 1, "output: {lines:?}");
    assert_eq!(count("id name PicoChess"), 1, "output: {lines:?}");
    assert_eq!(count("id author arnisz"), 1, "output: {lines:?}");

    let uciok = lines.iter().position(|l| l == "uciok").unwrap();
    let name = lines.iter().position(|l| l == "id name PicoChess").unwrap();
    let author = lines.iter().position(|l| l == "id author arnisz").unwrap();
    assert!(name < uciok && author < uciok);
}

#[tokio::test]
async fn test_handshake_with_responsive_device() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to(
        "uci",
        &[
            "id name Firmware 0.3",
            "id author pico",
            "option name Threads type spin default 1 min 1 max 2",
            "uciok",
        ],
    );

    assert_eq!(engine.handle("uci").await, Flow::Continue);

    let lines = captured.lines();
    assert_single_handshake(&lines);
    assert!(lines.contains(&"option name Threads type spin default 1 min 1 max 2".to_string()));
    assert!(!lines.iter().any(|l| l.contains("Firmware")));
    assert!(engine.session().is_ready());
}

#[tokio::test]
async fn test_handshake_without_device() {
    let (mut engine, captured) = engine_without_device();
    assert!(!engine.start().await);

    engine.handle("uci").await;

    assert_single_handshake(&captured.lines());
    assert_eq!(captured.lines().len(), 5);
}

#[tokio::test]
async fn test_handshake_with_silent_device() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);

    engine.handle("uci").await;

    assert_single_handshake(&captured.lines());
    assert_eq!(device.written_lines(), vec!["uci"]);
}

#[tokio::test]
async fn test_handshake_with_device_uciok_only() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to("uci", &["uciok"]);

    engine.handle("uci").await;

    assert_single_handshake(&captured.lines());
}

#[tokio::test]
async fn test_readiness_drops_stray_output() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to(
        "isready",
        &["info string leftover", "bestmove a2a3", "readyok"],
    );

    engine.handle("isready").await;

    assert_eq!(captured.lines(), vec!["readyok"]);
}

#[tokio::test]
async fn test_readiness_single_marker_when_device_repeats_it() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to("isready", &["readyok", "readyok"]);

    engine.handle("isready").await;
    engine.handle("isready").await;

    assert_eq!(captured.count("readyok"), 2);
    assert_eq!(captured.lines().len(), 2);
}

#[tokio::test]
async fn test_readiness_with_slow_trickle() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    let events = b"readyok\n"
        .iter()
        .flat_map(|b| [ReadEvent::Stall(Duration::from_millis(1)), ReadEvent::Byte(*b)])
        .collect();
    device.reply_script("isready", events);

    engine.handle("isready").await;

    assert_eq!(captured.lines(), vec!["readyok"]);
}

#[tokio::test]
async fn test_readiness_without_device() {
    let (mut engine, captured) = engine_without_device();
    assert!(!engine.start().await);

    engine.handle("isready").await;

    assert_eq!(captured.lines(), vec!["readyok"]);
}
