//! Search-start guarantees: exactly one result line per `go`.

use crate::common::*;
use pretty_assertions::assert_eq;
use std::io;
use std::time::{Duration, Instant};
use uci_serial_bridge::port::ReadEvent;

#[tokio::test]
async fn test_genuine_result_before_budget() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to(
        "go movetime 100",
        &["info depth 1 score cp 12 pv d2d4", "bestmove d2d4 ponder d7d5"],
    );

    engine.handle("go movetime 100").await;

    assert_eq!(
        captured.lines(),
        vec!["info depth 1 score cp 12 pv d2d4", "bestmove d2d4 ponder d7d5"]
    );
}

#[tokio::test]
async fn test_fallback_when_device_is_silent() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);

    let started = Instant::now();
    engine.handle("go movetime 50").await;

    // 50 ms movetime plus the 30 ms buffer.
    assert!(started.elapsed() >= Duration::from_millis(80));
    assert_eq!(captured.lines(), vec!["bestmove e2e4"]);
    assert_eq!(device.written_lines(), vec!["go movetime 50"]);
}

#[tokio::test]
async fn test_late_result_is_suppressed() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    let mut script = vec![ReadEvent::Stall(Duration::from_millis(250))];
    script.extend(b"bestmove d2d4\n".iter().copied().map(ReadEvent::Byte));
    device.reply_script("go movetime 20", script);
    device.reply_to("isready", &["readyok"]);

    engine.handle("go movetime 20").await;
    assert_eq!(captured.lines(), vec!["bestmove e2e4"]);

    // The abandoned reader must not leak the late result into later output.
    engine.handle("isready").await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(captured.lines(), vec!["bestmove e2e4", "readyok"]);
    assert_eq!(result_lines(&captured.lines()).len(), 1);
}

#[tokio::test]
async fn test_info_lines_relayed_before_fallback() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to("go wtime 1000 btime 1000", &["info depth 1"]);

    engine.handle("go wtime 1000 btime 1000").await;

    assert_eq!(captured.lines(), vec!["info depth 1", "bestmove e2e4"]);
}

#[tokio::test]
async fn test_bare_go_gets_a_result() {
    let (mut engine, _device, captured) = engine_with_device();
    assert!(engine.start().await);

    engine.handle("go").await;

    assert_eq!(captured.lines(), vec!["bestmove e2e4"]);
}

#[tokio::test]
async fn test_fallback_without_device_is_immediate() {
    let (mut engine, captured) = engine_without_device();
    assert!(!engine.start().await);

    let started = Instant::now();
    engine.handle("go infinite").await;

    assert!(started.elapsed() < Duration::from_millis(150));
    assert_eq!(captured.lines(), vec!["bestmove e2e4"]);
}

#[tokio::test]
async fn test_write_failure_sends_fallback_and_schedules_reconnect() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.set_fail_writes(true);

    engine.handle("go movetime 1000").await;

    assert_eq!(captured.lines(), vec!["bestmove e2e4"]);
    assert!(engine.reconnect_pending());
}

#[tokio::test]
async fn test_read_failure_mid_search_sends_fallback() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    let mut script: Vec<ReadEvent> = b"info depth 3\n"
        .iter()
        .copied()
        .map(ReadEvent::Byte)
        .collect();
    script.push(ReadEvent::Fail(io::ErrorKind::BrokenPipe));
    device.reply_script("go depth 3", script);

    engine.handle("go depth 3").await;

    assert_eq!(captured.lines(), vec!["info depth 3", "bestmove e2e4"]);
    assert!(engine.reconnect_pending());
}

#[tokio::test]
async fn test_consecutive_searches_each_get_one_result() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to("go movetime 40", &["bestmove g1f3"]);

    engine.handle("go movetime 40").await;
    engine.handle("go movetime 40").await;
    engine.handle("go nodes 10").await;

    assert_eq!(
        result_lines(&captured.lines()),
        vec!["bestmove g1f3", "bestmove g1f3", "bestmove e2e4"]
    );
}
