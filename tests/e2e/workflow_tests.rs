//! Complete GUI sessions through the command loop.

use crate::common::*;
use pretty_assertions::assert_eq;
use uci_serial_bridge::protocol::ENGINE_OPTIONS;
use uci_serial_bridge::stdio::run_stdio_interface;

fn handshake() -> Vec<String> {
    let mut lines = vec!["id name PicoChess".to_string(), "id author arnisz".to_string()];
    lines.extend(ENGINE_OPTIONS.iter().map(|o| o.to_string()));
    lines.push("uciok".to_string());
    lines
}

#[tokio::test]
async fn test_full_game_session() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to("uci", &["uciok"]);
    device.reply_to("isready", &["readyok"]);
    device.reply_to(
        "go wtime 60000 btime 60000",
        &["info depth 5 score cp 30", "bestmove e7e5"],
    );

    let input: &[u8] = b"uci\n\
        setoption name Skill Level value 5\n\
        isready\n\
        ucinewgame\n\
        position startpos moves e2e4\n\
        go wtime 60000 btime 60000\n\
        quit\n";
    run_stdio_interface(&mut engine, input).await.unwrap();

    let mut expected = handshake();
    expected.push("readyok".to_string());
    expected.push("info depth 5 score cp 30".to_string());
    expected.push("bestmove e7e5".to_string());
    assert_eq!(captured.lines(), expected);

    assert_eq!(
        device.written_lines(),
        vec![
            "uci",
            "setoption name Skill Level value 5",
            "isready",
            "ucinewgame",
            "position startpos moves e2e4",
            "go wtime 60000 btime 60000",
            "quit",
        ]
    );
    assert!(!engine.session().is_connected());
}

#[tokio::test]
async fn test_session_without_device() {
    let (mut engine, captured) = engine_without_device();
    assert!(!engine.start().await);

    let input: &[u8] = b"uci\nisready\nposition startpos\ngo movetime 10\nquit\n";
    run_stdio_interface(&mut engine, input).await.unwrap();

    let mut expected = handshake();
    expected.push("readyok".to_string());
    expected.push("bestmove e2e4".to_string());
    assert_eq!(captured.lines(), expected);
}

#[tokio::test]
async fn test_other_command_forwards_at_most_one_reply() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to("d", &["Fen: startpos", "Key: 0"]);

    let input: &[u8] = b"d\n";
    run_stdio_interface(&mut engine, input).await.unwrap();

    assert_eq!(captured.lines(), vec!["Fen: startpos"]);
}

#[tokio::test]
async fn test_fire_and_forget_commands_stay_silent() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);
    device.reply_to("ucinewgame", &["info string cleared"]);

    let input: &[u8] = b"ucinewgame\nposition startpos\n";
    run_stdio_interface(&mut engine, input).await.unwrap();

    assert!(captured.lines().is_empty());
    assert_eq!(device.written_lines(), vec!["ucinewgame", "position startpos"]);
}

#[tokio::test]
async fn test_blank_lines_are_ignored() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);

    let input: &[u8] = b"\n   \n\nquit\n";
    run_stdio_interface(&mut engine, input).await.unwrap();

    assert!(captured.lines().is_empty());
    assert_eq!(device.written_lines(), vec!["quit"]);
}

#[tokio::test]
async fn test_commands_after_quit_are_not_processed() {
    let (mut engine, device, captured) = engine_with_device();
    assert!(engine.start().await);

    let input: &[u8] = b"quit\nuci\n";
    run_stdio_interface(&mut engine, input).await.unwrap();

    assert!(captured.lines().is_empty());
    assert_eq!(device.written_lines(), vec!["quit"]);
    assert!(device.is_closed());
}
