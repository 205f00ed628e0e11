//! Line-oriented GUI interface.
//!
//! Reads UCI commands one line at a time and hands each to the relay engine.
//! The loop ends on `quit`, on end of input, or when the channel fails; the
//! device link is released on every path. Input need not be UTF-8: invalid
//! bytes are replaced rather than treated as a channel failure.

use crate::engine::{Flow, RelayEngine};
use crate::error::{BridgeError, BridgeResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Runs the relay against the process's standard input.
pub async fn run_stdin(engine: &mut RelayEngine) -> BridgeResult<()> {
    run_stdio_interface(engine, BufReader::new(tokio::io::stdin())).await
}

/// Processes commands from `reader` until `quit` or end of input.
pub async fn run_stdio_interface<R>(engine: &mut RelayEngine, mut reader: R) -> BridgeResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(256);

    let result = loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                info!("command channel closed");
                break Ok(());
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                if engine.handle(&line).await == Flow::Quit {
                    info!("quit received, shutting down");
                    break Ok(());
                }
            }
            Err(e) => {
                error!("failed to read command: {}", e);
                break Err(BridgeError::Interface(e));
            }
        }
    };

    engine.shutdown();
    result
}
