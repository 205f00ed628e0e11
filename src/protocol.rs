//! UCI protocol vocabulary as far as the bridge needs it.
//!
//! The bridge is not a chess engine. It only looks at a command far enough
//! to decide which handler owns it and to pull the time parameters out of a
//! `go` line.

use std::time::Duration;

/// Handshake-complete marker.
pub const UCI_OK: &str = "uciok";
/// Readiness marker.
pub const READY_OK: &str = "readyok";
/// Move-result prefix.
pub const BEST_MOVE: &str = "bestmove";
/// Prefix of identity lines, which the bridge synthesizes itself.
pub const ID_PREFIX: &str = "id ";

/// Option declarations sent after the identity lines.
pub const ENGINE_OPTIONS: [&str; 2] = [
    "option name Skill Level type spin default 10 min 1 max 20",
    "option name Move Overhead type spin default 100 min 0 max 1000",
];

/// Commands that are forwarded without waiting for any answer.
const FIRE_AND_FORGET: [&str; 3] = ["position", "ucinewgame", "setoption"];

/// A command from the GUI, classified into the handler that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `uci`
    Uci,
    /// `isready`
    IsReady,
    /// `quit`
    Quit,
    /// `go ...`: the original line plus its parsed time parameters.
    Go { line: String, params: GoParams },
    /// Anything else, forwarded verbatim.
    Other { line: String, fire_and_forget: bool },
}

impl Command {
    /// Classify one line from the GUI.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "uci" => Self::Uci,
            "isready" => Self::IsReady,
            "quit" => Self::Quit,
            _ if line == "go" || line.starts_with("go ") => Self::Go {
                line: line.to_string(),
                params: GoParams::parse(line),
            },
            _ => Self::Other {
                line: line.to_string(),
                fire_and_forget: FIRE_AND_FORGET.iter().any(|p| line.starts_with(p)),
            },
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Uci => "handshake",
            Self::IsReady => "readiness",
            Self::Quit => "terminate",
            Self::Go { .. } => "search",
            Self::Other {
                fire_and_forget: true,
                ..
            } => "fire-and-forget",
            Self::Other { .. } => "other",
        }
    }
}

/// Time parameters of a `go` command, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoParams {
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
}

impl GoParams {
    /// Pull the numeric time parameters out of a `go` line.
    ///
    /// Unknown tokens are skipped; unparsable values are treated as absent.
    pub fn parse(line: &str) -> Self {
        let mut params = Self::default();
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            let slot = match token {
                "movetime" => &mut params.movetime,
                "wtime" => &mut params.wtime,
                "btime" => &mut params.btime,
                _ => continue,
            };
            // A negative clock (flagged side) parses as absent.
            *slot = tokens.next().and_then(|v| v.parse().ok());
        }
        params
    }
}

/// How long a `go` command may wait for a move before the fallback is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    /// Added to the movetime or clock share.
    pub buffer: Duration,
    /// Used when the command carries no time information.
    pub default_budget: Duration,
    /// Lower bound of the clock share.
    pub min_clock_share: Duration,
    /// Upper bound of the clock share.
    pub max_clock_share: Duration,
    /// Hard ceiling on any budget.
    pub max_budget: Duration,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            buffer: Duration::from_millis(2000),
            default_budget: Duration::from_millis(30_000),
            min_clock_share: Duration::from_millis(1000),
            max_clock_share: Duration::from_millis(30_000),
            max_budget: Duration::from_millis(600_000),
        }
    }
}

impl SearchBudget {
    /// Compute the Timeout Budget for a search.
    ///
    /// An explicit movetime wins; otherwise a tenth of the remaining clock
    /// (white's, else black's) is used, clamped to the share bounds. The
    /// result always lies in `1ms..=max_budget`.
    pub fn timeout_for(&self, params: &GoParams) -> Duration {
        let budget = if let Some(movetime) = params.movetime {
            Duration::from_millis(movetime).saturating_add(self.buffer)
        } else if let Some(clock) = params.wtime.or(params.btime) {
            let share = Duration::from_millis(clock / 10)
                .clamp(self.min_clock_share, self.max_clock_share.max(self.min_clock_share));
            share.saturating_add(self.buffer)
        } else {
            self.default_budget
        };
        budget.clamp(Duration::from_millis(1), self.max_budget.max(Duration::from_millis(1)))
    }
}

/// A line received from the device, classified by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceLine<'a> {
    Empty,
    HandshakeComplete,
    Ready,
    Identity(&'a str),
    BestMove(&'a str),
    Other(&'a str),
}

impl<'a> DeviceLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        if line.is_empty() {
            Self::Empty
        } else if line == UCI_OK {
            Self::HandshakeComplete
        } else if line == READY_OK {
            Self::Ready
        } else if line.starts_with(ID_PREFIX) {
            Self::Identity(line)
        } else if line.starts_with(BEST_MOVE) {
            Self::BestMove(line)
        } else {
            Self::Other(line)
        }
    }
}

/// `bestmove <mv>` line.
pub fn best_move_line(mv: &str) -> String {
    format!("{BEST_MOVE} {mv}")
}
