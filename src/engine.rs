//! Relay engine: per-command protocol handlers.
//!
//! Each GUI command is classified once and handled to completion before the
//! next one is read. Every command for which UCI requires an answer gets one
//! here, whether or not the device is connected or answers in time:
//!
//! ```text
//! uci      -> forward, relay device output, then always id/option/uciok
//! isready  -> forward, wait for readyok (stale output dropped), always readyok
//! go ...   -> forward, race the device's bestmove against the Timeout Budget
//! quit     -> best-effort forward, stop the loop
//! other    -> forward; wait briefly for one reply unless fire-and-forget
//! ```

use crate::link::DeviceLink;
use crate::output::GuiWriter;
use crate::port::PortError;
use crate::protocol::{
    best_move_line, Command, DeviceLine, GoParams, SearchBudget, ENGINE_OPTIONS, READY_OK,
    UCI_OK,
};
use crate::session::Session;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Fallback move sent when the device produces no result.
pub const DEFAULT_FALLBACK_MOVE: &str = "e2e4";

/// Delays and deadlines used by the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long `uci` waits for the device's `uciok`.
    pub handshake_deadline: Duration,
    /// Pause after answering `uci`.
    pub handshake_settle: Duration,
    /// How long `isready` waits for the device's `readyok`.
    pub ready_deadline: Duration,
    /// Pause before and after `isready`.
    pub ready_settle: Duration,
    /// Pause after forwarding `quit`.
    pub quit_grace: Duration,
    /// Pause around forwarded commands.
    pub forward_settle: Duration,
    /// How long a forwarded command waits for a reply.
    pub reply_deadline: Duration,
    /// Pause between reads in the handshake, readiness and reply loops.
    pub poll_interval: Duration,
    /// Pause between reads while a search is running.
    pub search_poll: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            handshake_deadline: Duration::from_secs(3),
            handshake_settle: Duration::from_millis(200),
            ready_deadline: Duration::from_secs(2),
            ready_settle: Duration::from_millis(100),
            quit_grace: Duration::from_millis(100),
            forward_settle: Duration::from_millis(50),
            reply_deadline: Duration::from_millis(500),
            poll_interval: Duration::from_millis(50),
            search_poll: Duration::from_millis(10),
        }
    }
}

/// What the command loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Classifies GUI commands and runs the matching device protocol.
#[derive(Debug)]
pub struct RelayEngine {
    session: Session,
    gui: GuiWriter,
    timings: Timings,
    budget: SearchBudget,
    fallback_move: String,
    needs_reconnect: bool,
    abandoned: Option<AbandonedSearch>,
}

impl RelayEngine {
    pub fn new(session: Session, gui: GuiWriter) -> Self {
        Self {
            session,
            gui,
            timings: Timings::default(),
            budget: SearchBudget::default(),
            fallback_move: DEFAULT_FALLBACK_MOVE.to_string(),
            needs_reconnect: false,
            abandoned: None,
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_fallback_move(mut self, mv: impl Into<String>) -> Self {
        self.fallback_move = mv.into();
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Whether a transport failure has scheduled a reconnect.
    pub fn reconnect_pending(&self) -> bool {
        self.needs_reconnect
            || self
                .abandoned
                .as_ref()
                .is_some_and(|search| search.guard.has_failure())
    }

    /// Connect to the device; failure leaves the engine in fallback mode.
    pub async fn start(&mut self) -> bool {
        self.session.acquire().await
    }

    /// Release the device link. Idempotent.
    pub fn shutdown(&mut self) {
        self.abandoned = None;
        self.session.release();
    }

    /// Handle one line from the GUI.
    pub async fn handle(&mut self, line: &str) -> Flow {
        let command = Command::parse(line);
        debug!("GUI -> Bridge: {} ({})", line.trim(), command.kind());

        self.collect_abandoned_search().await;
        if self.needs_reconnect && command != Command::Quit {
            self.needs_reconnect = false;
            if !self.session.reconnect().await {
                debug!("reconnection failed, staying in fallback mode");
            }
        }

        match command {
            Command::Uci => self.handle_uci().await,
            Command::IsReady => self.handle_isready().await,
            Command::Quit => return self.handle_quit().await,
            Command::Go { line, params } => self.handle_go(&line, &params).await,
            Command::Other {
                line,
                fire_and_forget,
            } => self.handle_other(&line, fire_and_forget).await,
        }
        Flow::Continue
    }

    async fn handle_uci(&mut self) {
        info!("handshake start");

        match self.send_to_device("uci").await {
            Err(e) => debug!("failed to send uci to device: {}", e),
            Ok(()) => {
                let deadline = Instant::now() + self.timings.handshake_deadline;
                let mut complete = false;

                while !complete && Instant::now() < deadline {
                    let response = match self.read_from_device(deadline).await {
                        Ok(response) => response,
                        Err(e) => {
                            debug!("handshake read error: {}", e);
                            break;
                        }
                    };

                    match DeviceLine::classify(&response) {
                        DeviceLine::Empty => {}
                        DeviceLine::HandshakeComplete => complete = true,
                        DeviceLine::Identity(id) => debug!("replacing device identity: {}", id),
                        _ => self.gui.send(&response),
                    }

                    if !complete {
                        sleep(self.timings.poll_interval).await;
                    }
                }

                if !complete {
                    debug!("device handshake incomplete, answering anyway");
                }
            }
        }

        let identity = self.session.identity();
        self.gui.send(&format!("id name {}", identity.name));
        self.gui.send(&format!("id author {}", identity.author));
        for option in ENGINE_OPTIONS {
            self.gui.send(option);
        }
        self.gui.send(UCI_OK);
        self.session.set_ready(true);
        info!("handshake complete");

        sleep(self.timings.handshake_settle).await;
    }

    async fn handle_isready(&mut self) {
        sleep(self.timings.ready_settle).await;

        match self.send_to_device("isready").await {
            Err(e) => debug!("failed to send isready to device: {}", e),
            Ok(()) => {
                let deadline = Instant::now() + self.timings.ready_deadline;

                while Instant::now() < deadline {
                    let response = match self.read_from_device(deadline).await {
                        Ok(response) => response,
                        Err(e) => {
                            debug!("isready read error: {}", e);
                            break;
                        }
                    };

                    match DeviceLine::classify(&response) {
                        DeviceLine::Ready => break,
                        DeviceLine::Empty => {}
                        _ => debug!("ignoring stale output during isready: {}", response),
                    }

                    sleep(self.timings.poll_interval).await;
                }
            }
        }

        self.gui.send(READY_OK);
        sleep(self.timings.ready_settle).await;
    }

    async fn handle_quit(&mut self) -> Flow {
        info!("quit received");
        if self.session.is_connected() {
            if let Err(e) = self.send_to_device("quit").await {
                debug!("failed to forward quit: {}", e);
            }
            sleep(self.timings.quit_grace).await;
        }
        self.session.release();
        Flow::Quit
    }

    async fn handle_go(&mut self, line: &str, params: &GoParams) {
        let fallback = best_move_line(&self.fallback_move);

        let link = match self.send_to_device(line).await {
            Ok(()) => self.session.link().cloned(),
            Err(e) => {
                error!("failed to send go command: {}", e);
                None
            }
        };
        let Some(link) = link else {
            self.gui.send(&fallback);
            return;
        };

        let timeout = self.budget.timeout_for(params);
        debug!("search budget {:?} for '{}'", timeout, line);

        let guard = Arc::new(SearchGuard::new(self.gui.clone()));
        let mut reader = tokio::spawn(relay_search_output(
            link,
            Arc::clone(&guard),
            self.timings.search_poll,
        ));

        let timed_out = tokio::select! {
            outcome = &mut reader => {
                match outcome {
                    Ok(SearchOutcome::Delivered) => debug!("search result delivered"),
                    Ok(SearchOutcome::Failed) => {
                        if let Some(e) = guard.take_failure() {
                            warn!("device failed during search: {}", e);
                            self.note_failure(&e);
                        }
                        guard.resolve(&fallback);
                    }
                    Ok(SearchOutcome::Abandoned) => {
                        guard.resolve(&fallback);
                    }
                    Err(e) => {
                        error!("search reader panicked: {}", e);
                        guard.resolve(&fallback);
                    }
                }
                false
            }
            _ = sleep(timeout) => {
                if guard.resolve(&fallback) {
                    warn!("no result within {:?}, sent fallback move", timeout);
                }
                true
            }
        };

        if timed_out {
            self.abandoned = Some(AbandonedSearch { guard, reader });
        }
    }

    /// Wait for the reader of a timed-out search to let go of the port, and
    /// pick up a link failure it hit after the fallback was sent.
    async fn collect_abandoned_search(&mut self) {
        let Some(search) = self.abandoned.take() else {
            return;
        };
        if let Err(e) = search.reader.await {
            error!("search reader panicked: {}", e);
        }
        if let Some(e) = search.guard.take_failure() {
            warn!("device failed after the search was resolved: {}", e);
            self.note_failure(&e);
        }
    }

    async fn handle_other(&mut self, line: &str, fire_and_forget: bool) {
        if line.is_empty() {
            return;
        }

        sleep(self.timings.forward_settle).await;

        if let Err(e) = self.send_to_device(line).await {
            debug!("failed to forward '{}': {}", line, e);
            return;
        }

        if fire_and_forget {
            debug!("'{}' sent, no response expected", line);
            sleep(self.timings.forward_settle).await;
            return;
        }

        let deadline = Instant::now() + self.timings.reply_deadline;
        while Instant::now() < deadline {
            match self.read_from_device(deadline).await {
                Ok(response) if !response.is_empty() => {
                    debug!("response to '{}': {}", line, response);
                    self.gui.send(&response);
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
            sleep(self.timings.poll_interval).await;
        }

        sleep(self.timings.forward_settle).await;
    }

    async fn send_to_device(&mut self, line: &str) -> Result<(), PortError> {
        let link = self.session.link().cloned().ok_or(PortError::NotConnected)?;
        let result = link.write_line(line).await;
        if let Err(e) = &result {
            self.note_failure(e);
        }
        result
    }

    async fn read_from_device(&mut self, deadline: Instant) -> Result<String, PortError> {
        let link = self.session.link().cloned().ok_or(PortError::NotConnected)?;
        let result = link.read_line_until(deadline).await;
        if let Err(e) = &result {
            self.note_failure(e);
        }
        result
    }

    fn note_failure(&mut self, e: &PortError) {
        if e.is_connection_lost() && self.session.is_connected() && !self.needs_reconnect {
            warn!("device link error, reconnecting before next command: {}", e);
            self.needs_reconnect = true;
        }
    }
}

/// How the search reader task ended.
#[derive(Debug)]
enum SearchOutcome {
    /// A genuine result reached the GUI.
    Delivered,
    /// A result was already sent for this search; the reader stood down.
    Abandoned,
    /// The link failed; the error is left in the guard.
    Failed,
}

/// A search answered by the fallback while its reader was still running.
#[derive(Debug)]
struct AbandonedSearch {
    guard: Arc<SearchGuard>,
    reader: JoinHandle<SearchOutcome>,
}

/// Per-search record of whether the result line has been sent.
///
/// Writes happen under the guard's lock, so nothing from the reader can
/// reach the GUI after the result, and only one result is ever written.
/// Resolving also raises the reader's cancel flag.
#[derive(Debug)]
struct SearchGuard {
    gui: GuiWriter,
    resolved: Mutex<bool>,
    cancel: Arc<AtomicBool>,
    failure: Mutex<Option<PortError>>,
}

impl SearchGuard {
    fn new(gui: GuiWriter) -> Self {
        Self {
            gui,
            resolved: Mutex::new(false),
            cancel: Arc::new(AtomicBool::new(false)),
            failure: Mutex::new(None),
        }
    }

    fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn record_failure(&self, e: PortError) {
        *self.failure.lock() = Some(e);
    }

    fn take_failure(&self) -> Option<PortError> {
        self.failure.lock().take()
    }

    fn has_failure(&self) -> bool {
        self.failure.lock().is_some()
    }

    fn is_resolved(&self) -> bool {
        *self.resolved.lock()
    }

    /// Forward intermediate output. False once the search is resolved.
    fn forward(&self, line: &str) -> bool {
        let resolved = self.resolved.lock();
        if *resolved {
            return false;
        }
        self.gui.send(line);
        true
    }

    /// Send the result line unless one was sent already.
    fn resolve(&self, line: &str) -> bool {
        let mut resolved = self.resolved.lock();
        if *resolved {
            return false;
        }
        self.gui.send(line);
        *resolved = true;
        self.cancel.store(true, Ordering::Release);
        true
    }
}

/// Relay device output until a result arrives, the link fails, or the
/// search is resolved without us.
async fn relay_search_output(
    link: DeviceLink,
    guard: Arc<SearchGuard>,
    poll: Duration,
) -> SearchOutcome {
    let cancel = guard.cancel_flag();
    loop {
        if guard.is_resolved() {
            debug!("search already resolved, reader exiting");
            return SearchOutcome::Abandoned;
        }

        let response = match link.read_line_cancellable(Arc::clone(&cancel)).await {
            Ok(response) => response,
            Err(e) => {
                guard.record_failure(e);
                return SearchOutcome::Failed;
            }
        };

        match DeviceLine::classify(&response) {
            DeviceLine::Empty => {}
            DeviceLine::BestMove(result) => {
                return if guard.resolve(result) {
                    debug!("received result: {}", result);
                    SearchOutcome::Delivered
                } else {
                    debug!("discarding late result: {}", result);
                    SearchOutcome::Abandoned
                };
            }
            _ => {
                if !guard.forward(&response) {
                    debug!("discarding late output: {}", response);
                    return SearchOutcome::Abandoned;
                }
            }
        }

        sleep(poll).await;
    }
}
