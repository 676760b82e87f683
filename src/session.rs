//! Stream session: one query's lifecycle and accumulated state.
//!
//! A [`StreamSession`] owns the mutable aggregate for one in-flight query
//! and merges classified events into it. [`drive`] consumes the event stream
//! produced by [`crate::client::QueryClient::query_stream`] and dispatches to
//! a [`StreamHandler`], with these guarantees:
//!
//! - callbacks fire in transport delivery order, one `on_event` per
//!   classified event (no-ops included, so liveness stays observable);
//! - exactly one of `on_complete` / `on_error` fires, exactly once, and no
//!   `on_event` fires after either;
//! - after cancellation is requested no new callback starts, and
//!   cancellation is observed within one pending chunk-wait.
//!
//! Sessions never share state: each owns its decoder buffer and
//! [`SessionState`], and is discarded once terminal.

use crate::client::EventStream;
use crate::error::SessionError;
use crate::models::QueryResponse;
use crate::rows::{coerce_rows, Row};
use crate::sse::{classify_response, QueryEvent, ResultPayload};
use crate::stage::Stage;
use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Accumulated view of one query, monotonically improving as frames arrive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Most recent stage notification (last-write-wins).
    pub stage: Option<Stage>,
    /// Progress percentage derived from the stage.
    pub progress: u8,
    /// Generated SQL. Only overwritten, never appended, and only by a
    /// non-empty incoming value.
    pub sql: String,
    /// Reasoning transcript, tag-stripped. Deltas append; a finalize event
    /// replaces it wholesale.
    pub reasoning: String,
    /// Current result set. Each delta fully replaces it; rows are never
    /// partially merged.
    pub rows: Vec<Row>,
    /// Once set, no further event mutates this state.
    pub terminal: bool,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Errored,
    Cancelled,
}

/// Caller-supplied callbacks for one session.
pub trait StreamHandler {
    /// One classified event was applied. Fires for no-ops too.
    fn on_event(&mut self, event: &QueryEvent, state: &SessionState);
    /// The stream finished without a terminal error.
    fn on_complete(&mut self, state: &SessionState);
    /// The session ended with a transport or service error.
    fn on_error(&mut self, error: &SessionError, state: &SessionState);
}

/// One query's session: state plus the merge rules.
#[derive(Debug, Default)]
pub struct StreamSession {
    state: SessionState,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    /// Latch the terminal flag; later events are discarded silently.
    pub fn mark_terminal(&mut self) {
        self.state.terminal = true;
    }

    /// Merge one event into the state.
    ///
    /// Pure and order-deterministic: replaying an identical event sequence
    /// on a fresh session reproduces the same final state. Events arriving
    /// after the state is terminal are discarded (the transport may deliver
    /// trailing data after a close signal).
    pub fn apply(&mut self, event: &QueryEvent) {
        if self.state.terminal {
            debug!(kind = event.kind(), "discarding event after terminal state");
            return;
        }
        match event {
            QueryEvent::StageUpdate { stage, sql } => {
                if let Some(name) = stage {
                    let stage = Stage::from_name(name);
                    self.state.progress = stage.progress();
                    self.state.stage = Some(stage);
                }
                if let Some(sql) = sql {
                    if !sql.is_empty() {
                        self.state.sql = sql.clone();
                    }
                }
            }
            QueryEvent::TextDelta { text } => self.state.reasoning.push_str(text),
            QueryEvent::TextFinal { text } => self.state.reasoning = text.clone(),
            QueryEvent::ResultDelta(ResultPayload::Raw { text, columns }) => {
                match coerce_rows(text, columns.as_deref()) {
                    Ok(rows) => self.state.rows = rows,
                    // Recovered: prior rows stay, the failure is diagnostic only.
                    Err(e) => warn!(error = %e, "keeping previous rows"),
                }
            }
            QueryEvent::ResultDelta(ResultPayload::Rows(rows)) => {
                self.state.rows = rows.clone();
            }
            QueryEvent::TerminalError { .. } | QueryEvent::StreamEnd => {
                self.state.terminal = true;
            }
            QueryEvent::Noop => {}
        }
    }

    /// Apply a non-streaming `POST /query` response as the degenerate
    /// single-terminal-frame case of the same contract.
    pub fn apply_response(&mut self, response: &QueryResponse) {
        for event in classify_response(response) {
            self.apply(&event);
        }
        self.state.terminal = true;
    }
}

/// Create a linked cancellation handle/token pair.
///
/// The handle side requests cancellation; the token side is given to
/// [`drive`]. Dropping the handle without cancelling leaves the token
/// permanently un-cancelled.
pub fn cancel_channel() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Requests cancellation of a running session.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Observes a cancellation request.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested. Pends forever if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

/// Consume an event stream to its terminal outcome, dispatching callbacks.
pub async fn drive<H: StreamHandler>(
    mut events: EventStream,
    session: &mut StreamSession,
    handler: &mut H,
    mut cancel: CancelToken,
) -> SessionOutcome {
    loop {
        let next = tokio::select! {
            // Biased so a pending cancellation wins over a ready event.
            biased;
            _ = cancel.cancelled() => {
                session.mark_terminal();
                return SessionOutcome::Cancelled;
            }
            next = events.next() => next,
        };
        match next {
            Some(Ok(QueryEvent::StreamEnd)) => {
                session.mark_terminal();
                handler.on_complete(session.state());
                return SessionOutcome::Completed;
            }
            Some(Ok(QueryEvent::TerminalError { message })) => {
                let event = QueryEvent::TerminalError {
                    message: message.clone(),
                };
                session.apply(&event);
                handler.on_event(&event, session.state());
                handler.on_error(&SessionError::Service(message), session.state());
                return SessionOutcome::Errored;
            }
            Some(Ok(event)) => {
                session.apply(&event);
                handler.on_event(&event, session.state());
            }
            Some(Err(e)) => {
                session.mark_terminal();
                handler.on_error(&SessionError::Transport(e), session.state());
                return SessionOutcome::Errored;
            }
            // Connection closed without the sentinel: not an error.
            None => {
                session.mark_terminal();
                handler.on_complete(session.state());
                return SessionOutcome::Completed;
            }
        }
    }
}
