//! Background stream reader.
//!
//! One reader task runs per live connection. It pulls body chunks, splits
//! them into lines, decodes each line and pushes the resulting envelopes onto
//! the session's output channel.
//!
//! # State Machine
//!
//! ```text
//!            read error, not stale          open ok, still live
//!  Reading ─────────────────────────► Reconnecting ──────────────► Reading
//!     │                                  │   ▲  open failed:
//!     │ stale / channel closed           │   └─ wait, retry forever
//!     ▼                                  ▼ stale / superseded
//!  Stopped ◄─────────────────────────────┘
//! ```
//!
//! A read error on a stale connection is the normal shutdown path. Any other
//! read error sends the reader to `Reconnecting`, which retries the same
//! request until it succeeds or the session is stopped. Errors never reach
//! the consumer; it only observes a pause in the flow of records.

use tokio::sync::mpsc;

use crate::client::connection::{Connection, ReadOutcome};
use crate::client::decoder::FrameDecoder;
use crate::client::parser::{Line, LineParser};
use crate::client::session::Dialer;
use crate::client::state::{ReaderState, SessionStats};
use crate::client::utils::is_access_denied_status;
use crate::types::Envelope;

pub(crate) struct StreamReader {
    conn: Connection,
    dialer: Dialer,
    output: mpsc::Sender<Envelope>,
}

impl StreamReader {
    pub(crate) fn new(conn: Connection, dialer: Dialer, output: mpsc::Sender<Envelope>) -> Self {
        StreamReader {
            conn,
            dialer,
            output,
        }
    }

    /// Drive the state machine until `Stopped`.
    pub(crate) async fn run(mut self) {
        let mut state = ReaderState::Reading;
        loop {
            self.dialer.state.set_reader_state(self.conn.id(), state);
            state = match state {
                ReaderState::Reading => self.read().await,
                ReaderState::Reconnecting => self.reconnect().await,
                ReaderState::Stopped => break,
            };
        }
        self.dialer.state.retire(self.conn.id());
        self.conn.close();
        tracing::debug!(connection = self.conn.id(), "stream reader stopped");
    }

    async fn read(&mut self) -> ReaderState {
        let config = &self.dialer.config;
        let idle = config.idle_timeout();
        let mut parser = LineParser::new(config.max_line_bytes);

        loop {
            let reason = match self.conn.read_chunk(idle).await {
                ReadOutcome::Chunk(chunk) => {
                    for line in parser.feed(&chunk) {
                        if let Some(envelope) = self.decode(line) {
                            if !self.deliver(envelope).await {
                                return ReaderState::Stopped;
                            }
                        }
                    }
                    continue;
                }
                ReadOutcome::Stale => return ReaderState::Stopped,
                ReadOutcome::Eof => "end of stream".to_string(),
                ReadOutcome::Failed(reason) => reason,
            };

            if self.conn.is_stale() {
                return ReaderState::Stopped;
            }
            tracing::warn!(
                connection = self.conn.id(),
                target = %self.conn.target(),
                pending_bytes = parser.pending(),
                "stream interrupted ({}), reconnecting",
                reason
            );
            return ReaderState::Reconnecting;
        }
    }

    fn decode(&self, line: Line) -> Option<Envelope> {
        let stats = &self.dialer.state.stats;
        let bytes = match line {
            Line::Complete(bytes) => bytes,
            Line::Oversized => {
                SessionStats::bump(&stats.malformed_records);
                tracing::warn!(
                    connection = self.conn.id(),
                    limit = self.dialer.config.max_line_bytes,
                    "dropping oversized line"
                );
                return None;
            }
        };

        match FrameDecoder::decode(&bytes) {
            Ok(Some(envelope)) => Some(envelope),
            Ok(None) => {
                SessionStats::bump(&stats.blank_lines);
                None
            }
            Err(e) => {
                SessionStats::bump(&stats.malformed_records);
                tracing::warn!(connection = self.conn.id(), error = %e, "dropping malformed line");
                None
            }
        }
    }

    /// Push onto the output channel; false when the reader should stop.
    async fn deliver(&mut self, envelope: Envelope) -> bool {
        let handle = self.conn.handle();
        if handle.is_stale() {
            return false;
        }
        tokio::select! {
            biased;
            _ = handle.closed() => false,
            sent = self.output.send(envelope) => match sent {
                Ok(()) => {
                    SessionStats::bump(&self.dialer.state.stats.records_delivered);
                    true
                }
                Err(_) => {
                    tracing::debug!(connection = self.conn.id(), "output channel closed");
                    false
                }
            },
        }
    }

    async fn reconnect(&mut self) -> ReaderState {
        let handle = self.conn.handle();
        let request = self.conn.request().clone();
        let mut attempt: u32 = 0;

        loop {
            let delay = self.dialer.config.retry.delay(attempt);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = handle.closed() => return ReaderState::Stopped,
            }

            let dialed = tokio::select! {
                dialed = self.dialer.dial(&request) => dialed,
                _ = handle.closed() => return ReaderState::Stopped,
            };

            match dialed {
                Ok((mut conn, _)) => {
                    if !self.dialer.state.replace_if_live(self.conn.id(), conn.handle()) {
                        conn.close();
                        return ReaderState::Stopped;
                    }
                    SessionStats::bump(&self.dialer.state.stats.reconnects);
                    tracing::info!(
                        previous = self.conn.id(),
                        connection = conn.id(),
                        attempt = attempt + 1,
                        "stream reconnected"
                    );
                    self.conn = conn;
                    return ReaderState::Reading;
                }
                Err(e) if e.is_retryable() => {
                    let next = self.dialer.config.retry.delay(attempt.saturating_add(1));
                    if self.dialer.config.enable_logging {
                        if e.status().is_some_and(is_access_denied_status) {
                            tracing::warn!(
                                connection = self.conn.id(),
                                attempt = attempt + 1,
                                "access denied while reconnecting, retrying after {:?}",
                                next
                            );
                        } else {
                            tracing::warn!(
                                connection = self.conn.id(),
                                attempt = attempt + 1,
                                error = %e,
                                "reconnect failed, retrying after {:?}",
                                next
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(connection = self.conn.id(), error = %e, "giving up on stream");
                    return ReaderState::Stopped;
                }
            }
            attempt = attempt.saturating_add(1);
        }
    }
}
