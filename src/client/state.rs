//! Shared, mutable session state.
//!
//! The live connection slot is the only piece of shared state that decides
//! which reader is the primary feed. Every change to it (install on start,
//! swap on reconnect, clear on stop) happens inside the one `live` lock, and
//! the connection being displaced is marked stale inside that same critical
//! section. Counters are lock-free.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::client::connection::ConnectionHandle;

/// Lifecycle of the background stream reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderState {
    /// Pulling lines from the live connection
    Reading,
    /// Waiting to re-establish the connection
    Reconnecting,
    /// No reader is active
    Stopped,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionDiagnostics {
    /// State of the current reader.
    pub state: ReaderState,
    /// Id of the live connection, if any.
    pub live_connection: Option<u64>,
    /// Handshakes attempted, initial and reconnects.
    pub connect_attempts: u64,
    /// Successful reconnects.
    pub reconnects: u64,
    /// Envelopes pushed onto the output channel.
    pub records_delivered: u64,
    /// Lines dropped as malformed or oversized.
    pub malformed_records: u64,
    /// Keep-alive blank lines skipped.
    pub blank_lines: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SessionStats {
    pub(crate) connect_attempts: AtomicU64,
    pub(crate) reconnects: AtomicU64,
    pub(crate) records_delivered: AtomicU64,
    pub(crate) malformed_records: AtomicU64,
    pub(crate) blank_lines: AtomicU64,
}

impl SessionStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub(crate) struct SessionState {
    live: Mutex<Option<ConnectionHandle>>,
    reader: Mutex<ReaderState>,
    next_id: AtomicU64,
    pub(crate) stats: SessionStats,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        SessionState {
            live: Mutex::new(None),
            reader: Mutex::new(ReaderState::Stopped),
            next_id: AtomicU64::new(1),
            stats: SessionStats::default(),
        }
    }

    pub(crate) fn next_connection_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Make `handle` the live connection, closing whatever was live before.
    pub(crate) fn install(&self, handle: ConnectionHandle) {
        let mut live = self.live.lock();
        if let Some(previous) = live.replace(handle) {
            previous.close();
        }
        *self.reader.lock() = ReaderState::Reading;
    }

    /// Swap in `handle` only if `expected` is still the live connection.
    ///
    /// Returns false when the session was stopped or restarted meanwhile;
    /// the caller must then discard `handle`.
    pub(crate) fn replace_if_live(&self, expected: u64, handle: ConnectionHandle) -> bool {
        let mut live = self.live.lock();
        match live.as_ref() {
            Some(current) if current.id() == expected && !current.is_stale() => {
                current.close();
                *live = Some(handle);
                *self.reader.lock() = ReaderState::Reading;
                true
            }
            _ => false,
        }
    }

    /// Clear the live slot if it still holds connection `id`.
    pub(crate) fn retire(&self, id: u64) {
        let mut live = self.live.lock();
        if live.as_ref().is_some_and(|current| current.id() == id) {
            if let Some(current) = live.take() {
                current.close();
            }
            *self.reader.lock() = ReaderState::Stopped;
        }
    }

    /// Close and clear the live connection. No-op when nothing is live.
    pub(crate) fn stop(&self) -> Option<u64> {
        let mut live = self.live.lock();
        let previous = live.take()?;
        previous.close();
        *self.reader.lock() = ReaderState::Stopped;
        Some(previous.id())
    }

    /// Record the state of the reader bound to connection `id`.
    ///
    /// Ignored for readers that are no longer the live feed.
    pub(crate) fn set_reader_state(&self, id: u64, state: ReaderState) {
        let live = self.live.lock();
        let is_current = match live.as_ref() {
            Some(current) => current.id() == id,
            None => state == ReaderState::Stopped,
        };
        if is_current {
            *self.reader.lock() = state;
        }
    }

    pub(crate) fn live_connection(&self) -> Option<ConnectionHandle> {
        self.live.lock().clone()
    }

    pub(crate) fn diagnostics(&self) -> SessionDiagnostics {
        let live = self.live.lock();
        let stats = &self.stats;
        SessionDiagnostics {
            state: *self.reader.lock(),
            live_connection: live.as_ref().map(ConnectionHandle::id),
            connect_attempts: stats.connect_attempts.load(Ordering::Relaxed),
            reconnects: stats.reconnects.load(Ordering::Relaxed),
            records_delivered: stats.records_delivered.load(Ordering::Relaxed),
            malformed_records: stats.malformed_records.load(Ordering::Relaxed),
            blank_lines: stats.blank_lines.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_closes_previous() {
        let state = SessionState::new();
        let first = ConnectionHandle::new(state.next_connection_id());
        let second = ConnectionHandle::new(state.next_connection_id());

        state.install(first.clone());
        assert!(!first.is_stale());
        state.install(second.clone());

        assert!(first.is_stale());
        assert!(!second.is_stale());
        assert_eq!(state.diagnostics().live_connection, Some(second.id()));
    }

    #[test]
    fn test_replace_if_live() {
        let state = SessionState::new();
        let first = ConnectionHandle::new(1);
        state.install(first.clone());

        let second = ConnectionHandle::new(2);
        assert!(state.replace_if_live(1, second.clone()));
        assert!(first.is_stale());

        // connection 1 is no longer live, so a late swap loses
        assert!(!state.replace_if_live(1, ConnectionHandle::new(3)));
        assert_eq!(state.live_connection().map(|h| h.id()), Some(2));
    }

    #[test]
    fn test_replace_after_stop_is_refused() {
        let state = SessionState::new();
        state.install(ConnectionHandle::new(1));
        assert_eq!(state.stop(), Some(1));
        assert!(!state.replace_if_live(1, ConnectionHandle::new(2)));
        assert!(state.live_connection().is_none());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let state = SessionState::new();
        assert_eq!(state.stop(), None);
        let handle = ConnectionHandle::new(1);
        state.install(handle.clone());
        assert_eq!(state.stop(), Some(1));
        assert_eq!(state.stop(), None);
        assert!(handle.is_stale());
        assert_eq!(state.diagnostics().state, ReaderState::Stopped);
    }

    #[test]
    fn test_superseded_reader_state_is_ignored() {
        let state = SessionState::new();
        state.install(ConnectionHandle::new(1));
        state.install(ConnectionHandle::new(2));

        state.set_reader_state(1, ReaderState::Stopped);
        assert_eq!(state.diagnostics().state, ReaderState::Reading);

        state.set_reader_state(2, ReaderState::Reconnecting);
        assert_eq!(state.diagnostics().state, ReaderState::Reconnecting);
    }

    #[test]
    fn test_retire_only_matching_connection() {
        let state = SessionState::new();
        let handle = ConnectionHandle::new(5);
        state.install(handle.clone());

        state.retire(4);
        assert!(!handle.is_stale());

        state.retire(5);
        assert!(handle.is_stale());
        assert!(state.live_connection().is_none());
    }
}
