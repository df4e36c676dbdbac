//! Per-connection state shared between the event loop and the shell.
//!
//! Mutators run on the event loop thread (from connection callbacks) or on
//! the command thread (`record_message_sent`); readers take a
//! [`ConnectionSnapshot`]. All access goes through one `parking_lot::Mutex`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::identifiers::ConnectionId;
use crate::protocol::{CloseInfo, Payload};
use crate::transport::ConnectionHandle;

use super::snapshot::ConnectionSnapshot;
use super::status::ConnectionStatus;
use super::transcript::TranscriptEntry;

// ============================================================================
// RecordState
// ============================================================================

/// Mutable part of a record.
#[derive(Debug, Default)]
struct RecordState {
    status: ConnectionStatus,
    peer_server: Option<String>,
    reason: Option<String>,
    transcript: Vec<TranscriptEntry>,
}

impl RecordState {
    /// Moves to `next` if allowed; returns `false` otherwise.
    fn transition(&mut self, id: ConnectionId, next: ConnectionStatus) -> bool {
        if !self.status.can_transition_to(next) {
            warn!(%id, from = %self.status, to = %next, "Ignoring invalid status transition");
            return false;
        }
        self.status = next;
        true
    }
}

// ============================================================================
// ConnectionRecord
// ============================================================================

/// Everything recorded about one connection.
pub struct ConnectionRecord {
    id: ConnectionId,
    uri: String,
    handle: ConnectionHandle,
    state: Mutex<RecordState>,
}

impl fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("id", &self.id)
            .field("uri", &self.uri)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl ConnectionRecord {
    /// Creates a record in status `Connecting`.
    #[must_use]
    pub fn new(id: ConnectionId, uri: impl Into<String>, handle: ConnectionHandle) -> Self {
        Self {
            id,
            uri: uri.into(),
            handle,
            state: Mutex::new(RecordState::default()),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the transport handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().status
    }

    /// Copies every field under one lock acquisition.
    #[must_use]
    pub fn snapshot(&self) -> ConnectionSnapshot {
        let state = self.state.lock();
        ConnectionSnapshot {
            id: self.id,
            uri: self.uri.clone(),
            status: state.status,
            peer_server: state.peer_server.clone(),
            reason: state.reason.clone(),
            transcript: state.transcript.clone(),
        }
    }
}

// ============================================================================
// ConnectionRecord - Event Recording
// ============================================================================

impl ConnectionRecord {
    /// Handshake succeeded.
    pub fn record_opened(&self, peer_server: Option<String>) {
        let mut state = self.state.lock();
        if state.transition(self.id, ConnectionStatus::Open) {
            state.peer_server = peer_server;
        }
    }

    /// Handshake or transport failed.
    pub fn record_failed(&self, peer_server: Option<String>, reason: String) {
        let mut state = self.state.lock();
        if state.transition(self.id, ConnectionStatus::Failed) {
            if peer_server.is_some() {
                state.peer_server = peer_server;
            }
            state.reason = Some(reason);
        }
    }

    /// Connection closed after being open.
    pub fn record_closed(&self, info: &CloseInfo) {
        let mut state = self.state.lock();
        if state.transition(self.id, ConnectionStatus::Closed) {
            state.reason = Some(info.to_string());
        }
    }

    /// Appends a received message.
    pub fn record_message_received(&self, payload: &Payload) {
        let entry = TranscriptEntry::received(payload);
        self.state.lock().transcript.push(entry);
        debug!(id = %self.id, len = payload.len(), "Message recorded");
    }

    /// Appends a sent message.
    pub fn record_message_sent(&self, text: &str) {
        self.state.lock().transcript.push(TranscriptEntry::sent(text));
    }

    /// Enqueues a text frame and appends it to the transcript.
    ///
    /// The record lock is held across the enqueue so the echo of `text`
    /// can never be recorded before `text` itself. Nothing is appended if
    /// the transport rejects the frame.
    ///
    /// # Errors
    ///
    /// Returns the [`ConnectionHandle::send_text`] error.
    pub fn send_text(&self, text: &str) -> Result<()> {
        let mut state = self.state.lock();
        self.handle.send_text(text)?;
        state.transcript.push(TranscriptEntry::sent(text));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
