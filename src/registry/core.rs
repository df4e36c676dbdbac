//! Connection registry and shutdown sequence.
//!
//! The [`ConnectionRegistry`] owns the event loop and every connection
//! record. It is the only type the command thread talks to.
//!
//! # Example
//!
//! ```no_run
//! use ws_utility_client::ConnectionRegistry;
//!
//! # fn example() -> ws_utility_client::Result<()> {
//! let registry = ConnectionRegistry::builder().build()?;
//!
//! let id = registry.connect("wss://ws.vi-server.org/mirror")?;
//! // ... once the connection is open
//! registry.send(id, "hello")?;
//! registry.close(id, 1000, "done")?;
//!
//! let report = registry.shutdown();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::connection::{ConnectionRecord, ConnectionSnapshot, ConnectionStatus};
use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, ConnectionIdAllocator};
use crate::protocol::close;
use crate::transport::{
    Callbacks, EventLoop, PendingConnection, SecureTransportFactory, Target, TransportOptions,
};

use super::builder::RegistryBuilder;

// ============================================================================
// ShutdownReport
// ============================================================================

/// Result of [`ConnectionRegistry::shutdown`].
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Connections that were open and were asked to close.
    pub closed: Vec<ConnectionId>,
    /// Open connections whose close request failed.
    pub errors: Vec<(ConnectionId, Error)>,
}

impl ShutdownReport {
    /// Returns `true` if every close request succeeded.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ============================================================================
// ConnectionRegistry
// ============================================================================

/// Owner of all connections and of the event loop thread.
///
/// `connect`, `send` and `close` return as soon as the request is handed to
/// the event loop. Outcomes (open, fail, close, messages) are recorded
/// asynchronously and observed through [`snapshot`](Self::snapshot).
pub struct ConnectionRegistry {
    /// Id to record map.
    records: RwLock<FxHashMap<ConnectionId, Arc<ConnectionRecord>>>,
    /// Id source, starting at 0.
    ids: ConnectionIdAllocator,
    /// Background I/O thread.
    event_loop: EventLoop,
    /// Options applied to every connection.
    options: TransportOptions,
    /// TLS factory for `wss://`.
    security: Arc<dyn SecureTransportFactory>,
    /// Set once `shutdown` ran.
    shut_down: AtomicBool,
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.len())
            .field("event_loop", &self.event_loop)
            .field("shut_down", &self.shut_down.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ConnectionRegistry - Lifecycle
// ============================================================================

impl ConnectionRegistry {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Starts the event loop; called by [`RegistryBuilder::build`].
    pub(crate) fn start(
        thread_name: &str,
        options: TransportOptions,
        security: Arc<dyn SecureTransportFactory>,
    ) -> Result<Self> {
        let event_loop = EventLoop::start(thread_name)?;

        Ok(Self {
            records: RwLock::new(FxHashMap::default()),
            ids: ConnectionIdAllocator::new(),
            event_loop,
            options,
            security,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Closes every open connection with 1001 and joins the event loop.
    ///
    /// Only connections whose status is exactly `Open` are closed;
    /// connecting ones finish their handshake (or time out) on their own.
    /// Blocks until every connection task has ended. Calling it again
    /// returns an empty report.
    pub fn shutdown(&self) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        if self.shut_down.swap(true, Ordering::AcqRel) {
            return report;
        }

        let mut records: Vec<Arc<ConnectionRecord>> =
            self.records.read().values().cloned().collect();
        records.sort_by_key(|record| record.id());

        info!(count = records.len(), "Shutting down connections");

        for record in records {
            if record.status() != ConnectionStatus::Open {
                continue;
            }

            let id = record.id();
            match record.handle().close(close::GOING_AWAY, "") {
                Ok(()) => report.closed.push(id),
                Err(e) => {
                    warn!(%id, error = %e, "Error closing connection during shutdown");
                    report.errors.push((id, e));
                }
            }
        }

        self.event_loop.request_stop();
        if let Err(e) = self.event_loop.join() {
            warn!(error = %e, "Event loop did not exit cleanly");
        }

        info!(
            closed = report.closed.len(),
            errors = report.errors.len(),
            "Shutdown complete"
        );
        report
    }
}

impl Drop for ConnectionRegistry {
    fn drop(&mut self) {
        if !self.shut_down.load(Ordering::Acquire) {
            self.shutdown();
        }
    }
}

// ============================================================================
// ConnectionRegistry - Public API
// ============================================================================

impl ConnectionRegistry {
    /// Starts a connection to `uri` and returns its id.
    ///
    /// The record is visible in status `Connecting` before this returns.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUri`] if `uri` is not a usable `ws`/`wss` URI; no
    ///   id is allocated
    /// - [`Error::EventLoopStopped`] after shutdown; no record is stored
    pub fn connect(&self, uri: &str) -> Result<ConnectionId> {
        let target = Target::parse(uri)?;
        let (handle, pending) = PendingConnection::new(target);

        let id = self.ids.next();
        let record = Arc::new(ConnectionRecord::new(id, uri, handle));
        let callbacks = bind_callbacks(&record);

        // Callbacks own their record, so the task may run before the insert
        pending
            .start(
                &self.event_loop,
                id,
                callbacks,
                self.options.clone(),
                Arc::clone(&self.security),
            )
            .inspect_err(|e| warn!(%id, error = %e, "Connection could not be scheduled"))?;

        self.records.write().insert(id, record);
        debug!(%id, %uri, "Connection created");
        Ok(id)
    }

    /// Sends a text message on connection `id`.
    ///
    /// The transcript gains a `Sent` entry only if the frame was enqueued.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionNotFound`] for an unknown id
    /// - [`Error::InvalidState`] if the connection is not open
    /// - [`Error::ConnectionClosed`] if the connection task is gone
    pub fn send(&self, id: ConnectionId, text: &str) -> Result<()> {
        let record = self.require(id)?;

        record
            .send_text(text)
            .inspect_err(|e| log_rejected(id, "Send", e))
    }

    /// Starts the closing handshake on connection `id`.
    ///
    /// The recorded status changes only when the close completes.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionNotFound`] for an unknown id
    /// - [`Error::InvalidCloseCode`] or [`Error::InvalidArgument`] for an
    ///   unsendable code or an oversized reason
    /// - [`Error::InvalidState`] if the connection is already closing
    pub fn close(&self, id: ConnectionId, code: u16, reason: &str) -> Result<()> {
        let record = self.require(id)?;

        record
            .handle()
            .close(code, reason)
            .inspect_err(|e| log_rejected(id, "Close", e))
    }

    /// Returns the record for `id`.
    #[must_use]
    pub fn lookup(&self, id: ConnectionId) -> Option<Arc<ConnectionRecord>> {
        self.records.read().get(&id).cloned()
    }

    /// Returns a snapshot of connection `id`.
    #[must_use]
    pub fn snapshot(&self, id: ConnectionId) -> Option<ConnectionSnapshot> {
        self.lookup(id).map(|record| record.snapshot())
    }

    /// Returns all connection ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.records.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of connections.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if no connection was created.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn require(&self, id: ConnectionId) -> Result<Arc<ConnectionRecord>> {
        self.lookup(id).ok_or_else(|| {
            debug!(%id, "Unknown connection id");
            Error::connection_not_found(id)
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Logs a rejected request; the transport refusing is worth a warning,
/// a malformed argument is not.
fn log_rejected(id: ConnectionId, operation: &str, error: &Error) {
    if error.is_transport_error() {
        warn!(%id, operation, error = %error, "Request rejected by transport");
    } else {
        debug!(%id, operation, error = %error, "Request rejected");
    }
}

/// Binds the four connection callbacks to `record`.
fn bind_callbacks(record: &Arc<ConnectionRecord>) -> Callbacks {
    let on_open = Arc::clone(record);
    let on_fail = Arc::clone(record);
    let on_close = Arc::clone(record);
    let on_message = Arc::clone(record);

    Callbacks::new()
        .on_open(move |peer| on_open.record_opened(peer))
        .on_fail(move |peer, reason| on_fail.record_failed(peer, reason))
        .on_close(move |info| on_close.record_closed(&info))
        .on_message(move |payload| on_message.record_message_received(&payload))
}

// ============================================================================
// Tests
// ============================================================================
