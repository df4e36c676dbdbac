//! WebSocket utility client - many concurrent connections on one I/O thread.
//!
//! This library manages an arbitrary number of `ws://` and `wss://`
//! connections from one process. All network I/O runs on a single
//! background thread; the caller's thread creates, sends on, closes and
//! inspects connections through a [`ConnectionRegistry`].
//!
//! # Architecture
//!
//! - **Command thread**: calls [`ConnectionRegistry`] operations, which
//!   return as soon as the request is handed to the I/O thread
//! - **Event loop thread**: runs one task per connection and records open,
//!   fail, close and message events into shared [`ConnectionRecord`]s
//!
//! Key design principles:
//!
//! - Ids are assigned from 0 and never reused
//! - Records are shared by the registry and their connection's callbacks
//! - Shutdown closes open connections with 1001 and joins the I/O thread
//!
//! # Quick Start
//!
//! ```no_run
//! use ws_utility_client::{ConnectionRegistry, Result};
//!
//! fn main() -> Result<()> {
//!     let registry = ConnectionRegistry::builder().build()?;
//!
//!     let id = registry.connect("wss://ws.vi-server.org/mirror")?;
//!
//!     // Outcomes are recorded asynchronously
//!     if let Some(snapshot) = registry.snapshot(id) {
//!         println!("{snapshot}");
//!     }
//!
//!     registry.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | Per-connection records and snapshots |
//! | [`registry`] | Registry, builder, shutdown |
//! | [`shell`] | Line-oriented command shell |
//! | [`transport`] | Event loop, connection tasks, TLS |
//! | [`protocol`] | Close codes and message payloads |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Connection ids |

// ============================================================================
// Modules
// ============================================================================

/// Command-line flags of the binary.
pub mod cli;

/// Per-connection records, snapshots, and transcripts.
pub mod connection;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Connection identifiers.
pub mod identifiers;

/// Close codes and message payloads.
pub mod protocol;

/// Connection registry and shutdown sequence.
pub mod registry;

/// Interactive command shell.
pub mod shell;

/// WebSocket transport layer.
///
/// Event loop thread, connection tasks, and TLS configuration.
pub mod transport;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{ConnectionRecord, ConnectionSnapshot, ConnectionStatus, TranscriptEntry};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ConnectionId;

// Protocol types
pub use protocol::{CloseInfo, Payload};

// Registry types
pub use registry::{ConnectionRegistry, RegistryBuilder, ShutdownReport};

// Shell types
pub use shell::{Command, Shell};

// Transport types
pub use transport::{DefaultSecureTransport, SecureTransportFactory, TransportOptions};
