//! WebSocket transport layer.
//!
//! This module runs every connection of a registry on one background
//! thread and exposes the small surface the registry needs: create a
//! connection from a URI, address it through a handle, and receive its
//! events through callbacks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   spawn / commands    ┌──────────────────────────┐
//! │ command thread   │──────────────────────►│ EventLoop thread         │
//! │                  │                       │  ┌────────────────────┐  │
//! │ ConnectionHandle │──── send / close ────►│  │ connection task 0  │──┼──► server A
//! │                  │                       │  │ connection task 1  │──┼──► server B
//! └──────────────────┘                       │  └────────┬───────────┘  │
//!          ▲                                 │           │ callbacks    │
//!          └──────── shared records ◄────────┼───────────┘              │
//!                                            └──────────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Connection task, handle, callbacks |
//! | `event_loop` | The background I/O thread |
//! | `options` | Per-connection transport options |
//! | `tls` | TLS configuration factory |

// ============================================================================
// Submodules
// ============================================================================

/// Connection task, handle, and callbacks.
pub mod connection;

/// The background I/O thread.
pub mod event_loop;

/// Per-connection transport options.
pub mod options;

/// TLS configuration factory for `wss://`.
pub mod tls;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Callbacks, ConnectionHandle, LinkState, PendingConnection, Target};
pub use event_loop::EventLoop;
pub use options::TransportOptions;
pub use tls::{DefaultSecureTransport, SecureTransportFactory};
