//! WebSocket protocol vocabulary.
//!
//! Framing and the opening handshake come from `tokio-tungstenite`; this
//! module only holds the pieces the client records and displays.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `close` | Close code names, validation, [`CloseInfo`] |
//! | `message` | Received data message [`Payload`] |

// ============================================================================
// Submodules
// ============================================================================

/// Close codes and close-reason formatting.
pub mod close;

/// Data message payloads.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use close::CloseInfo;
pub use message::Payload;
