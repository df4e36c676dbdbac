//! Connection bookkeeping.
//!
//! A [`ConnectionRecord`] is shared between the registry map and the four
//! callbacks of its connection task. The shell never reads a record
//! directly; it asks for a [`ConnectionSnapshot`].

// ============================================================================
// Submodules
// ============================================================================

pub mod record;
pub mod snapshot;
pub mod status;
pub mod transcript;

// ============================================================================
// Re-exports
// ============================================================================

pub use record::ConnectionRecord;
pub use snapshot::ConnectionSnapshot;
pub use status::ConnectionStatus;
pub use transcript::{Direction, TranscriptEntry};
