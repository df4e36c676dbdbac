//! Connection registry module.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConnectionRegistry`] | Owns connections and the event loop |
//! | [`RegistryBuilder`] | Fluent configuration builder |
//! | [`ShutdownReport`] | Outcome of the shutdown sequence |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for registry configuration.
pub mod builder;

/// Core registry implementation.
pub mod core;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::RegistryBuilder;
pub use core::{ConnectionRegistry, ShutdownReport};
