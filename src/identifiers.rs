//! Type-safe identifiers.
//!
//! Newtype wrappers keep connection ids from being mixed up with close
//! codes, counts, or other integers at compile time.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// ConnectionId
// ============================================================================

/// Identifier of one connection within the process lifetime.
///
/// Ids are handed out by a [`ConnectionIdAllocator`] in strictly increasing
/// order and are never reused, even after the connection closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates an id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl From<u64> for ConnectionId {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ============================================================================
// ConnectionIdAllocator
// ============================================================================

/// Monotonic source of [`ConnectionId`]s.
///
/// Starts at zero. Safe to call from several threads: every call returns a
/// distinct id greater than all ids returned before it.
#[derive(Debug, Default)]
pub struct ConnectionIdAllocator {
    next: AtomicU64,
}

impl ConnectionIdAllocator {
    /// Creates an allocator whose first id is `0`.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Allocates the next id.
    #[inline]
    pub fn next(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the id the next call to [`next`](Self::next) will produce.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> ConnectionId {
        ConnectionId(self.next.load(Ordering::Relaxed))
    }
}

// ============================================================================
// Tests
// ============================================================================
