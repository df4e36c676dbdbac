//! Message transcript entries.

use std::fmt;

use crate::protocol::Payload;

// ============================================================================
// Direction
// ============================================================================

/// Which side produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Sent by this client.
    Sent,
    /// Received from the server.
    Received,
}

impl Direction {
    /// Returns the transcript prefix (`>>` or `<<`).
    #[inline]
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Sent => ">>",
            Self::Received => "<<",
        }
    }
}

// ============================================================================
// TranscriptEntry
// ============================================================================

/// One line of a connection transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Who produced the message.
    pub direction: Direction,
    /// Text verbatim, or binary as lowercase hex.
    pub body: String,
}

impl TranscriptEntry {
    #[inline]
    #[must_use]
    pub fn sent(text: impl Into<String>) -> Self {
        Self {
            direction: Direction::Sent,
            body: text.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn received(payload: &Payload) -> Self {
        Self {
            direction: Direction::Received,
            body: payload.to_transcript_text(),
        }
    }
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.direction.prefix(), self.body)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(TranscriptEntry::sent("hello").to_string(), ">> hello");

        let echoed = TranscriptEntry::received(&Payload::Text("hello".into()));
        assert_eq!(echoed.to_string(), "<< hello");
    }

    #[test]
    fn test_binary_body_is_hex() {
        let entry = TranscriptEntry::received(&Payload::Binary(vec![0xDE, 0xAD]));
        assert_eq!(entry.direction, Direction::Received);
        assert_eq!(entry.body, "dead");
    }
}
