//! Point-in-time copy of a connection record.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::identifiers::ConnectionId;

use super::status::ConnectionStatus;
use super::transcript::TranscriptEntry;

// ============================================================================
// ConnectionSnapshot
// ============================================================================

/// Owned copy of a record's fields, taken under one lock acquisition.
///
/// `Display` renders the `show` format:
///
/// ```text
/// > URI: ws://127.0.0.1:9001/echo
/// > Status: Open
/// > Remote Server: echo/1.0
/// > Error/close reason: n/a
/// > Messages Processed: (2)
/// >> hello
/// << hello
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub uri: String,
    pub status: ConnectionStatus,
    /// `Server` header of the peer, if one was received.
    pub peer_server: Option<String>,
    /// Fail text or formatted close reason.
    pub reason: Option<String>,
    pub transcript: Vec<TranscriptEntry>,
}

impl ConnectionSnapshot {
    /// Returns the number of transcript entries.
    #[inline]
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// Returns the peer label, or `unspecified`.
    #[inline]
    #[must_use]
    pub fn peer_label(&self) -> &str {
        self.peer_server.as_deref().unwrap_or("unspecified")
    }

    /// Returns the reason, or `n/a`.
    #[inline]
    #[must_use]
    pub fn reason_label(&self) -> &str {
        self.reason.as_deref().unwrap_or("n/a")
    }
}

impl fmt::Display for ConnectionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "> URI: {}", self.uri)?;
        writeln!(f, "> Status: {}", self.status)?;
        writeln!(f, "> Remote Server: {}", self.peer_label())?;
        writeln!(f, "> Error/close reason: {}", self.reason_label())?;
        write!(f, "> Messages Processed: ({})", self.message_count())?;

        for entry in &self.transcript {
            write!(f, "\n{entry}")?;
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::Payload;

    fn fresh() -> ConnectionSnapshot {
        ConnectionSnapshot {
            id: ConnectionId::new(0),
            uri: "wss://example.test/echo".into(),
            status: ConnectionStatus::Connecting,
            peer_server: None,
            reason: None,
            transcript: Vec::new(),
        }
    }

    #[test]
    fn test_display_before_any_event() {
        assert_eq!(
            fresh().to_string(),
            "> URI: wss://example.test/echo\n\
             > Status: Connecting\n\
             > Remote Server: unspecified\n\
             > Error/close reason: n/a\n\
             > Messages Processed: (0)"
        );
    }

    #[test]
    fn test_display_with_transcript() {
        let mut snapshot = fresh();
        snapshot.status = ConnectionStatus::Closed;
        snapshot.peer_server = Some("echo/1.0".into());
        snapshot.reason = Some("close code: 1000 (Normal close), close reason: bye".into());
        snapshot.transcript = vec![
            TranscriptEntry::sent("hi"),
            TranscriptEntry::received(&Payload::Text("hi".into())),
            TranscriptEntry::received(&Payload::Binary(vec![0xDE, 0xAD])),
        ];

        let text = snapshot.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "> Status: Closed");
        assert_eq!(lines[2], "> Remote Server: echo/1.0");
        assert_eq!(
            lines[3],
            "> Error/close reason: close code: 1000 (Normal close), close reason: bye"
        );
        assert_eq!(lines[4], "> Messages Processed: (3)");
        assert_eq!(&lines[5..], [">> hi", "<< hi", "<< dead"]);
    }
}
