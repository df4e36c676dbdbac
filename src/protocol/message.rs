//! Data message payloads.

// ============================================================================
// Imports
// ============================================================================

use tokio_tungstenite::tungstenite::Message;

// ============================================================================
// Payload
// ============================================================================

/// Payload of a received data message.
///
/// Control frames (ping, pong, close) never become a `Payload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Text frame, UTF-8.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

impl Payload {
    /// Returns `true` for text payloads.
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns the payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the payload for a transcript: text verbatim, binary as
    /// lowercase hex.
    #[must_use]
    pub fn to_transcript_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Binary(bytes) => hex::encode(bytes),
        }
    }

    /// Extracts the payload of a data frame.
    ///
    /// Returns `None` for control and raw frames.
    #[must_use]
    pub fn from_message(message: Message) -> Option<Self> {
        match message {
            Message::Text(text) => Some(Self::Text(text.as_str().to_owned())),
            Message::Binary(bytes) => Some(Self::Binary(bytes.to_vec())),
            Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_verbatim() {
        let payload = Payload::Text("hello world".into());
        assert!(payload.is_text());
        assert_eq!(payload.to_transcript_text(), "hello world");
    }

    #[test]
    fn test_binary_is_hex() {
        let payload = Payload::Binary(vec![0xDE, 0xAD]);
        assert!(!payload.is_text());
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.to_transcript_text(), "dead");
    }

    #[test]
    fn test_from_data_messages() {
        assert_eq!(
            Payload::from_message(Message::text("hi")),
            Some(Payload::Text("hi".into()))
        );
        assert_eq!(
            Payload::from_message(Message::binary(vec![1u8, 2, 3])),
            Some(Payload::Binary(vec![1, 2, 3]))
        );
    }

    #[test]
    fn test_control_frames_are_not_payloads() {
        assert_eq!(Payload::from_message(Message::Ping(Default::default())), None);
        assert_eq!(Payload::from_message(Message::Pong(Default::default())), None);
        assert_eq!(Payload::from_message(Message::Close(None)), None);
    }

    #[test]
    fn test_empty_payload() {
        assert!(Payload::Binary(Vec::new()).is_empty());
        assert_eq!(Payload::Binary(Vec::new()).to_transcript_text(), "");
    }
}
