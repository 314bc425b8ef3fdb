//! Chat message structure
//!
//! A `Message` is the only thing that travels over a session stream. It carries
//! the originating participant's name and one line of text; ordering comes
//! solely from the order frames appear on the stream.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ChatResult;

// ----------------------------------------------------------------------------
// Message
// ----------------------------------------------------------------------------

/// One line of chat text attributed to a named participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: String,
    body: String,
}

impl Message {
    /// Create a new message
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
        }
    }

    /// Name of the participant that produced this message
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Text of the message
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether this message was produced by `name`
    pub fn is_from(&self, name: &str) -> bool {
        self.sender == name
    }

    /// Serialize to the bincode payload carried inside a frame
    pub fn to_bytes(&self) -> ChatResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from a frame payload
    pub fn from_bytes(data: &[u8]) -> ChatResult<Self> {
        Ok(bincode::deserialize(data)?)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let message = Message::new("Tom", "hello");
        assert_eq!(message.to_string(), "Tom: hello");
    }

    #[test]
    fn test_empty_body_is_allowed() {
        let message = Message::new("Tom", "");
        assert_eq!(message.body(), "");
        assert_eq!(message.to_string(), "Tom: ");
    }

    #[test]
    fn test_payload_preserves_fields() {
        let message = Message::new("Matt", "Second line!");
        let decoded = Message::from_bytes(&message.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, message);
        assert!(decoded.is_from("Matt"));
        assert!(!decoded.is_from("Tom"));
    }

    #[test]
    fn test_garbage_payload_is_rejected() {
        assert!(Message::from_bytes(&[0xff; 3]).is_err());
    }
}
