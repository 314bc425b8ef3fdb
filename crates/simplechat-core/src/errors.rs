//! Error types for SimpleChat
//!
//! Everything that can go wrong below the session boundary is expressed as a
//! `ChatError`. Sessions fold these into a coarse `SessionOutcome`; nothing
//! here is fatal to the process.

use thiserror::Error;

/// Core error type for framing, transports, sinks and configuration
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Frame too large: {len} bytes (max: {max})")]
    FrameTooLarge { len: usize, max: usize },

    #[error("Connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Output sink is closed")]
    SinkClosed,
}

/// Result type for SimpleChat core operations
pub type ChatResult<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err: ChatError = io.into();
        assert!(matches!(err, ChatError::Io(_)));
        assert!(err.to_string().contains("reset by peer"));
    }

    #[test]
    fn test_frame_too_large_display() {
        let err = ChatError::FrameTooLarge { len: 10, max: 4 };
        assert_eq!(err.to_string(), "Frame too large: 10 bytes (max: 4)");
    }
}
