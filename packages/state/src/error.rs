//! Error types for the state layer.

use thiserror::Error;

/// Errors raised while decoding or converting state-layer data.
#[derive(Debug, Error)]
pub enum StateError {
    /// A message arrived with a kind or payload that can't be decoded.
    #[error("malformed message '{kind}': {message}")]
    MalformedMessage { kind: String, message: String },

    /// A value could not be decoded into the requested shape.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A value could not be encoded.
    #[error("encode error: {message}")]
    Encode { message: String },
}

impl StateError {
    pub fn malformed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        StateError::MalformedMessage {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        StateError::Decode {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        StateError::Encode {
            message: message.into(),
        }
    }
}

/// Result type alias for state-layer operations.
pub type Result<T> = std::result::Result<T, StateError>;
