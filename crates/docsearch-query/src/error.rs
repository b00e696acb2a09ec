//! Error types for parsing and rendering.

use thiserror::Error;

/// A query string did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct ParseError {
    /// Byte offset where parsing stopped.
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// A parsed filter uses a construct the backend cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Attribute '{0}' is not registered")]
    UnknownAttribute(String),

    #[error("Unsupported construct for '{attribute}': {reason}")]
    Unsupported { attribute: String, reason: String },

    #[error("Value for '{attribute}' is not an RFC 3339 timestamp: {value}")]
    InvalidTimestamp { attribute: String, value: String },
}

impl RenderError {
    pub(crate) fn unsupported(attribute: &str, reason: impl Into<String>) -> Self {
        RenderError::Unsupported {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}
