//! Error types for shared docsearch types.

use thiserror::Error;

use crate::attribute::AttributeKind;

/// Identifier format violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier must be {expected} characters, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("identifier may only contain [0-9a-zA-Z], found {0:?}")]
    InvalidCharacter(char),
}

/// Record construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Value type does not fit the attribute
    #[error("attribute {attribute} expects a {expected:?} value")]
    KindMismatch {
        attribute: &'static str,
        expected: AttributeKind,
    },

    /// Identifier reassignment attempted
    #[error("id cannot be reassigned")]
    ImmutableId,

    /// None of the locator attributes is set
    #[error("record has no locator attribute")]
    MissingLocator,
}

/// Configuration error
#[derive(Debug, Error)]
#[error("Configuration error: {0}")]
pub struct ConfigError(pub String);
