//! # docsearch-types
//!
//! Shared domain types for docsearch.
//!
//! This crate defines the data every other crate agrees on:
//! - Attribute registry: the fixed set of queryable/storable attribute names
//! - Index records: the entity persisted per ingested document
//! - Document identifiers: 32-character alphanumeric ids
//! - Settings: layered configuration

pub mod attribute;
pub mod config;
pub mod error;
pub mod record;

pub use attribute::{unsupported_attributes, Attribute, AttributeKind};
pub use config::Settings;
pub use error::{ConfigError, IdentifierError, RecordError};
pub use record::{
    AttributeValue, DocumentId, IndexRecord, RecordAccessor, ID_LENGTH, RECORD_ACCESSORS,
};
