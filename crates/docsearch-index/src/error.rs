//! Index store error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use docsearch_types::RecordError;

/// Errors that can occur during index store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Backend query string rejected by the query parser
    #[error("Query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No document has ever been written, so the index does not exist yet
    #[error("Index at {0} has not been initialized: no document has been written yet")]
    Uninitialized(PathBuf),

    /// A record with this id is already stored
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Record lacks a required attribute
    #[error("Record rejected: {0}")]
    MissingAttribute(#[from] RecordError),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Index is locked (writer mutex poisoned or held by another process)
    #[error("Index is locked: {0}")]
    IndexLocked(String),

    /// Store call exceeded its deadline
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// Save deadline passed before anything was written
    #[error("Store deadline passed before the record was written")]
    DeadlineExceeded,

    /// Blocking task failed to complete
    #[error("Store task failed: {0}")]
    Task(String),

    /// Backend could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// True for the "queried before the first write" condition.
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, StoreError::Uninitialized(_))
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }

    /// True when a save gave up before writing.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, StoreError::DeadlineExceeded)
    }
}
