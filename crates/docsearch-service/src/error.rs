//! Error taxonomy for the ingestion and query pipelines.
//!
//! [`SearchError`] has one variant per failure kind callers can observe.
//! Causes are kept as sources so diagnostics survive the mapping.

use std::collections::BTreeSet;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use docsearch_index::StoreError;
use docsearch_query::{ParseError, RenderError};
use docsearch_types::{ConfigError, DocumentId, IdentifierError};

/// Failure kinds, without their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidIdentifier,
    DuplicateIdentifier,
    IndexUnavailable,
    PersistFailed,
    QueryExecutionFailed,
    ExtractionFailed,
    MalformedQuery,
    IllegalQuery,
    QueryTranslationFailed,
    ResultMappingFailed,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Identifier {0} is already indexed")]
    DuplicateIdentifier(DocumentId),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(#[source] StoreError),

    #[error("Failed to persist record {id}: {source}")]
    PersistFailed {
        id: DocumentId,
        #[source]
        source: StoreError,
    },

    #[error("Query execution failed: {0}")]
    QueryExecutionFailed(#[source] StoreError),

    #[error("Failed to extract content for {id}: {source}")]
    ExtractionFailed {
        id: DocumentId,
        #[source]
        source: ExtractionError,
    },

    #[error("Malformed query: {0}")]
    MalformedQuery(#[from] QueryInputError),

    #[error("Unsupported query attributes: {}", format_names(.unsupported))]
    IllegalQuery { unsupported: BTreeSet<String> },

    #[error("Failed to translate query: {0}")]
    QueryTranslationFailed(#[from] RenderError),

    #[error("Result locator {value:?} in '{attribute}' is not a valid URI: {source}")]
    ResultMappingFailed {
        attribute: String,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

fn format_names(names: &BTreeSet<String>) -> String {
    let joined: Vec<&str> = names.iter().map(String::as_str).collect();
    format!("{{{}}}", joined.join(", "))
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            SearchError::DuplicateIdentifier(_) => ErrorKind::DuplicateIdentifier,
            SearchError::IndexUnavailable(_) => ErrorKind::IndexUnavailable,
            SearchError::PersistFailed { .. } => ErrorKind::PersistFailed,
            SearchError::QueryExecutionFailed(_) => ErrorKind::QueryExecutionFailed,
            SearchError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            SearchError::MalformedQuery(_) => ErrorKind::MalformedQuery,
            SearchError::IllegalQuery { .. } => ErrorKind::IllegalQuery,
            SearchError::QueryTranslationFailed(_) => ErrorKind::QueryTranslationFailed,
            SearchError::ResultMappingFailed { .. } => ErrorKind::ResultMappingFailed,
        }
    }

    /// True when the failure is a deterministic function of the caller's
    /// input; everything else is a server-side failure.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidIdentifier
                | ErrorKind::DuplicateIdentifier
                | ErrorKind::MalformedQuery
                | ErrorKind::IllegalQuery
        )
    }
}

/// Why a query string was rejected as malformed.
#[derive(Debug, Error)]
pub enum QueryInputError {
    #[error("query is blank")]
    Blank,

    #[error("query is {length} characters long, limit is {max}")]
    TooLong { length: usize, max: usize },

    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// Failure to turn source content into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Content is not valid UTF-8: {0}")]
    Undecodable(#[from] std::str::Utf8Error),

    #[error("Invalid JSON document: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Document has no '{0}' text member")]
    MissingField(&'static str),

    #[error("Failed to load content: {0}")]
    Load(#[from] LoadError),

    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Failure to read bytes from a locator.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported locator scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Locator is not a local file path: {0}")]
    InvalidPath(Url),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: Url, status: u16 },
}

/// Failure to assemble the service from settings.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open index store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to build resource loader: {0}")]
    Loader(#[from] LoadError),
}
