//! # docsearch-service
//!
//! Ingestion and query pipelines for docsearch.
//!
//! - [`IngestionManager`]: uniqueness check, content extraction, persistence
//! - [`QueryTranslator`]: dialect-fallback parse, attribute allow-list, render
//! - [`QueryExecutor`]: runs translated queries and maps rows to locators
//! - [`SearchFacade`]: the one object callers depend on
//!
//! Every failure is a [`SearchError`]; [`SearchError::kind`] and
//! [`SearchError::is_caller_error`] classify it without string matching.

pub mod error;
pub mod executor;
pub mod extract;
pub mod facade;
pub mod ingest;
pub mod loader;
pub mod payload;
pub mod translator;

#[cfg(test)]
mod test_support;

pub use error::{
    BuildError, ErrorKind, ExtractionError, LoadError, QueryInputError, SearchError,
};
pub use executor::{LocatorSource, QueryExecutor};
pub use extract::{ContentExtractor, TextExtractor};
pub use facade::SearchFacade;
pub use ingest::{IngestConfig, IngestionManager};
pub use loader::{DefaultResourceLoader, ResourceLoader};
pub use payload::{ContentSource, IndexPayload, Locations};
pub use translator::{QueryTranslator, DEFAULT_MAX_QUERY_LENGTH};
