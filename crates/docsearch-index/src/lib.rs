//! # docsearch-index
//!
//! Index store for docsearch records, backed by an embedded Tantivy index.
//!
//! ## Features
//! - One schema field per registered attribute, derived from the registry
//! - Lazy materialization: the index directory is created by the first save
//! - Duplicate-key check under the writer lock, so the store is the
//!   authoritative uniqueness guard for record ids
//! - Backend queries in Tantivy query syntax, capped at `max_results` rows

pub mod document;
pub mod error;
pub mod index;
pub mod schema;
pub mod store;

pub use document::{doc_to_row, record_to_doc, IndexRow};
pub use error::StoreError;
pub use index::{create_index, index_exists, open_existing_index, IndexStoreConfig, OpenIndex};
pub use schema::{build_record_schema, RecordSchema};
pub use store::{IndexStore, TantivyIndexStore};
