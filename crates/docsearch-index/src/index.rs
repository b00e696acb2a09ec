//! Tantivy index management.
//!
//! Handles index creation and opening. The index directory is only
//! materialized by the first write; until then there is nothing to open.

use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use docsearch_types::Settings;

use crate::error::StoreError;
use crate::schema::{build_record_schema, RecordSchema};

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Default cap on rows returned by one query
const DEFAULT_MAX_RESULTS: usize = 1000;

/// Index store configuration
#[derive(Debug, Clone)]
pub struct IndexStoreConfig {
    /// Path to index directory
    pub index_path: PathBuf,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
    /// Maximum rows returned by a query
    pub max_results: usize,
}

impl Default for IndexStoreConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./docsearch-index"),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl IndexStoreConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            index_path: settings.expanded_index_path(),
            writer_memory_mb: settings.writer_memory_mb,
            max_results: settings.max_results,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// An open Tantivy index with its reader and schema handles.
pub struct OpenIndex {
    index: Index,
    schema: RecordSchema,
    reader: IndexReader,
}

impl OpenIndex {
    pub fn new(index: Index) -> Result<Self, StoreError> {
        let schema = RecordSchema::from_schema(index.schema())?;
        // Reloaded explicitly after every commit
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self {
            index,
            schema,
            reader,
        })
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Create an IndexWriter with the given memory budget
    pub fn writer(&self, writer_memory_mb: usize) -> Result<IndexWriter, StoreError> {
        let memory_budget = writer_memory_mb * 1024 * 1024;
        let writer = self.index.writer(memory_budget)?;
        debug!(memory_mb = writer_memory_mb, "Created index writer");
        Ok(writer)
    }
}

/// True if an index has been created at `path`.
pub fn index_exists(path: &Path) -> bool {
    path.join("meta.json").exists()
}

/// Open the index at `path` if one exists.
pub fn open_existing_index(path: &Path) -> Result<Option<Index>, StoreError> {
    if !index_exists(path) {
        debug!(path = ?path, "No index materialized yet");
        return Ok(None);
    }
    debug!(path = ?path, "Opening existing index");
    let index = Index::open_in_dir(path)?;
    Ok(Some(index))
}

/// Create a new index at `path`.
pub fn create_index(path: &Path) -> Result<Index, StoreError> {
    info!(path = ?path, "Creating new index");
    std::fs::create_dir_all(path)?;
    let schema = build_record_schema();
    let index = Index::create_in_dir(path, schema.schema().clone())?;
    Ok(index)
}
