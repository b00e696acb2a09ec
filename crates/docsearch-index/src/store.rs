//! Index store: the persistence collaborator for index records.
//!
//! [`IndexStore`] is the contract the ingestion and query pipelines depend
//! on. [`TantivyIndexStore`] implements it over an embedded Tantivy index.
//!
//! The writer is wrapped in a Mutex; each save runs its duplicate-key check,
//! add and commit while holding it, so the store is the authoritative guard
//! against two records with the same id.
//!
//! A save's deadline is checked once, under the writer lock, right before
//! the document is added. After that point the commit is never abandoned,
//! so a save either fails having written nothing or reports what it wrote.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant as StdInstant;

use async_trait::async_trait;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{IndexWriter, TantivyDocument, Term};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use docsearch_types::{Attribute, DocumentId, IndexRecord};

use crate::document::{doc_to_row, record_to_doc, IndexRow};
use crate::error::StoreError;
use crate::index::{create_index, open_existing_index, IndexStoreConfig, OpenIndex};

/// Persistence contract for index records.
///
/// Implementations must be safe for concurrent use by in-flight requests.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Whether a record with this id is stored.
    async fn exists(&self, id: &DocumentId) -> Result<bool, StoreError>;

    /// Persist a new record. Rejects records missing a required attribute
    /// and ids that are already stored.
    ///
    /// If `deadline` has passed before the write starts, fails with
    /// [`StoreError::DeadlineExceeded`] and stores nothing. A write that has
    /// started runs to completion.
    async fn save(&self, record: &IndexRecord, deadline: Instant) -> Result<(), StoreError>;

    /// Run a backend query string and return the matching rows.
    async fn query(&self, query: &str) -> Result<Vec<IndexRow>, StoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<u64, StoreError>;
}

struct Backend {
    open: OpenIndex,
    writer: Mutex<IndexWriter>,
}

impl Backend {
    fn new(open: OpenIndex, writer_memory_mb: usize) -> Result<Self, StoreError> {
        let writer = open.writer(writer_memory_mb)?;
        Ok(Self {
            open,
            writer: Mutex::new(writer),
        })
    }

    fn contains(&self, id: &str) -> Result<bool, StoreError> {
        let term = Term::from_field_text(self.open.schema().field(Attribute::Id), id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let count = self.open.reader().searcher().search(&query, &Count)?;
        Ok(count > 0)
    }
}

struct StoreInner {
    config: IndexStoreConfig,
    backend: Mutex<Option<Arc<Backend>>>,
}

impl StoreInner {
    fn backend(&self) -> Result<Option<Arc<Backend>>, StoreError> {
        let guard = self
            .backend
            .lock()
            .map_err(|e| StoreError::IndexLocked(e.to_string()))?;
        Ok(guard.clone())
    }

    /// Materialize the index on first write.
    fn backend_or_create(&self) -> Result<Arc<Backend>, StoreError> {
        let mut guard = self
            .backend
            .lock()
            .map_err(|e| StoreError::IndexLocked(e.to_string()))?;
        if let Some(backend) = guard.as_ref() {
            return Ok(backend.clone());
        }

        let index = match open_existing_index(&self.config.index_path)? {
            Some(index) => index,
            None => create_index(&self.config.index_path)?,
        };
        let backend = Arc::new(Backend::new(
            OpenIndex::new(index)?,
            self.config.writer_memory_mb,
        )?);
        *guard = Some(backend.clone());
        Ok(backend)
    }

    fn uninitialized(&self) -> StoreError {
        StoreError::Uninitialized(self.config.index_path.clone())
    }

    fn exists(&self, id: &DocumentId) -> Result<bool, StoreError> {
        match self.backend()? {
            Some(backend) => backend.contains(id.as_str()),
            None => Ok(false),
        }
    }

    fn save(&self, record: &IndexRecord, deadline: StdInstant) -> Result<(), StoreError> {
        record.validate()?;

        let backend = self.backend_or_create()?;
        let doc = record_to_doc(backend.open.schema(), record);

        let mut writer = backend
            .writer
            .lock()
            .map_err(|e| StoreError::IndexLocked(e.to_string()))?;

        if backend.contains(record.id().as_str())? {
            return Err(StoreError::DuplicateKey(record.id().to_string()));
        }

        if StdInstant::now() >= deadline {
            warn!(id = %record.id(), "Save deadline passed before write, nothing stored");
            return Err(StoreError::DeadlineExceeded);
        }

        writer.add_document(doc)?;
        if let Err(e) = writer.commit() {
            let opstamp = writer.rollback()?;
            warn!(opstamp, id = %record.id(), "Rolled back failed commit");
            return Err(e.into());
        }
        backend.open.reader().reload()?;

        debug!(id = %record.id(), "Saved index record");
        Ok(())
    }

    fn query(&self, query_str: &str) -> Result<Vec<IndexRow>, StoreError> {
        let backend = self.backend()?.ok_or_else(|| self.uninitialized())?;
        let schema = backend.open.schema();

        let query_parser =
            QueryParser::for_index(backend.open.index(), vec![schema.field(Attribute::Contents)]);
        let query = query_parser.parse_query(query_str)?;

        let searcher = backend.open.reader().searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(self.config.max_results))?;

        let mut rows = Vec::with_capacity(top_docs.len());
        for (_score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            rows.push(doc_to_row(schema, &doc));
        }

        debug!(query = query_str, rows = rows.len(), "Index query complete");
        Ok(rows)
    }

    fn count(&self) -> Result<u64, StoreError> {
        match self.backend()? {
            Some(backend) => Ok(backend.open.reader().searcher().num_docs()),
            None => Ok(0),
        }
    }
}

/// Index store over an embedded Tantivy index.
///
/// Blocking Tantivy work runs on the blocking thread pool.
#[derive(Clone)]
pub struct TantivyIndexStore {
    inner: Arc<StoreInner>,
}

impl TantivyIndexStore {
    /// Open the store. An existing index is opened immediately; otherwise
    /// the index is created by the first save.
    pub fn open(config: IndexStoreConfig) -> Result<Self, StoreError> {
        let backend = match open_existing_index(&config.index_path)? {
            Some(index) => Some(Arc::new(Backend::new(
                OpenIndex::new(index)?,
                config.writer_memory_mb,
            )?)),
            None => None,
        };

        info!(
            path = ?config.index_path,
            materialized = backend.is_some(),
            "Opened index store"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                backend: Mutex::new(backend),
            }),
        })
    }

    /// Get the index path
    pub fn path(&self) -> PathBuf {
        self.inner.config.index_path.clone()
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&StoreInner) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl IndexStore for TantivyIndexStore {
    async fn exists(&self, id: &DocumentId) -> Result<bool, StoreError> {
        let id = id.clone();
        self.run(move |inner| inner.exists(&id)).await
    }

    async fn save(&self, record: &IndexRecord, deadline: Instant) -> Result<(), StoreError> {
        let record = record.clone();
        let deadline = deadline.into_std();
        self.run(move |inner| inner.save(&record, deadline)).await
    }

    async fn query(&self, query: &str) -> Result<Vec<IndexRow>, StoreError> {
        let query = query.to_string();
        self.run(move |inner| inner.query(&query)).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.run(|inner| inner.count()).await
    }
}
