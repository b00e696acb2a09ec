//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use url::Url;

use docsearch_index::{IndexRow, IndexStore, StoreError};
use docsearch_types::{DocumentId, IndexRecord};

use crate::error::{ExtractionError, LoadError};
use crate::extract::ContentExtractor;
use crate::loader::ResourceLoader;

pub(crate) const ID_1: &str = "00067360b70e4acfab561fe593ad3f7a";
pub(crate) const ID_2: &str = "001ccb7241284f21a3d15cc340c6aa9c";

pub(crate) fn id(value: &str) -> DocumentId {
    DocumentId::parse(value).unwrap()
}

pub(crate) fn url(value: &str) -> Url {
    Url::parse(value).unwrap()
}

#[derive(Default)]
pub(crate) struct MockStore {
    pub records: Mutex<Vec<IndexRecord>>,
    pub rows: Mutex<Vec<IndexRow>>,
    pub queries: Mutex<Vec<String>>,
    pub saves: AtomicUsize,
    pub fail_exists: bool,
    pub fail_save: bool,
    pub fail_query: bool,
    pub uninitialized: bool,
    pub delay: Option<Duration>,
    pub save_delay: Option<Duration>,
}

impl MockStore {
    pub fn with_rows(rows: Vec<IndexRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl IndexStore for MockStore {
    async fn exists(&self, id: &DocumentId) -> Result<bool, StoreError> {
        self.pause().await;
        if self.fail_exists {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(self.records.lock().unwrap().iter().any(|r| r.id() == id))
    }

    async fn save(&self, record: &IndexRecord, deadline: Instant) -> Result<(), StoreError> {
        self.pause().await;
        if let Some(delay) = self.save_delay {
            tokio::time::sleep(delay).await;
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        if Instant::now() >= deadline {
            return Err(StoreError::DeadlineExceeded);
        }
        if self.fail_save {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        record.validate()?;
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(StoreError::DuplicateKey(record.id().to_string()));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn query(&self, query: &str) -> Result<Vec<IndexRow>, StoreError> {
        self.pause().await;
        self.queries.lock().unwrap().push(query.to_string());
        if self.uninitialized {
            return Err(StoreError::Uninitialized("/tmp/never-written".into()));
        }
        if self.fail_query {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.record_count() as u64)
    }
}

/// Extractor that always fails.
pub(crate) struct FailingExtractor;

impl ContentExtractor for FailingExtractor {
    fn extract(&self, _bytes: &[u8], _media_type: Option<&str>) -> Result<String, ExtractionError> {
        Err(ExtractionError::MissingField("ext.extracted.text"))
    }
}

/// Loader serving one fixed body for every locator.
pub(crate) struct StaticLoader {
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
    pub loads: AtomicUsize,
}

impl StaticLoader {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            delay: None,
            loads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ResourceLoader for StaticLoader {
    async fn load(&self, locator: &Url) -> Result<Vec<u8>, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if locator.path().ends_with("missing") {
            return Err(LoadError::Status {
                url: locator.clone(),
                status: 404,
            });
        }
        Ok(self.body.clone())
    }
}
