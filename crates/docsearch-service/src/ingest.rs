//! Ingestion pipeline: uniqueness check, extraction, persistence.
//!
//! The existence check is only a fast path that yields a friendlier error.
//! A concurrent ingestion of the same id is caught by the store's own
//! duplicate-key check on save and reported the same way.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use docsearch_index::{IndexStore, StoreError};
use docsearch_types::{DocumentId, RecordError, Settings};

use crate::error::{ExtractionError, SearchError};
use crate::extract::ContentExtractor;
use crate::loader::ResourceLoader;
use crate::payload::{ContentSource, IndexPayload};

/// Deadlines for the blocking steps of ingestion.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Loading plus extraction
    pub extraction_timeout: Duration,
    /// Existence check timeout, and how long a save may wait before it
    /// starts writing
    pub store_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extraction_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(10),
        }
    }
}

impl IngestConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            extraction_timeout: settings.extraction_timeout(),
            store_timeout: settings.store_timeout(),
        }
    }
}

pub struct IngestionManager {
    store: Arc<dyn IndexStore>,
    extractor: Arc<dyn ContentExtractor>,
    loader: Arc<dyn ResourceLoader>,
    config: IngestConfig,
}

impl IngestionManager {
    pub fn new(
        store: Arc<dyn IndexStore>,
        extractor: Arc<dyn ContentExtractor>,
        loader: Arc<dyn ResourceLoader>,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            loader,
            config,
        }
    }

    /// Index one document under `id`.
    ///
    /// On success exactly one record was written; on any failure none was,
    /// and the id stays available for a retry.
    pub async fn index(&self, id: &DocumentId, payload: IndexPayload) -> Result<(), SearchError> {
        self.check_unique(id).await?;

        if !payload.has_locator() {
            return Err(SearchError::PersistFailed {
                id: id.clone(),
                source: StoreError::MissingAttribute(RecordError::MissingLocator),
            });
        }

        let (content, attributes) = payload.into_parts();
        let media_type = attributes.media_type().map(str::to_string);

        let contents = match timeout(
            self.config.extraction_timeout,
            self.extract(content, media_type),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ExtractionError::Timeout(self.config.extraction_timeout)),
        }
        .map_err(|source| SearchError::ExtractionFailed {
            id: id.clone(),
            source,
        })?;

        let chars = contents.chars().count();
        let record = attributes.into_record(id.clone(), contents);

        // The store checks this deadline before writing; the save itself is
        // never cancelled, so a failure here means nothing was stored.
        let deadline = Instant::now() + self.config.store_timeout;
        match self.store.save(&record, deadline).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                warn!(id = %id, "Lost race to index duplicate identifier");
                return Err(SearchError::DuplicateIdentifier(id.clone()));
            }
            Err(source) => {
                return Err(SearchError::PersistFailed {
                    id: id.clone(),
                    source,
                })
            }
        }

        info!(id = %id, chars, "Indexed document");
        Ok(())
    }

    async fn check_unique(&self, id: &DocumentId) -> Result<(), SearchError> {
        let exists = match timeout(self.config.store_timeout, self.store.exists(id)).await {
            Ok(result) => result.map_err(SearchError::IndexUnavailable)?,
            Err(_) => {
                return Err(SearchError::IndexUnavailable(StoreError::Timeout(
                    self.config.store_timeout,
                )))
            }
        };

        if exists {
            warn!(id = %id, "Rejected duplicate identifier");
            return Err(SearchError::DuplicateIdentifier(id.clone()));
        }
        Ok(())
    }

    async fn extract(
        &self,
        content: ContentSource,
        media_type: Option<String>,
    ) -> Result<String, ExtractionError> {
        let bytes = match content {
            ContentSource::Bytes(bytes) => bytes,
            ContentSource::Locator(locator) => self.loader.load(&locator).await?,
        };
        debug!(bytes = bytes.len(), media_type = ?media_type, "Extracting content");

        let extractor = self.extractor.clone();
        tokio::task::spawn_blocking(move || extractor.extract(&bytes, media_type.as_deref()))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, LoadError};
    use crate::extract::TextExtractor;
    use crate::test_support::{id, url, FailingExtractor, MockStore, StaticLoader, ID_1, ID_2};

    fn manager(store: Arc<MockStore>) -> IngestionManager {
        IngestionManager::new(
            store,
            Arc::new(TextExtractor::new()),
            Arc::new(StaticLoader::new("loaded text")),
            IngestConfig::default(),
        )
    }

    fn payload(text: &str) -> IndexPayload {
        IndexPayload::from_bytes(text).with_resource_location(url("https://store.example/r/1"))
    }

    #[tokio::test]
    async fn test_index_writes_one_record() {
        let store = Arc::new(MockStore::default());
        manager(store.clone())
            .index(&id(ID_1), payload("Winterfell").with_title("North"))
            .await
            .unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contents, "Winterfell");
        assert_eq!(records[0].title.as_deref(), Some("North"));
    }

    #[tokio::test]
    async fn test_second_index_of_same_id_is_duplicate() {
        let store = Arc::new(MockStore::default());
        let manager = manager(store.clone());

        manager.index(&id(ID_1), payload("first")).await.unwrap();
        let err = manager.index(&id(ID_1), payload("second")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DuplicateIdentifier);
        assert_eq!(store.save_calls(), 1);
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_existence_check_aborts_before_extraction() {
        let store = Arc::new(MockStore {
            fail_exists: true,
            ..Default::default()
        });
        let loader = Arc::new(StaticLoader::new("unused"));
        let manager = IngestionManager::new(
            store.clone(),
            Arc::new(TextExtractor::new()),
            loader.clone(),
            IngestConfig::default(),
        );

        let payload = IndexPayload::from_locator(url("https://files.example/doc"))
            .with_resource_location(url("https://store.example/r/1"));
        let err = manager.index(&id(ID_1), payload).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
        assert_eq!(loader.loads.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(store.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_leaves_id_reusable() {
        let store = Arc::new(MockStore::default());
        let failing = IngestionManager::new(
            store.clone(),
            Arc::new(FailingExtractor),
            Arc::new(StaticLoader::new("")),
            IngestConfig::default(),
        );

        let err = failing.index(&id(ID_1), payload("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
        assert_eq!(store.save_calls(), 0);

        manager(store.clone())
            .index(&id(ID_1), payload("retry"))
            .await
            .unwrap();
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_extraction_failure() {
        let store = Arc::new(MockStore::default());
        let payload = IndexPayload::from_locator(url("https://files.example/missing"))
            .with_resource_location(url("https://store.example/r/1"));

        let err = manager(store.clone())
            .index(&id(ID_1), payload)
            .await
            .unwrap_err();

        match err {
            SearchError::ExtractionFailed { source, .. } => {
                assert!(matches!(
                    source,
                    ExtractionError::Load(LoadError::Status { status: 404, .. })
                ));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_locator_content_is_loaded() {
        let store = Arc::new(MockStore::default());
        let payload = IndexPayload::from_locator(url("https://files.example/doc"))
            .with_file_location(url("file:///data/doc.txt"));

        manager(store.clone()).index(&id(ID_2), payload).await.unwrap();
        assert_eq!(store.records.lock().unwrap()[0].contents, "loaded text");
    }

    #[tokio::test]
    async fn test_missing_locator_fails_without_touching_store() {
        let store = Arc::new(MockStore::default());
        let err = manager(store.clone())
            .index(&id(ID_1), IndexPayload::from_bytes("no locator"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PersistFailed);
        assert_eq!(store.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_save_failure_is_persist_failed() {
        let store = Arc::new(MockStore {
            fail_save: true,
            ..Default::default()
        });
        let err = manager(store.clone())
            .index(&id(ID_1), payload("x"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PersistFailed);
        assert!(!err.is_caller_error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extraction_timeout() {
        let store = Arc::new(MockStore::default());
        let mut loader = StaticLoader::new("slow");
        loader.delay = Some(Duration::from_secs(60));
        let manager = IngestionManager::new(
            store.clone(),
            Arc::new(TextExtractor::new()),
            Arc::new(loader),
            IngestConfig {
                extraction_timeout: Duration::from_secs(1),
                store_timeout: Duration::from_secs(10),
            },
        );

        let payload = IndexPayload::from_locator(url("https://files.example/doc"))
            .with_resource_location(url("https://store.example/r/1"));
        let err = manager.index(&id(ID_1), payload).await.unwrap_err();

        assert!(matches!(
            err,
            SearchError::ExtractionFailed {
                source: ExtractionError::Timeout(_),
                ..
            }
        ));
        assert_eq!(store.save_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_timeout_on_existence_check() {
        let store = Arc::new(MockStore {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let err = manager(store).index(&id(ID_1), payload("x")).await.unwrap_err();

        assert!(matches!(
            err,
            SearchError::IndexUnavailable(StoreError::Timeout(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_save_fails_without_storing() {
        let store = Arc::new(MockStore {
            save_delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let err = manager(store.clone())
            .index(&id(ID_1), payload("x"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SearchError::PersistFailed {
                source: StoreError::DeadlineExceeded,
                ..
            }
        ));
        assert_eq!(store.record_count(), 0);

        assert!(!store.exists(&id(ID_1)).await.unwrap());
    }
}
