//! Single entry point for callers.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;
use url::Url;

use docsearch_index::{IndexStore, IndexStoreConfig, TantivyIndexStore};
use docsearch_types::{DocumentId, Settings};

use crate::error::{BuildError, SearchError};
use crate::executor::{LocatorSource, QueryExecutor};
use crate::extract::TextExtractor;
use crate::ingest::{IngestConfig, IngestionManager};
use crate::loader::DefaultResourceLoader;
use crate::payload::IndexPayload;
use crate::translator::QueryTranslator;

pub struct SearchFacade {
    ingestion: IngestionManager,
    executor: QueryExecutor,
}

impl SearchFacade {
    pub fn new(ingestion: IngestionManager, executor: QueryExecutor) -> Self {
        Self {
            ingestion,
            executor,
        }
    }

    /// Open the on-disk index named by `settings` and wire the default
    /// extractor and loader around it.
    pub fn from_settings(settings: &Settings) -> Result<Self, BuildError> {
        settings.validate()?;
        let store = TantivyIndexStore::open(IndexStoreConfig::from_settings(settings))?;
        Self::with_store(Arc::new(store), settings)
    }

    /// Wire the default pipeline around an existing store.
    pub fn with_store(store: Arc<dyn IndexStore>, settings: &Settings) -> Result<Self, BuildError> {
        let extractor = TextExtractor::new().with_max_chars(settings.max_extracted_chars);
        let loader = DefaultResourceLoader::new(settings.extraction_timeout())?;
        let ingestion = IngestionManager::new(
            store.clone(),
            Arc::new(extractor),
            Arc::new(loader),
            IngestConfig::from_settings(settings),
        );

        let translator = Arc::new(QueryTranslator::new(settings.max_query_length));
        let locator_source = LocatorSource::from_settings(settings)?;
        let executor = QueryExecutor::new(
            translator,
            store,
            locator_source.clone(),
            settings.store_timeout(),
        );

        info!(locator_source = ?locator_source, "Search facade ready");
        Ok(Self::new(ingestion, executor))
    }

    /// Index a document. The identifier is validated before any I/O.
    pub async fn index(&self, id: &str, payload: IndexPayload) -> Result<(), SearchError> {
        let id = DocumentId::parse(id)?;
        self.ingestion.index(&id, payload).await
    }

    /// Locators of every record matching `query`.
    pub async fn find(&self, query: &str) -> Result<HashSet<Url>, SearchError> {
        self.executor.find(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{url, MockStore, ID_1};

    fn facade(store: Arc<MockStore>) -> SearchFacade {
        SearchFacade::with_store(store, &Settings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_identifier_is_rejected_before_io() {
        let store = Arc::new(MockStore {
            fail_exists: true,
            ..Default::default()
        });
        let payload =
            IndexPayload::from_bytes("x").with_resource_location(url("https://store.example/r/1"));

        let err = facade(store.clone())
            .index("not-a-valid-id", payload)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
        assert_eq!(store.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_index_then_find_delegate() {
        let store = Arc::new(MockStore::default());
        let facade = facade(store.clone());
        let payload =
            IndexPayload::from_bytes("Winterfell").with_resource_location(url("https://store.example/r/1"));

        facade.index(ID_1, payload).await.unwrap();
        assert_eq!(store.record_count(), 1);

        let result = facade.find("contents LIKE '*Winterfell*'").await.unwrap();
        assert!(result.is_empty());
        assert_eq!(store.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_non_locator_attribute() {
        let settings = Settings {
            locator_attribute: "title".to_string(),
            ..Default::default()
        };
        let result = SearchFacade::with_store(Arc::new(MockStore::default()), &settings);
        assert!(matches!(result, Err(BuildError::Config(_))));
    }
}
