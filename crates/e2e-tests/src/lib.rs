//! End-to-end test infrastructure for docsearch.
//!
//! Provides a shared TestHarness wiring the real pipeline around an on-disk
//! Tantivy index in a temp directory.

use std::path::PathBuf;
use std::sync::Arc;

use rand::distr::{Alphanumeric, SampleString};
use url::Url;

use docsearch_index::{IndexStore, IndexStoreConfig, TantivyIndexStore};
use docsearch_service::{IndexPayload, SearchFacade};
use docsearch_types::Settings;

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Store handle for inspecting what was written
    pub store: Arc<TantivyIndexStore>,
    /// Facade under test, sharing `store`
    pub facade: SearchFacade,
    pub index_path: PathBuf,
    pub settings: Settings,
}

impl TestHarness {
    /// Harness with default settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Harness with `settings`; the index path is always a fresh temp dir.
    pub fn with_settings(mut settings: Settings) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let index_path = temp_dir.path().join("index");
        settings.index_path = index_path.to_string_lossy().to_string();

        let store = Arc::new(
            TantivyIndexStore::open(IndexStoreConfig::from_settings(&settings))
                .expect("Failed to open index store"),
        );
        let facade = SearchFacade::with_store(store.clone(), &settings)
            .expect("Failed to build search facade");

        Self {
            _temp_dir: temp_dir,
            store,
            facade,
            index_path,
            settings,
        }
    }

    /// Number of records in the store.
    pub async fn count(&self) -> u64 {
        self.store.count().await.expect("Failed to count records")
    }

    /// Directory for fixture files, inside the temp dir.
    pub fn fixture_dir(&self) -> PathBuf {
        let dir = self._temp_dir.path().join("fixtures");
        std::fs::create_dir_all(&dir).expect("Failed to create fixture dir");
        dir
    }

    /// Write a fixture file and return its file:// locator.
    pub fn write_fixture(&self, name: &str, contents: &[u8]) -> Url {
        let path = self.fixture_dir().join(name);
        std::fs::write(&path, contents).expect("Failed to write fixture");
        Url::from_file_path(&path).expect("Fixture path is not absolute")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Random valid document id.
pub fn random_id() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 32)
}

/// Locator used as a record's resourceLocation.
pub fn resource_url(name: &str) -> Url {
    Url::parse(&format!("https://store.example/resources/{}", name))
        .expect("Failed to build resource URL")
}

/// Plain-text payload stored under `resource_url(name)`.
pub fn text_payload(text: &str, name: &str) -> IndexPayload {
    IndexPayload::from_bytes(text)
        .with_media_type("text/plain")
        .with_resource_location(resource_url(name))
}
