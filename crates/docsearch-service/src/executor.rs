//! Query execution and result mapping.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use docsearch_index::{IndexRow, IndexStore, StoreError};
use docsearch_types::{Attribute, AttributeKind, ConfigError, Settings};

use crate::error::SearchError;
use crate::translator::QueryTranslator;

/// How a result row becomes a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorSource {
    /// Read a stored locator attribute.
    Attribute(Attribute),
    /// Append the row's id to a retrieve endpoint.
    RetrieveEndpoint(Url),
}

impl Default for LocatorSource {
    fn default() -> Self {
        LocatorSource::Attribute(Attribute::ResourceLocation)
    }
}

impl LocatorSource {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        if let Some(endpoint) = &settings.retrieve_endpoint {
            let url = Url::parse(endpoint)
                .map_err(|e| ConfigError(format!("retrieve_endpoint: {}", e)))?;
            return Ok(LocatorSource::RetrieveEndpoint(url));
        }
        match Attribute::parse(&settings.locator_attribute) {
            Some(attribute) if attribute.kind() == AttributeKind::Locator => {
                Ok(LocatorSource::Attribute(attribute))
            }
            _ => Err(ConfigError(format!(
                "{} is not a locator attribute",
                settings.locator_attribute
            ))),
        }
    }

    /// Map one row. `Ok(None)` means the row has nothing to map.
    fn locate(&self, row: &IndexRow) -> Result<Option<Url>, SearchError> {
        match self {
            LocatorSource::Attribute(attribute) => {
                let Some(value) = row.get(attribute.name()) else {
                    return Ok(None);
                };
                Url::parse(value)
                    .map(Some)
                    .map_err(|source| SearchError::ResultMappingFailed {
                        attribute: attribute.name().to_string(),
                        value: value.to_string(),
                        source,
                    })
            }
            LocatorSource::RetrieveEndpoint(endpoint) => {
                let Some(id) = row.get(Attribute::Id.name()) else {
                    return Ok(None);
                };
                let value = format!("{}/{}", endpoint.as_str().trim_end_matches('/'), id);
                Url::parse(&value)
                    .map(Some)
                    .map_err(|source| SearchError::ResultMappingFailed {
                        attribute: Attribute::Id.name().to_string(),
                        value,
                        source,
                    })
            }
        }
    }
}

pub struct QueryExecutor {
    translator: Arc<QueryTranslator>,
    store: Arc<dyn IndexStore>,
    locator_source: LocatorSource,
    store_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(
        translator: Arc<QueryTranslator>,
        store: Arc<dyn IndexStore>,
        locator_source: LocatorSource,
        store_timeout: Duration,
    ) -> Self {
        Self {
            translator,
            store,
            locator_source,
            store_timeout,
        }
    }

    /// Run a filter query and return the locators of matching records.
    pub async fn find(&self, query: &str) -> Result<HashSet<Url>, SearchError> {
        let rendered = self.translator.translate(query)?;

        let rows = match timeout(self.store_timeout, self.store.query(&rendered)).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) if e.is_uninitialized() => {
                // Nothing was ever written, so nothing can match.
                warn!(error = %e, "Queried an empty index, returning no results");
                return Ok(HashSet::new());
            }
            Ok(Err(e)) => return Err(SearchError::QueryExecutionFailed(e)),
            Err(_) => {
                return Err(SearchError::QueryExecutionFailed(StoreError::Timeout(
                    self.store_timeout,
                )))
            }
        };

        let mut locators = HashSet::with_capacity(rows.len());
        for row in &rows {
            match self.locator_source.locate(row)? {
                Some(locator) => {
                    locators.insert(locator);
                }
                None => debug!(id = row.get("id"), "Skipping result row without a locator"),
            }
        }

        info!(rows = rows.len(), locators = locators.len(), "Query complete");
        Ok(locators)
    }
}
