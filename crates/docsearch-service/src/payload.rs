//! What a caller hands the ingestion pipeline.

use chrono::{DateTime, Utc};
use url::Url;

use docsearch_types::{DocumentId, IndexRecord};

/// Where the document content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Bytes(Vec<u8>),
    /// Read through a resource loader.
    Locator(Url),
}

/// Locator attributes stored with the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locations {
    pub resource: Option<Url>,
    pub file: Option<Url>,
    pub irm: Option<Url>,
    pub metacard: Option<Url>,
}

impl Locations {
    pub fn is_empty(&self) -> bool {
        self.resource.is_none()
            && self.file.is_none()
            && self.irm.is_none()
            && self.metacard.is_none()
    }
}

/// Content plus the attributes to store alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPayload {
    pub content: ContentSource,
    pub media_type: Option<String>,
    pub locations: Locations,
    pub country_code: Option<String>,
    pub title: Option<String>,
    pub keyword: Option<String>,
    pub icid: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub expiration: Option<DateTime<Utc>>,
}

impl IndexPayload {
    pub fn new(content: ContentSource) -> Self {
        Self {
            content,
            media_type: None,
            locations: Locations::default(),
            country_code: None,
            title: None,
            keyword: None,
            icid: None,
            created: None,
            modified: None,
            expiration: None,
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(ContentSource::Bytes(bytes.into()))
    }

    pub fn from_locator(locator: Url) -> Self {
        Self::new(ContentSource::Locator(locator))
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_resource_location(mut self, url: Url) -> Self {
        self.locations.resource = Some(url);
        self
    }

    pub fn with_file_location(mut self, url: Url) -> Self {
        self.locations.file = Some(url);
        self
    }

    pub fn with_irm_location(mut self, url: Url) -> Self {
        self.locations.irm = Some(url);
        self
    }

    pub fn with_metacard_location(mut self, url: Url) -> Self {
        self.locations.metacard = Some(url);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn has_locator(&self) -> bool {
        !self.locations.is_empty()
    }
}

/// Payload attributes that become part of the record.
#[derive(Debug, Clone)]
pub(crate) struct RecordAttributes {
    media_type: Option<String>,
    locations: Locations,
    country_code: Option<String>,
    title: Option<String>,
    keyword: Option<String>,
    icid: Option<String>,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
    expiration: Option<DateTime<Utc>>,
}

impl IndexPayload {
    /// Split into the content to extract and the attributes to store.
    pub(crate) fn into_parts(self) -> (ContentSource, RecordAttributes) {
        let attributes = RecordAttributes {
            media_type: self.media_type,
            locations: self.locations,
            country_code: self.country_code,
            title: self.title,
            keyword: self.keyword,
            icid: self.icid,
            created: self.created,
            modified: self.modified,
            expiration: self.expiration,
        };
        (self.content, attributes)
    }
}

impl RecordAttributes {
    pub(crate) fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub(crate) fn into_record(self, id: DocumentId, contents: String) -> IndexRecord {
        let mut record = IndexRecord::new(id, contents);
        record.media_type = self.media_type;
        record.resource_location = self.locations.resource;
        record.file_location = self.locations.file;
        record.irm_location = self.locations.irm;
        record.metacard_location = self.locations.metacard;
        record.country_code = self.country_code;
        record.title = self.title;
        record.keyword = self.keyword;
        record.icid = self.icid;
        record.created = self.created;
        record.modified = self.modified;
        record.expiration = self.expiration;
        record
    }
}
