//! Index record model.
//!
//! One [`IndexRecord`] is persisted per successfully ingested document. The
//! [`RECORD_ACCESSORS`] table maps every registered attribute to a typed
//! getter/setter so the registry and the record cannot drift apart.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::attribute::{Attribute, AttributeKind};
use crate::error::{IdentifierError, RecordError};

/// Required identifier length.
pub const ID_LENGTH: usize = 32;

/// A validated document identifier: exactly 32 ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    pub fn parse(id: &str) -> Result<Self, IdentifierError> {
        // Character check first: once every char is ASCII, byte length and
        // char count agree.
        if let Some(c) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(IdentifierError::InvalidCharacter(c));
        }
        if id.len() != ID_LENGTH {
            return Err(IdentifierError::Length {
                expected: ID_LENGTH,
                actual: id.len(),
            });
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl std::str::FromStr for DocumentId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    Locator(Url),
}

impl AttributeValue {
    pub fn kind_matches(&self, kind: AttributeKind) -> bool {
        matches!(
            (self, kind),
            (AttributeValue::Text(_), AttributeKind::Text)
                | (AttributeValue::Text(_), AttributeKind::Keyword)
                | (AttributeValue::Timestamp(_), AttributeKind::Timestamp)
                | (AttributeValue::Locator(_), AttributeKind::Locator)
        )
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            AttributeValue::Locator(url) => f.write_str(url.as_str()),
        }
    }
}

/// The entity persisted per identifier.
///
/// `id` and `contents` are always present; `contents` is the empty string
/// when extraction produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    id: DocumentId,
    pub contents: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub icid: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub resource_location: Option<Url>,
    #[serde(default)]
    pub file_location: Option<Url>,
    #[serde(default)]
    pub irm_location: Option<Url>,
    #[serde(default)]
    pub metacard_location: Option<Url>,
}

impl IndexRecord {
    pub fn new(id: DocumentId, contents: impl Into<String>) -> Self {
        Self {
            id,
            contents: contents.into(),
            country_code: None,
            created: None,
            modified: None,
            expiration: None,
            keyword: None,
            title: None,
            icid: None,
            media_type: None,
            resource_location: None,
            file_location: None,
            irm_location: None,
            metacard_location: None,
        }
    }

    /// The identifier is fixed at construction.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn with_resource_location(mut self, url: Url) -> Self {
        self.resource_location = Some(url);
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Read an attribute through the accessor table.
    pub fn get(&self, attribute: Attribute) -> Option<AttributeValue> {
        (accessor(attribute).get)(self)
    }

    /// Set an attribute through the accessor table.
    ///
    /// `id` cannot be reassigned.
    pub fn set(&mut self, attribute: Attribute, value: AttributeValue) -> Result<(), RecordError> {
        if !value.kind_matches(attribute.kind()) {
            return Err(RecordError::KindMismatch {
                attribute: attribute.name(),
                expected: attribute.kind(),
            });
        }
        (accessor(attribute).set)(self, value)
    }

    /// Present attributes, in registry order.
    pub fn attributes(&self) -> Vec<(Attribute, AttributeValue)> {
        RECORD_ACCESSORS
            .iter()
            .filter_map(|acc| (acc.get)(self).map(|v| (acc.attribute, v)))
            .collect()
    }

    /// Check the attributes every persisted record must carry.
    pub fn validate(&self) -> Result<(), RecordError> {
        let has_locator = Attribute::LOCATORS
            .iter()
            .any(|attribute| self.get(*attribute).is_some());
        if !has_locator {
            return Err(RecordError::MissingLocator);
        }
        Ok(())
    }
}

type Getter = fn(&IndexRecord) -> Option<AttributeValue>;
type Setter = fn(&mut IndexRecord, AttributeValue) -> Result<(), RecordError>;

/// Typed accessor for one attribute.
pub struct RecordAccessor {
    pub attribute: Attribute,
    pub get: Getter,
    pub set: Setter,
}

macro_rules! text_accessor {
    ($attr:expr, $field:ident) => {
        RecordAccessor {
            attribute: $attr,
            get: |r| r.$field.clone().map(AttributeValue::Text),
            set: |r, v| match v {
                AttributeValue::Text(s) => {
                    r.$field = Some(s);
                    Ok(())
                }
                _ => Err(RecordError::KindMismatch {
                    attribute: $attr.name(),
                    expected: $attr.kind(),
                }),
            },
        }
    };
}

macro_rules! timestamp_accessor {
    ($attr:expr, $field:ident) => {
        RecordAccessor {
            attribute: $attr,
            get: |r| r.$field.map(AttributeValue::Timestamp),
            set: |r, v| match v {
                AttributeValue::Timestamp(ts) => {
                    r.$field = Some(ts);
                    Ok(())
                }
                _ => Err(RecordError::KindMismatch {
                    attribute: $attr.name(),
                    expected: $attr.kind(),
                }),
            },
        }
    };
}

macro_rules! locator_accessor {
    ($attr:expr, $field:ident) => {
        RecordAccessor {
            attribute: $attr,
            get: |r| r.$field.clone().map(AttributeValue::Locator),
            set: |r, v| match v {
                AttributeValue::Locator(url) => {
                    r.$field = Some(url);
                    Ok(())
                }
                _ => Err(RecordError::KindMismatch {
                    attribute: $attr.name(),
                    expected: $attr.kind(),
                }),
            },
        }
    };
}

/// Accessor table, one entry per registered attribute in registry order.
pub static RECORD_ACCESSORS: [RecordAccessor; 14] = [
    RecordAccessor {
        attribute: Attribute::Id,
        get: |r| Some(AttributeValue::Text(r.id.to_string())),
        set: |_, _| Err(RecordError::ImmutableId),
    },
    RecordAccessor {
        attribute: Attribute::Contents,
        get: |r| Some(AttributeValue::Text(r.contents.clone())),
        set: |r, v| match v {
            AttributeValue::Text(s) => {
                r.contents = s;
                Ok(())
            }
            _ => Err(RecordError::KindMismatch {
                attribute: "contents",
                expected: AttributeKind::Text,
            }),
        },
    },
    text_accessor!(Attribute::CountryCode, country_code),
    timestamp_accessor!(Attribute::Created, created),
    timestamp_accessor!(Attribute::Modified, modified),
    timestamp_accessor!(Attribute::Expiration, expiration),
    text_accessor!(Attribute::Keyword, keyword),
    text_accessor!(Attribute::Title, title),
    text_accessor!(Attribute::Icid, icid),
    text_accessor!(Attribute::MediaType, media_type),
    locator_accessor!(Attribute::ResourceLocation, resource_location),
    locator_accessor!(Attribute::FileLocation, file_location),
    locator_accessor!(Attribute::IrmLocation, irm_location),
    locator_accessor!(Attribute::MetacardLocation, metacard_location),
];

fn accessor(attribute: Attribute) -> &'static RecordAccessor {
    // Table is in `Attribute::ALL` order; checked by test_accessor_table_matches_registry.
    let index = Attribute::ALL
        .iter()
        .position(|a| *a == attribute)
        .unwrap_or_default();
    &RECORD_ACCESSORS[index]
}
