//! Attribute registry.
//!
//! The fixed set of attribute names that may appear in an index record or be
//! referenced by a query. Record accessors, the tantivy schema and query
//! validation are all derived from [`Attribute::ALL`].

use std::collections::BTreeSet;
use std::fmt;

/// How an attribute is stored and matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Tokenized, lower-cased full text
    Text,
    /// Exact, untokenized string
    Keyword,
    /// RFC 3339 timestamp, second precision
    Timestamp,
    /// Absolute URI, matched exactly
    Locator,
}

/// A registered attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Id,
    Contents,
    CountryCode,
    Created,
    Modified,
    Expiration,
    Keyword,
    Title,
    Icid,
    MediaType,
    ResourceLocation,
    FileLocation,
    IrmLocation,
    MetacardLocation,
}

impl Attribute {
    /// Every registered attribute, in schema order.
    pub const ALL: [Attribute; 14] = [
        Attribute::Id,
        Attribute::Contents,
        Attribute::CountryCode,
        Attribute::Created,
        Attribute::Modified,
        Attribute::Expiration,
        Attribute::Keyword,
        Attribute::Title,
        Attribute::Icid,
        Attribute::MediaType,
        Attribute::ResourceLocation,
        Attribute::FileLocation,
        Attribute::IrmLocation,
        Attribute::MetacardLocation,
    ];

    /// Locator attributes, in the order result mapping prefers them.
    pub const LOCATORS: [Attribute; 4] = [
        Attribute::ResourceLocation,
        Attribute::FileLocation,
        Attribute::IrmLocation,
        Attribute::MetacardLocation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Id => "id",
            Attribute::Contents => "contents",
            Attribute::CountryCode => "countryCode",
            Attribute::Created => "created",
            Attribute::Modified => "modified",
            Attribute::Expiration => "expiration",
            Attribute::Keyword => "keyword",
            Attribute::Title => "title",
            Attribute::Icid => "icid",
            Attribute::MediaType => "mediaType",
            Attribute::ResourceLocation => "resourceLocation",
            Attribute::FileLocation => "fileLocation",
            Attribute::IrmLocation => "irmLocation",
            Attribute::MetacardLocation => "metacardLocation",
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Contents | Attribute::Keyword | Attribute::Title => AttributeKind::Text,
            Attribute::Id | Attribute::CountryCode | Attribute::Icid | Attribute::MediaType => {
                AttributeKind::Keyword
            }
            Attribute::Created | Attribute::Modified | Attribute::Expiration => {
                AttributeKind::Timestamp
            }
            Attribute::ResourceLocation
            | Attribute::FileLocation
            | Attribute::IrmLocation
            | Attribute::MetacardLocation => AttributeKind::Locator,
        }
    }

    /// Look up a registered attribute by its exact (case-sensitive) name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    pub fn is_registered(name: &str) -> bool {
        Self::parse(name).is_some()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown attribute: {}", s))
    }
}

/// Names from `names` that are not registered attributes.
pub fn unsupported_attributes<'a, I>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|name| !Attribute::is_registered(name))
        .map(str::to_string)
        .collect()
}
