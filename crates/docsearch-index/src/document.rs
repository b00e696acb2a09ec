//! Document mapping between index records and Tantivy documents.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use tantivy::schema::Value;
use tantivy::TantivyDocument;

use docsearch_types::{Attribute, AttributeKind, AttributeValue, IndexRecord};

use crate::schema::RecordSchema;

/// One query result row: stored attribute name -> value.
///
/// Timestamps are rendered as RFC 3339 strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRow {
    values: BTreeMap<String, String>,
}

impl IndexRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Convert an IndexRecord to a Tantivy document.
///
/// Only attributes present on the record are added.
pub fn record_to_doc(schema: &RecordSchema, record: &IndexRecord) -> TantivyDocument {
    let mut doc = TantivyDocument::default();
    for (attribute, value) in record.attributes() {
        let field = schema.field(attribute);
        match value {
            AttributeValue::Text(text) => doc.add_text(field, text),
            AttributeValue::Timestamp(ts) => {
                doc.add_date(field, tantivy::DateTime::from_timestamp_secs(ts.timestamp()))
            }
            AttributeValue::Locator(url) => doc.add_text(field, url.as_str()),
        }
    }
    doc
}

/// Convert a stored Tantivy document back into a row.
pub fn doc_to_row(schema: &RecordSchema, doc: &TantivyDocument) -> IndexRow {
    let mut row = IndexRow::new();
    for attribute in Attribute::ALL {
        let Some(value) = doc.get_first(schema.field(attribute)) else {
            continue;
        };
        let rendered = match attribute.kind() {
            AttributeKind::Timestamp => value.as_datetime().and_then(|dt| {
                chrono::DateTime::<Utc>::from_timestamp(dt.into_timestamp_secs(), 0)
                    .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }),
            _ => value.as_str().map(str::to_string),
        };
        if let Some(rendered) = rendered {
            row.insert(attribute.name(), rendered);
        }
    }
    row
}
