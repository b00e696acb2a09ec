//! Tantivy schema definition for index records.
//!
//! One field per registered attribute:
//! - Text attributes: TEXT | STORED
//! - Keyword and locator attributes: STRING | STORED
//! - Timestamp attributes: date fields, INDEXED | STORED | FAST (range queries)

use tantivy::schema::{Field, Schema, FAST, INDEXED, STORED, STRING, TEXT};

use docsearch_types::{Attribute, AttributeKind};

use crate::StoreError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct RecordSchema {
    schema: Schema,
    /// Field handles in `Attribute::ALL` order
    fields: Vec<Field>,
}

impl RecordSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Field handle for an attribute.
    pub fn field(&self, attribute: Attribute) -> Field {
        let index = Attribute::ALL
            .iter()
            .position(|a| *a == attribute)
            .unwrap_or_default();
        self.fields[index]
    }

    /// Create a RecordSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, StoreError> {
        let fields = Attribute::ALL
            .iter()
            .map(|attribute| {
                schema.get_field(attribute.name()).map_err(|_| {
                    StoreError::SchemaMismatch(format!("missing {} field", attribute.name()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { schema, fields })
    }
}

/// Build the record schema from the attribute registry.
pub fn build_record_schema() -> RecordSchema {
    let mut schema_builder = Schema::builder();

    let fields = Attribute::ALL
        .iter()
        .map(|attribute| match attribute.kind() {
            AttributeKind::Text => schema_builder.add_text_field(attribute.name(), TEXT | STORED),
            AttributeKind::Keyword | AttributeKind::Locator => {
                schema_builder.add_text_field(attribute.name(), STRING | STORED)
            }
            AttributeKind::Timestamp => {
                schema_builder.add_date_field(attribute.name(), INDEXED | STORED | FAST)
            }
        })
        .collect();

    RecordSchema {
        schema: schema_builder.build(),
        fields,
    }
}
