//! Table models
//!
//! A [`TableModel`] holds the field models of one mapped type, in declaration
//! order, together with the resolved table name and key layout. It is built
//! once per (type, configuration) and shared as `Arc<TableModel<T>>`; nothing
//! in it changes after construction.
//!
//! # Writes and reads
//!
//! - `convert` omits null non-key attributes and rejects a null key.
//! - `unconvert` starts from `T::default()` and sets every property whose
//!   attribute is present. Missing attributes leave the default in place;
//!   attributes the model does not know are ignored.

use crate::field::FieldModel;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use strata_mapper_convert::ConversionSchema;
use strata_mapper_core::{
    AttributeType, Generation, Item, KeyRole, MapperError, NativeValue, Result,
};

/// One element of a table's primary key schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchemaElement {
    /// Attribute name
    pub attribute_name: String,
    /// Hash or Range
    pub key_type: KeyRole,
}

/// Type declaration of a key attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Attribute name
    pub attribute_name: String,
    /// Stored type (S, N or B)
    pub attribute_type: AttributeType,
}

/// Key layout of one secondary index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKeySchema {
    /// Index name
    pub index: String,
    /// Hash key attribute; the table's own hash key for range-only indexes
    pub hash_key: String,
    /// Range key attribute
    pub range_key: Option<String>,
}

/// All field models for one mapped type
pub struct TableModel<T> {
    pub(crate) type_name: String,
    pub(crate) table_name: String,
    pub(crate) conversion_schema: ConversionSchema,
    pub(crate) fields: Vec<FieldModel<T>>,
    pub(crate) by_property: HashMap<String, usize>,
    pub(crate) by_attribute: HashMap<String, usize>,
    pub(crate) hash_key: usize,
    pub(crate) range_key: Option<usize>,
    pub(crate) index_keys: Vec<IndexKeySchema>,
}

impl<T> TableModel<T> {
    /// Name of the mapped type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Resolved table name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Schema every field was built under
    pub fn conversion_schema(&self) -> ConversionSchema {
        self.conversion_schema
    }

    /// Field models in declaration order
    pub fn fields(&self) -> &[FieldModel<T>] {
        &self.fields
    }

    /// Field model by property name
    pub fn field(&self, property: &str) -> Option<&FieldModel<T>> {
        self.by_property.get(property).map(|&i| &self.fields[i])
    }

    /// Field model by attribute name
    pub fn field_by_attribute(&self, attribute: &str) -> Option<&FieldModel<T>> {
        self.by_attribute.get(attribute).map(|&i| &self.fields[i])
    }

    /// The hash key field
    pub fn hash_key(&self) -> &FieldModel<T> {
        &self.fields[self.hash_key]
    }

    /// The range key field, if the table has one
    pub fn range_key(&self) -> Option<&FieldModel<T>> {
        self.range_key.map(|i| &self.fields[i])
    }

    fn key_fields(&self) -> impl Iterator<Item = &FieldModel<T>> {
        std::iter::once(self.hash_key()).chain(self.range_key())
    }

    /// Primary key schema, hash first
    pub fn key_schema(&self) -> Vec<KeySchemaElement> {
        self.key_fields()
            .map(|f| KeySchemaElement {
                attribute_name: f.attribute_name().to_string(),
                key_type: f.key_role(),
            })
            .collect()
    }

    /// Definitions of every attribute used as a table or index key
    pub fn attribute_definitions(&self) -> Vec<AttributeDefinition> {
        self.fields
            .iter()
            .filter(|f| f.is_key() || !f.indexes().is_empty())
            .map(|f| AttributeDefinition {
                attribute_name: f.attribute_name().to_string(),
                attribute_type: f.attribute_type(),
            })
            .collect()
    }

    /// Secondary index key layouts, ordered by index name
    pub fn index_keys(&self) -> &[IndexKeySchema] {
        &self.index_keys
    }

    /// Convert an instance to an item
    pub fn convert(&self, object: &T) -> Result<Item> {
        let mut item = Item::new();
        for field in &self.fields {
            let value = field.read(object)?;
            if value.is_null() {
                if field.is_key() {
                    return Err(null_key(field));
                }
                continue;
            }
            item.insert(field.attribute_name().to_string(), value);
        }
        Ok(item)
    }

    /// Only the primary key attributes of an instance
    pub fn key(&self, object: &T) -> Result<Item> {
        let mut item = Item::new();
        for field in self.key_fields() {
            let value = field.read(object)?;
            if value.is_null() {
                return Err(null_key(field));
            }
            item.insert(field.attribute_name().to_string(), value);
        }
        Ok(item)
    }

    /// Fill generated attributes before a write
    ///
    /// UUIDs and creation timestamps are assigned only when null; update
    /// timestamps always; versions start at 1 and increment.
    pub fn apply_generated(&self, object: &mut T) -> Result<()> {
        let now = now_millis();
        for field in &self.fields {
            let generation = match field.generation() {
                Some(g) => g,
                None => continue,
            };
            let current = field.get(object);
            let next = match (generation, current) {
                (Generation::Uuid, NativeValue::Null) => {
                    NativeValue::String(uuid::Uuid::new_v4().to_string())
                }
                (Generation::CreatedTimestamp, NativeValue::Null) => NativeValue::Date(now),
                (Generation::Uuid, _) | (Generation::CreatedTimestamp, _) => continue,
                (Generation::UpdatedTimestamp, _) => NativeValue::Date(now),
                (Generation::Version, NativeValue::Null) => NativeValue::Int(1),
                (Generation::Version, NativeValue::Int(v)) => {
                    NativeValue::Int(v.checked_add(1).ok_or_else(|| {
                        MapperError::parse(field.property(), "version counter overflow")
                    })?)
                }
                (Generation::Version, other) => {
                    return Err(MapperError::type_mismatch(
                        field.property(),
                        "Int",
                        other.type_name(),
                    ))
                }
            };
            field.set(object, next)?;
        }
        Ok(())
    }
}

impl<T: Default> TableModel<T> {
    /// Build an instance from an item
    pub fn unconvert(&self, item: &Item) -> Result<T> {
        let mut object = T::default();
        for field in &self.fields {
            if let Some(value) = item.get(field.attribute_name()) {
                field.write(&mut object, value)?;
            }
        }
        Ok(object)
    }
}

impl<T> fmt::Debug for TableModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableModel")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("conversion_schema", &self.conversion_schema)
            .field("fields", &self.fields)
            .finish()
    }
}

fn null_key<T>(field: &FieldModel<T>) -> MapperError {
    MapperError::type_mismatch(field.property(), field.attribute_type().to_string(), "Null")
}

/// Current time truncated to the millisecond precision the store keeps
fn now_millis() -> chrono::DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_millis_opt(now.timestamp_millis())
        .single()
        .unwrap_or(now)
}
