//! Property and class descriptors
//!
//! A mapped type describes itself through [`Mapped::describe`], producing a
//! [`ClassDescriptor`] that lists its properties in declaration order. Each
//! [`PropertyDescriptor`] carries the declared shape, a plain metadata struct,
//! and an explicit getter/setter pair. The model builder reads all of this
//! exactly once per type and configuration.
//!
//! ```ignore
//! impl Mapped for Order {
//!     fn describe() -> ClassDescriptor<Self> {
//!         ClassDescriptor::new("Order")
//!             .table("orders")
//!             .property(
//!                 PropertyDescriptor::new("id", DeclaredType::String)
//!                     .with_metadata(PropertyMetadata::new().hash_key())
//!                     .getter(|o: &Order| o.id.clone().into())
//!                     .setter(|o, v| { o.id = v.into_string("id")?; Ok(()) }),
//!             )
//!     }
//! }
//! ```

use crate::attribute::AttributeType;
use crate::declared::DeclaredType;
use crate::error::Result;
use crate::native::NativeValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Metadata
// ============================================================================

/// Primary key role of a property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyRole {
    /// Not part of the primary key
    #[default]
    None,
    /// Partition key
    Hash,
    /// Sort key
    Range,
}

/// Value generation applied before a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generation {
    /// Random UUID string, assigned only when the current value is null
    Uuid,
    /// Current time, assigned only when the current value is null
    CreatedTimestamp,
    /// Current time, assigned on every write
    UpdatedTimestamp,
    /// Optimistic-locking counter: 1 when null, otherwise incremented
    Version,
}

/// Key role of a property within a secondary index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKey {
    /// Index name
    pub index: String,
    /// Hash or Range within that index
    pub role: KeyRole,
}

/// Mapping metadata attached to one property
///
/// Resolved once at model-build time; never consulted per value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMetadata {
    /// Storage attribute name; defaults to the property name
    pub attribute_name: Option<String>,
    /// Primary key role
    pub key: KeyRole,
    /// Excluded from the model entirely
    pub ignored: bool,
    /// Explicit storage type, overriding inference
    pub type_override: Option<AttributeType>,
    /// Name of a custom converter registered with the configuration
    pub converter: Option<String>,
    /// Value generation before writes
    pub generation: Option<Generation>,
    /// Secondary index key roles
    pub indexes: Vec<IndexKey>,
}

impl PropertyMetadata {
    /// Empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Store under a different attribute name
    pub fn attribute_name(mut self, name: impl Into<String>) -> Self {
        self.attribute_name = Some(name.into());
        self
    }

    /// Mark as the partition key
    pub fn hash_key(mut self) -> Self {
        self.key = KeyRole::Hash;
        self
    }

    /// Mark as the sort key
    pub fn range_key(mut self) -> Self {
        self.key = KeyRole::Range;
        self
    }

    /// Exclude from the model
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Force the storage type
    pub fn typed(mut self, attribute_type: AttributeType) -> Self {
        self.type_override = Some(attribute_type);
        self
    }

    /// Convert through a named custom converter
    pub fn converter(mut self, name: impl Into<String>) -> Self {
        self.converter = Some(name.into());
        self
    }

    /// Generate the value before writes
    pub fn generated(mut self, generation: Generation) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Partition key of a secondary index
    pub fn index_hash_key(mut self, index: impl Into<String>) -> Self {
        self.indexes.push(IndexKey {
            index: index.into(),
            role: KeyRole::Hash,
        });
        self
    }

    /// Sort key of a secondary index
    pub fn index_range_key(mut self, index: impl Into<String>) -> Self {
        self.indexes.push(IndexKey {
            index: index.into(),
            role: KeyRole::Range,
        });
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

/// Reads a property from an instance
pub type Getter<T> = Arc<dyn Fn(&T) -> NativeValue + Send + Sync>;

/// Writes a property into an instance
pub type Setter<T> = Arc<dyn Fn(&mut T, NativeValue) -> Result<()> + Send + Sync>;

/// One declared property of a mapped type
pub struct PropertyDescriptor<T> {
    /// Property name
    pub name: String,
    /// Declared shape, as returned by the getter
    pub declared: DeclaredType,
    /// Mapping metadata
    pub metadata: PropertyMetadata,
    /// Getter, if the property is readable
    pub getter: Option<Getter<T>>,
    /// Setter, if the property is writable
    pub setter: Option<Setter<T>>,
    /// Shape the setter accepts
    pub setter_declared: Option<DeclaredType>,
}

impl<T> PropertyDescriptor<T> {
    /// Describe a property with no accessors yet
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        PropertyDescriptor {
            name: name.into(),
            declared,
            metadata: PropertyMetadata::default(),
            getter: None,
            setter: None,
            setter_declared: None,
        }
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: PropertyMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach a getter
    pub fn getter(mut self, f: impl Fn(&T) -> NativeValue + Send + Sync + 'static) -> Self {
        self.getter = Some(Arc::new(f));
        self
    }

    /// Attach a setter accepting the declared type
    pub fn setter(
        mut self,
        f: impl Fn(&mut T, NativeValue) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.setter_declared = Some(self.declared.clone());
        self.setter = Some(Arc::new(f));
        self
    }

    /// Attach a setter accepting a different shape than the getter returns
    pub fn setter_accepting(
        mut self,
        declared: DeclaredType,
        f: impl Fn(&mut T, NativeValue) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.setter_declared = Some(declared);
        self.setter = Some(Arc::new(f));
        self
    }
}

impl<T> fmt::Debug for PropertyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("metadata", &self.metadata)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

// ============================================================================
// Class descriptor
// ============================================================================

/// Ordered property list for one mapped type
#[derive(Debug)]
pub struct ClassDescriptor<T> {
    /// Type name, used in errors and as the default table name
    pub name: String,
    /// Explicit table name
    pub table_name: Option<String>,
    /// Properties in declaration order
    pub properties: Vec<PropertyDescriptor<T>>,
}

impl<T> ClassDescriptor<T> {
    /// Start a descriptor
    pub fn new(name: impl Into<String>) -> Self {
        ClassDescriptor {
            name: name.into(),
            table_name: None,
            properties: Vec::new(),
        }
    }

    /// Store in the named table
    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Append a property
    pub fn property(mut self, property: PropertyDescriptor<T>) -> Self {
        self.properties.push(property);
        self
    }

    /// Table name before any configured override
    pub fn default_table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.name)
    }
}

/// A type the mapper can persist
///
/// `Default` provides the blank instance that reads populate through setters.
pub trait Mapped: Default + Send + Sync + 'static {
    /// Enumerate the type's properties and metadata
    fn describe() -> ClassDescriptor<Self>;
}
