//! Declared property types
//!
//! A `DeclaredType` describes the shape of an application field the way its
//! source declares it: a scalar, a parameterized collection, an enum, a nested
//! document, or an opaque type that only a custom converter understands.
//!
//! Collection parameters are optional. `List(None)` is a raw collection whose
//! element type was never resolved; the classifier rejects it unless the
//! property carries an explicit type override.

use crate::descriptor::PropertyMetadata;
use std::fmt;
use std::sync::Arc;

/// Shape descriptor for one property
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    /// Boolean
    Bool,
    /// Signed integer
    Integer,
    /// Binary floating point
    Float,
    /// Arbitrary-precision decimal
    Decimal,
    /// UTF-8 string
    String,
    /// Byte sequence
    Bytes,
    /// Date / instant
    Date,
    /// Enumeration with a closed set of variant names
    Enum(Arc<EnumType>),
    /// Reference to an object held by an external resource service
    Reference,
    /// Ordered collection with optional element type
    List(Option<Box<DeclaredType>>),
    /// Unordered collection with optional element type
    Set(Option<Box<DeclaredType>>),
    /// Map with optional key and value types
    Map(Option<Box<DeclaredType>>, Option<Box<DeclaredType>>),
    /// Nested mapped object
    Document(Arc<DocumentType>),
    /// Application type with no built-in shape, identified by name
    Opaque(String),
}

impl DeclaredType {
    /// `List<elem>`
    pub fn list_of(elem: DeclaredType) -> Self {
        DeclaredType::List(Some(Box::new(elem)))
    }

    /// `Set<elem>`
    pub fn set_of(elem: DeclaredType) -> Self {
        DeclaredType::Set(Some(Box::new(elem)))
    }

    /// `Map<String, value>`
    pub fn map_of(value: DeclaredType) -> Self {
        DeclaredType::Map(
            Some(Box::new(DeclaredType::String)),
            Some(Box::new(value)),
        )
    }

    /// Enumeration over the given variant names
    pub fn enumeration<I, S>(name: &str, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DeclaredType::Enum(Arc::new(EnumType {
            name: name.to_string(),
            variants: variants.into_iter().map(Into::into).collect(),
        }))
    }

    /// Opaque application type
    pub fn opaque(name: impl Into<String>) -> Self {
        DeclaredType::Opaque(name.into())
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn param(f: &mut fmt::Formatter<'_>, p: &Option<Box<DeclaredType>>) -> fmt::Result {
            match p {
                Some(t) => write!(f, "{}", t),
                None => f.write_str("?"),
            }
        }

        match self {
            DeclaredType::Bool => f.write_str("Bool"),
            DeclaredType::Integer => f.write_str("Integer"),
            DeclaredType::Float => f.write_str("Float"),
            DeclaredType::Decimal => f.write_str("Decimal"),
            DeclaredType::String => f.write_str("String"),
            DeclaredType::Bytes => f.write_str("Bytes"),
            DeclaredType::Date => f.write_str("Date"),
            DeclaredType::Enum(e) => write!(f, "enum {}", e.name),
            DeclaredType::Reference => f.write_str("Reference"),
            DeclaredType::List(elem) => {
                f.write_str("List<")?;
                param(f, elem)?;
                f.write_str(">")
            }
            DeclaredType::Set(elem) => {
                f.write_str("Set<")?;
                param(f, elem)?;
                f.write_str(">")
            }
            DeclaredType::Map(key, value) => {
                f.write_str("Map<")?;
                param(f, key)?;
                f.write_str(", ")?;
                param(f, value)?;
                f.write_str(">")
            }
            DeclaredType::Document(d) => write!(f, "document {}", d.name),
            DeclaredType::Opaque(name) => f.write_str(name),
        }
    }
}

/// Closed set of enum variant names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// Enum type name
    pub name: String,
    /// Variant names in declaration order
    pub variants: Vec<String>,
}

impl EnumType {
    /// True when `name` is one of the variants
    pub fn has_variant(&self, name: &str) -> bool {
        self.variants.iter().any(|v| v == name)
    }
}

/// A nested mapped object stored as a map attribute
///
/// Documents carry no accessors: their native image is
/// `NativeValue::Document`, keyed by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentType {
    /// Document type name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<DocumentField>,
}

impl DocumentType {
    /// Start an empty document type
    pub fn new(name: impl Into<String>) -> Self {
        DocumentType {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field with default metadata
    pub fn field(self, name: impl Into<String>, declared: DeclaredType) -> Self {
        self.field_with(name, declared, PropertyMetadata::default())
    }

    /// Add a field with explicit metadata
    pub fn field_with(
        mut self,
        name: impl Into<String>,
        declared: DeclaredType,
        metadata: PropertyMetadata,
    ) -> Self {
        self.fields.push(DocumentField {
            name: name.into(),
            declared,
            metadata,
        });
        self
    }

    /// Wrap into a declared type
    pub fn into_declared(self) -> DeclaredType {
        DeclaredType::Document(Arc::new(self))
    }
}

/// One field of a document type
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentField {
    /// Field name (key in `NativeValue::Document`)
    pub name: String,
    /// Declared shape
    pub declared: DeclaredType,
    /// Attached metadata; key roles are ignored inside documents
    pub metadata: PropertyMetadata,
}
