//! Application-side values
//!
//! `NativeValue` is what property getters return and setters accept. It is the
//! dynamic image of an application field: the marshallers translate it to and
//! from `AttributeValue`.

use crate::error::{MapperError, Result};
use crate::number::Number;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A reference to an object held by an external resource service
///
/// Stored as JSON text. The `location` may be left empty when the
/// configured resolver supplies a default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalReference {
    /// Container or region of the referenced object
    #[serde(default)]
    pub location: String,
    /// Key of the referenced object inside its location
    pub key: String,
}

impl ExternalReference {
    /// Create a reference
    pub fn new(location: impl Into<String>, key: impl Into<String>) -> Self {
        ExternalReference {
            location: location.into(),
            key: key.into(),
        }
    }
}

/// Dynamic application value
///
/// `Set` keeps elements in a vector; whether they are distinct is checked by
/// the set marshallers at convert time. `Document` holds a nested mapped
/// object keyed by property name.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Absent / null
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Arbitrary-precision decimal
    Decimal(Number),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Instant in UTC
    Date(DateTime<Utc>),
    /// Enum variant name
    Enum(String),
    /// External object reference
    Reference(ExternalReference),
    /// Ordered collection
    List(Vec<NativeValue>),
    /// Unordered collection of distinct elements
    Set(Vec<NativeValue>),
    /// String-keyed map
    Map(BTreeMap<String, NativeValue>),
    /// Nested mapped object, keyed by property name
    Document(BTreeMap<String, NativeValue>),
}

impl NativeValue {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Null => "Null",
            NativeValue::Bool(_) => "Bool",
            NativeValue::Int(_) => "Int",
            NativeValue::Float(_) => "Float",
            NativeValue::Decimal(_) => "Decimal",
            NativeValue::String(_) => "String",
            NativeValue::Bytes(_) => "Bytes",
            NativeValue::Date(_) => "Date",
            NativeValue::Enum(_) => "Enum",
            NativeValue::Reference(_) => "Reference",
            NativeValue::List(_) => "List",
            NativeValue::Set(_) => "Set",
            NativeValue::Map(_) => "Map",
            NativeValue::Document(_) => "Document",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            NativeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as &str if this is a String or Enum value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) | NativeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Get as DateTime if this is a Date value
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            NativeValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

// ============================================================================
// Setter helpers
// ============================================================================
//
// Property setters receive a `NativeValue` and move it into a typed field.
// These helpers do the unwrapping and report a `TypeMismatch` naming the
// property when the value has the wrong shape.

macro_rules! into_variant {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $ty:ty, $expected:literal) => {
        $(#[$doc])*
        pub fn $fn_name(self, property: &str) -> Result<$ty> {
            match self {
                NativeValue::$variant(v) => Ok(v),
                other => Err(MapperError::type_mismatch(property, $expected, other.type_name())),
            }
        }
    };
}

impl NativeValue {
    into_variant!(
        /// Unwrap a Bool value
        into_bool, Bool, bool, "Bool"
    );
    into_variant!(
        /// Unwrap an Int value
        into_int, Int, i64, "Int"
    );
    into_variant!(
        /// Unwrap a Float value
        into_float, Float, f64, "Float"
    );
    into_variant!(
        /// Unwrap a Decimal value
        into_decimal, Decimal, Number, "Decimal"
    );
    into_variant!(
        /// Unwrap a String value
        into_string, String, String, "String"
    );
    into_variant!(
        /// Unwrap a Bytes value
        into_bytes, Bytes, Vec<u8>, "Bytes"
    );
    into_variant!(
        /// Unwrap a Date value
        into_date, Date, DateTime<Utc>, "Date"
    );
    into_variant!(
        /// Unwrap an Enum value
        into_enum, Enum, String, "Enum"
    );
    into_variant!(
        /// Unwrap a Reference value
        into_reference, Reference, ExternalReference, "Reference"
    );
    into_variant!(
        /// Unwrap a List value
        into_list, List, Vec<NativeValue>, "List"
    );
    into_variant!(
        /// Unwrap a Set value
        into_set, Set, Vec<NativeValue>, "Set"
    );
    into_variant!(
        /// Unwrap a Map value
        into_map, Map, BTreeMap<String, NativeValue>, "Map"
    );
    into_variant!(
        /// Unwrap a Document value
        into_document, Document, BTreeMap<String, NativeValue>, "Document"
    );

    /// `None` for Null, otherwise apply `f`
    pub fn into_option<T>(
        self,
        property: &str,
        f: impl FnOnce(NativeValue, &str) -> Result<T>,
    ) -> Result<Option<T>> {
        match self {
            NativeValue::Null => Ok(None),
            other => f(other, property).map(Some),
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::String(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::String(s)
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        NativeValue::Bool(b)
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> Self {
        NativeValue::Int(i)
    }
}

impl From<f64> for NativeValue {
    fn from(f: f64) -> Self {
        NativeValue::Float(f)
    }
}

impl From<Number> for NativeValue {
    fn from(n: Number) -> Self {
        NativeValue::Decimal(n)
    }
}

impl From<Vec<u8>> for NativeValue {
    fn from(b: Vec<u8>) -> Self {
        NativeValue::Bytes(b)
    }
}

impl From<DateTime<Utc>> for NativeValue {
    fn from(d: DateTime<Utc>) -> Self {
        NativeValue::Date(d)
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(NativeValue::Null)
    }
}
