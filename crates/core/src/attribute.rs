//! Attribute types and values
//!
//! This module defines:
//! - AttributeType: the storage category a modeled property maps to
//! - AttributeValue: the store's tagged-union wire representation
//! - Item: an attribute map keyed by attribute name
//!
//! ## Wire JSON
//!
//! `AttributeValue` renders to the store's JSON wire form, one single-key
//! object per value: `{"S": "..."}`, `{"N": "12.5"}`, `{"B": "<base64>"}`,
//! `{"SS": [...]}`, `{"NS": [...]}`, `{"BS": [...]}`, `{"L": [...]}`,
//! `{"M": {...}}`, `{"BOOL": true}`, `{"NULL": true}`.

use crate::number::Number;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

/// An attribute map, as read from or written to the store
pub type Item = BTreeMap<String, AttributeValue>;

// ============================================================================
// AttributeType
// ============================================================================

/// Storage category of a modeled property
///
/// Exactly one variant is assigned to each property when its table model is
/// built. Classification is deterministic for a given declared type and
/// metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    /// `BOOL`
    Boolean,
    /// `S`
    String,
    /// `N`
    Number,
    /// `B`
    Binary,
    /// `SS`
    StringSet,
    /// `NS`
    NumberSet,
    /// `BS`
    BinarySet,
    /// `L`
    List,
    /// `M`
    Map,
}

impl AttributeType {
    /// All attribute types (for iteration)
    pub const ALL: [AttributeType; 9] = [
        AttributeType::Boolean,
        AttributeType::String,
        AttributeType::Number,
        AttributeType::Binary,
        AttributeType::StringSet,
        AttributeType::NumberSet,
        AttributeType::BinarySet,
        AttributeType::List,
        AttributeType::Map,
    ];

    /// Wire tag used by the store (`S`, `N`, `SS`, ...)
    pub fn wire_tag(&self) -> &'static str {
        match self {
            AttributeType::Boolean => "BOOL",
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
            AttributeType::StringSet => "SS",
            AttributeType::NumberSet => "NS",
            AttributeType::BinarySet => "BS",
            AttributeType::List => "L",
            AttributeType::Map => "M",
        }
    }

    /// True for `SS`, `NS` and `BS`
    pub fn is_set(&self) -> bool {
        matches!(
            self,
            AttributeType::StringSet | AttributeType::NumberSet | AttributeType::BinarySet
        )
    }

    /// True for types allowed as hash or range key attributes
    pub fn is_key_type(&self) -> bool {
        matches!(
            self,
            AttributeType::String | AttributeType::Number | AttributeType::Binary
        )
    }

    /// The set type whose elements have this scalar type
    pub fn set_of(&self) -> Option<AttributeType> {
        match self {
            AttributeType::String => Some(AttributeType::StringSet),
            AttributeType::Number => Some(AttributeType::NumberSet),
            AttributeType::Binary => Some(AttributeType::BinarySet),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_tag())
    }
}

// ============================================================================
// AttributeValue
// ============================================================================

/// The store's wire representation of one property value
///
/// Set variants are kept as vectors in the order they were produced; the
/// marshallers guarantee elements are distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    String(String),
    /// Decimal-text number
    Number(Number),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Set of strings
    StringSet(Vec<String>),
    /// Set of numbers
    NumberSet(Vec<Number>),
    /// Set of byte sequences
    BinarySet(Vec<Vec<u8>>),
    /// Ordered list of values
    List(Vec<AttributeValue>),
    /// String-keyed map of values
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Wire tag of this value (`NULL` for null)
    pub fn type_name(&self) -> &'static str {
        self.attribute_type()
            .map(|t| t.wire_tag())
            .unwrap_or("NULL")
    }

    /// Attribute type of this value, or `None` for null
    pub fn attribute_type(&self) -> Option<AttributeType> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Bool(_) => Some(AttributeType::Boolean),
            AttributeValue::String(_) => Some(AttributeType::String),
            AttributeValue::Number(_) => Some(AttributeType::Number),
            AttributeValue::Binary(_) => Some(AttributeType::Binary),
            AttributeValue::StringSet(_) => Some(AttributeType::StringSet),
            AttributeValue::NumberSet(_) => Some(AttributeType::NumberSet),
            AttributeValue::BinarySet(_) => Some(AttributeType::BinarySet),
            AttributeValue::List(_) => Some(AttributeType::List),
            AttributeValue::Map(_) => Some(AttributeType::Map),
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &Number if this is a Number value
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            AttributeValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a Binary value
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Get as &[AttributeValue] if this is a List value
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get as &BTreeMap if this is a Map value
    pub fn as_map(&self) -> Option<&BTreeMap<String, AttributeValue>> {
        match self {
            AttributeValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Render in the store's JSON wire form
    pub fn to_json(&self) -> JsonValue {
        match self {
            AttributeValue::Null => json!({ "NULL": true }),
            AttributeValue::Bool(b) => json!({ "BOOL": b }),
            AttributeValue::String(s) => json!({ "S": s }),
            AttributeValue::Number(n) => json!({ "N": n.as_str() }),
            AttributeValue::Binary(b) => json!({ "B": STANDARD.encode(b) }),
            AttributeValue::StringSet(ss) => json!({ "SS": ss }),
            AttributeValue::NumberSet(ns) => {
                let texts: Vec<&str> = ns.iter().map(Number::as_str).collect();
                json!({ "NS": texts })
            }
            AttributeValue::BinarySet(bs) => {
                let encoded: Vec<String> = bs.iter().map(|b| STANDARD.encode(b)).collect();
                json!({ "BS": encoded })
            }
            AttributeValue::List(l) => {
                let items: Vec<JsonValue> = l.iter().map(AttributeValue::to_json).collect();
                json!({ "L": items })
            }
            AttributeValue::Map(m) => {
                let mut obj = JsonMap::new();
                for (k, v) in m {
                    obj.insert(k.clone(), v.to_json());
                }
                json!({ "M": obj })
            }
        }
    }

    /// Parse the store's JSON wire form
    pub fn from_json(value: &JsonValue) -> Result<Self, WireFormatError> {
        let obj = value
            .as_object()
            .ok_or_else(|| WireFormatError::new("attribute value must be a JSON object"))?;
        if obj.len() != 1 {
            return Err(WireFormatError::new(format!(
                "attribute value must have exactly one type tag, found {}",
                obj.len()
            )));
        }
        let (tag, body) = obj
            .iter()
            .next()
            .ok_or_else(|| WireFormatError::new("empty attribute value"))?;

        match tag.as_str() {
            "NULL" => Ok(AttributeValue::Null),
            "BOOL" => body
                .as_bool()
                .map(AttributeValue::Bool)
                .ok_or_else(|| WireFormatError::new("BOOL must hold a boolean")),
            "S" => json_str(body, "S").map(|s| AttributeValue::String(s.to_string())),
            "N" => parse_number(json_str(body, "N")?).map(AttributeValue::Number),
            "B" => decode_binary(json_str(body, "B")?).map(AttributeValue::Binary),
            "SS" => json_array(body, "SS")?
                .iter()
                .map(|v| json_str(v, "SS").map(str::to_string))
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeValue::StringSet),
            "NS" => json_array(body, "NS")?
                .iter()
                .map(|v| json_str(v, "NS").and_then(parse_number))
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeValue::NumberSet),
            "BS" => json_array(body, "BS")?
                .iter()
                .map(|v| json_str(v, "BS").and_then(decode_binary))
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeValue::BinarySet),
            "L" => json_array(body, "L")?
                .iter()
                .map(AttributeValue::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeValue::List),
            "M" => {
                let entries = body
                    .as_object()
                    .ok_or_else(|| WireFormatError::new("M must hold an object"))?;
                let mut map = BTreeMap::new();
                for (k, v) in entries {
                    map.insert(k.clone(), AttributeValue::from_json(v)?);
                }
                Ok(AttributeValue::Map(map))
            }
            other => Err(WireFormatError::new(format!("unknown type tag {:?}", other))),
        }
    }
}

/// Render a whole item in the store's JSON wire form
pub fn item_to_json(item: &Item) -> JsonValue {
    let mut obj = JsonMap::new();
    for (k, v) in item {
        obj.insert(k.clone(), v.to_json());
    }
    JsonValue::Object(obj)
}

/// Parse a whole item from the store's JSON wire form
pub fn item_from_json(value: &JsonValue) -> Result<Item, WireFormatError> {
    let obj = value
        .as_object()
        .ok_or_else(|| WireFormatError::new("item must be a JSON object"))?;
    obj.iter()
        .map(|(k, v)| AttributeValue::from_json(v).map(|av| (k.clone(), av)))
        .collect()
}

/// Malformed wire JSON
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed attribute JSON: {0}")]
pub struct WireFormatError(String);

impl WireFormatError {
    fn new(msg: impl Into<String>) -> Self {
        WireFormatError(msg.into())
    }
}

fn json_str<'a>(value: &'a JsonValue, tag: &str) -> Result<&'a str, WireFormatError> {
    value
        .as_str()
        .ok_or_else(|| WireFormatError::new(format!("{} must hold a string", tag)))
}

fn json_array<'a>(value: &'a JsonValue, tag: &str) -> Result<&'a Vec<JsonValue>, WireFormatError> {
    value
        .as_array()
        .ok_or_else(|| WireFormatError::new(format!("{} must hold an array", tag)))
}

fn parse_number(text: &str) -> Result<Number, WireFormatError> {
    Number::parse(text).map_err(|e| WireFormatError::new(e.to_string()))
}

fn decode_binary(text: &str) -> Result<Vec<u8>, WireFormatError> {
    STANDARD
        .decode(text)
        .map_err(|e| WireFormatError::new(format!("invalid base64: {}", e)))
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<Number> for AttributeValue {
    fn from(n: Number) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Number(Number::from(i))
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(b: Vec<u8>) -> Self {
        AttributeValue::Binary(b)
    }
}
