//! Marshallers
//!
//! A [`Marshaller`] is the per-property conversion strategy: `convert` turns a
//! `NativeValue` into an `AttributeValue`, `unconvert` type-checks an
//! `AttributeValue` and turns it back. Marshallers are built once, when a table
//! model is built, and are then reused for every record. They hold no mutable
//! state and are `Send + Sync`.
//!
//! ## Strategies
//!
//! | Strategy | Native | Wire |
//! |----------|--------|------|
//! | Scalar | Bool, Int, Float, Decimal, String, Bytes, Date, Enum, Reference | BOOL / N / S / B |
//! | Set | Set of scalars | SS / NS / BS |
//! | List | List (or Set stored as a list) | L |
//! | Map | Map | M |
//! | Document | Document | M |
//! | Custom | anything a `TypeConverter` understands | the converter's stored type |
//!
//! ## Nulls and empty sets
//!
//! Null converts to `AttributeValue::Null` and back. The store cannot hold an
//! empty set, so an empty set converts to Null, and Null unconverts to an empty
//! set for set-typed properties. Sets reject duplicate elements at convert time
//! with `DuplicateSetElement`; duplicates are detected on the wire encoding,
//! with numbers compared by value (`1` and `1.0` collide).

use crate::custom::TypeConverter;
use crate::dependencies::ReferenceResolver;
use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use strata_mapper_core::{
    AttributeType, AttributeValue, EnumType, ExternalReference, MapperError, NativeValue, Number,
    Result,
};

// ============================================================================
// Scalar codec
// ============================================================================

/// Scalar wire encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wire {
    Bool,
    Number,
    String,
    Binary,
}

impl Wire {
    pub(crate) fn attribute_type(self) -> AttributeType {
        match self {
            Wire::Bool => AttributeType::Boolean,
            Wire::Number => AttributeType::Number,
            Wire::String => AttributeType::String,
            Wire::Binary => AttributeType::Binary,
        }
    }

    pub(crate) fn from_attribute_type(t: AttributeType) -> Option<Wire> {
        match t {
            AttributeType::Boolean => Some(Wire::Bool),
            AttributeType::Number => Some(Wire::Number),
            AttributeType::String => Some(Wire::String),
            AttributeType::Binary => Some(Wire::Binary),
            _ => None,
        }
    }
}

/// Native scalar kinds
#[derive(Clone)]
pub(crate) enum ScalarKind {
    Bool,
    Integer,
    Float,
    Decimal,
    String,
    Bytes,
    Date,
    Enum(Arc<EnumType>),
    Reference(Arc<dyn ReferenceResolver>),
}

impl ScalarKind {
    fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "Bool",
            ScalarKind::Integer => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::Decimal => "Decimal",
            ScalarKind::String => "String",
            ScalarKind::Bytes => "Bytes",
            ScalarKind::Date => "Date",
            ScalarKind::Enum(_) => "Enum",
            ScalarKind::Reference(_) => "Reference",
        }
    }
}

/// Converts one scalar between its native kind and a wire encoding
///
/// `write` is the encoding produced by `encode`; `decode` accepts `write` and,
/// when set, `read_also`.
#[derive(Clone)]
pub(crate) struct ScalarCodec {
    pub(crate) kind: ScalarKind,
    pub(crate) write: Wire,
    pub(crate) read_also: Option<Wire>,
}

impl ScalarCodec {
    pub(crate) fn new(kind: ScalarKind, write: Wire) -> Self {
        ScalarCodec {
            kind,
            write,
            read_also: None,
        }
    }

    pub(crate) fn reading_also(mut self, wire: Wire) -> Self {
        if wire != self.write {
            self.read_also = Some(wire);
        }
        self
    }

    fn accepts(&self, t: AttributeType) -> bool {
        Wire::from_attribute_type(t)
            .map(|w| w == self.write || Some(w) == self.read_also)
            .unwrap_or(false)
    }

    fn expected(&self) -> String {
        match self.read_also {
            Some(also) => format!(
                "{} or {}",
                self.write.attribute_type(),
                also.attribute_type()
            ),
            None => self.write.attribute_type().to_string(),
        }
    }

    fn text(&self, path: &str, text: String) -> Result<AttributeValue> {
        match self.write {
            Wire::String => Ok(AttributeValue::String(text)),
            Wire::Number => Number::parse(&text)
                .map(AttributeValue::Number)
                .map_err(|e| MapperError::parse(path, e.to_string())),
            Wire::Bool | Wire::Binary => Err(MapperError::type_mismatch(
                path,
                self.write.attribute_type().to_string(),
                "text",
            )),
        }
    }

    fn encode(&self, path: &str, value: &NativeValue) -> Result<AttributeValue> {
        match (&self.kind, value) {
            (ScalarKind::Bool, NativeValue::Bool(b)) => match self.write {
                Wire::Bool => Ok(AttributeValue::Bool(*b)),
                Wire::Number => Ok(AttributeValue::Number(Number::from(i64::from(*b)))),
                _ => self.text(path, b.to_string()),
            },
            (ScalarKind::Integer, NativeValue::Int(i)) => self.text(path, i.to_string()),
            (ScalarKind::Float, NativeValue::Float(f)) => {
                let n = Number::from_f64(*f).ok_or_else(|| {
                    MapperError::type_mismatch(path, "finite Float", f.to_string())
                })?;
                self.text(path, n.into())
            }
            (ScalarKind::Decimal, NativeValue::Decimal(n)) => self.text(path, n.to_string()),
            (ScalarKind::String, NativeValue::String(s)) => self.text(path, s.clone()),
            (ScalarKind::Bytes, NativeValue::Bytes(b)) => Ok(AttributeValue::Binary(b.clone())),
            (ScalarKind::Date, NativeValue::Date(d)) => match self.write {
                Wire::Number => Ok(AttributeValue::Number(Number::from(d.timestamp_millis()))),
                // RFC 3339 text has exactly four year digits.
                _ if !(0..=9999).contains(&d.year()) => Err(MapperError::parse(
                    path,
                    format!("year {} cannot be written as ISO-8601 text", d.year()),
                )),
                _ => self.text(path, d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            },
            (ScalarKind::Enum(t), NativeValue::Enum(name)) => {
                if t.has_variant(name) {
                    self.text(path, name.clone())
                } else {
                    Err(MapperError::type_mismatch(
                        path,
                        format!("variant of {}", t.name),
                        format!("{:?}", name),
                    ))
                }
            }
            (ScalarKind::Reference(resolver), NativeValue::Reference(r)) => {
                let resolved = resolve_reference(resolver.as_ref(), r.clone());
                let json = serde_json::to_string(&resolved)
                    .map_err(|e| MapperError::parse(path, e.to_string()))?;
                self.text(path, json)
            }
            (kind, other) => Err(MapperError::type_mismatch(
                path,
                kind.name(),
                other.type_name(),
            )),
        }
    }

    fn decode(&self, path: &str, value: &AttributeValue) -> Result<NativeValue> {
        match (&self.kind, value) {
            (ScalarKind::Bool, AttributeValue::Bool(b)) => Ok(NativeValue::Bool(*b)),
            (ScalarKind::Bool, AttributeValue::Number(n)) => match n.as_str() {
                "1" => Ok(NativeValue::Bool(true)),
                "0" => Ok(NativeValue::Bool(false)),
                other => Err(MapperError::parse(
                    path,
                    format!("boolean number must be 1 or 0, found {}", other),
                )),
            },
            (ScalarKind::Bool, AttributeValue::String(s)) => s
                .parse::<bool>()
                .map(NativeValue::Bool)
                .map_err(|_| MapperError::parse(path, format!("invalid boolean {:?}", s))),

            (ScalarKind::Integer, AttributeValue::Number(n)) => parse_int(path, n.as_str()),
            (ScalarKind::Integer, AttributeValue::String(s)) => parse_int(path, s),

            (ScalarKind::Float, AttributeValue::Number(n)) => parse_float(path, n.as_str()),
            (ScalarKind::Float, AttributeValue::String(s)) => parse_float(path, s),

            (ScalarKind::Decimal, AttributeValue::Number(n)) => Ok(NativeValue::Decimal(n.clone())),
            (ScalarKind::Decimal, AttributeValue::String(s)) => Number::parse(s)
                .map(NativeValue::Decimal)
                .map_err(|e| MapperError::parse(path, e.to_string())),

            (ScalarKind::String, AttributeValue::String(s)) => Ok(NativeValue::String(s.clone())),
            (ScalarKind::Bytes, AttributeValue::Binary(b)) => Ok(NativeValue::Bytes(b.clone())),

            (ScalarKind::Date, AttributeValue::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|d| NativeValue::Date(d.with_timezone(&Utc)))
                .map_err(|e| MapperError::parse(path, format!("invalid date {:?}: {}", s, e))),
            (ScalarKind::Date, AttributeValue::Number(n)) => {
                let millis = n.to_i64().ok_or_else(|| {
                    MapperError::parse(path, format!("epoch millis must be an integer, found {}", n))
                })?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(NativeValue::Date)
                    .ok_or_else(|| {
                        MapperError::parse(path, format!("epoch millis out of range: {}", millis))
                    })
            }

            (ScalarKind::Enum(t), AttributeValue::String(s)) => {
                if t.has_variant(s) {
                    Ok(NativeValue::Enum(s.clone()))
                } else {
                    Err(MapperError::parse(
                        path,
                        format!("{:?} is not a variant of {}", s, t.name),
                    ))
                }
            }

            (ScalarKind::Reference(resolver), AttributeValue::String(s)) => {
                let r: ExternalReference = serde_json::from_str(s)
                    .map_err(|e| MapperError::parse(path, format!("invalid reference: {}", e)))?;
                Ok(NativeValue::Reference(resolve_reference(resolver.as_ref(), r)))
            }

            (_, other) => Err(MapperError::type_mismatch(
                path,
                self.expected(),
                other.type_name(),
            )),
        }
    }
}

fn resolve_reference(resolver: &dyn ReferenceResolver, mut r: ExternalReference) -> ExternalReference {
    if r.location.is_empty() {
        r.location = resolver.default_location().to_string();
    }
    r
}

fn parse_int(path: &str, text: &str) -> Result<NativeValue> {
    text.parse::<i64>()
        .map(NativeValue::Int)
        .map_err(|_| MapperError::parse(path, format!("{} is not a 64-bit integer", text)))
}

fn parse_float(path: &str, text: &str) -> Result<NativeValue> {
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(NativeValue::Float(f)),
        _ => Err(MapperError::parse(path, format!("{} is not a finite float", text))),
    }
}

// ============================================================================
// Marshaller
// ============================================================================

/// One field of a document marshaller
#[derive(Clone)]
pub(crate) struct DocumentSlot {
    pub(crate) field: String,
    pub(crate) attribute: String,
    pub(crate) marshaller: Marshaller,
}

#[derive(Clone)]
enum Strategy {
    Scalar(ScalarCodec),
    Set {
        element: Box<Marshaller>,
        set_type: AttributeType,
    },
    List {
        element: Box<Marshaller>,
        native_set: bool,
    },
    Map(Box<Marshaller>),
    Document(Arc<Vec<DocumentSlot>>),
    Custom {
        converter: Arc<dyn TypeConverter>,
        inner: Box<Marshaller>,
    },
}

/// Per-property conversion strategy
///
/// Cheap to clone; nested strategies are shared or boxed.
#[derive(Clone)]
pub struct Marshaller {
    path: Arc<str>,
    strategy: Strategy,
}

impl Marshaller {
    pub(crate) fn scalar(path: &str, codec: ScalarCodec) -> Self {
        Self::with(path, Strategy::Scalar(codec))
    }

    /// Set marshaller; `None` when the element type has no set encoding
    pub(crate) fn set(path: &str, element: Marshaller) -> Option<Self> {
        let set_type = element.attribute_type().set_of()?;
        Some(Self::with(
            path,
            Strategy::Set {
                element: Box::new(element),
                set_type,
            },
        ))
    }

    pub(crate) fn list(path: &str, element: Marshaller, native_set: bool) -> Self {
        Self::with(
            path,
            Strategy::List {
                element: Box::new(element),
                native_set,
            },
        )
    }

    pub(crate) fn map(path: &str, value: Marshaller) -> Self {
        Self::with(path, Strategy::Map(Box::new(value)))
    }

    pub(crate) fn document(path: &str, slots: Vec<DocumentSlot>) -> Self {
        Self::with(path, Strategy::Document(Arc::new(slots)))
    }

    pub(crate) fn custom(path: &str, converter: Arc<dyn TypeConverter>, inner: Marshaller) -> Self {
        Self::with(
            path,
            Strategy::Custom {
                converter,
                inner: Box::new(inner),
            },
        )
    }

    fn with(path: &str, strategy: Strategy) -> Self {
        Marshaller {
            path: Arc::from(path),
            strategy,
        }
    }

    /// Property path used in error messages
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Attribute type written to the store
    pub fn attribute_type(&self) -> AttributeType {
        match &self.strategy {
            Strategy::Scalar(codec) => codec.write.attribute_type(),
            Strategy::Set { set_type, .. } => *set_type,
            Strategy::List { .. } => AttributeType::List,
            Strategy::Map(_) | Strategy::Document(_) => AttributeType::Map,
            Strategy::Custom { inner, .. } => inner.attribute_type(),
        }
    }

    /// Native value to attribute value
    pub fn convert(&self, value: &NativeValue) -> Result<AttributeValue> {
        if value.is_null() {
            return Ok(AttributeValue::Null);
        }

        match &self.strategy {
            Strategy::Scalar(codec) => codec.encode(&self.path, value),
            Strategy::Set { element, set_type } => {
                let elements = match value {
                    NativeValue::Set(elements) => elements,
                    other => return Err(self.mismatch("Set", other.type_name())),
                };
                self.convert_set(element, *set_type, elements)
            }
            Strategy::List {
                element,
                native_set,
            } => {
                let elements = match (value, native_set) {
                    (NativeValue::List(elements), false) => elements,
                    (NativeValue::Set(elements), true) => elements,
                    (other, false) => return Err(self.mismatch("List", other.type_name())),
                    (other, true) => return Err(self.mismatch("Set", other.type_name())),
                };
                elements
                    .iter()
                    .map(|e| element.convert(e))
                    .collect::<Result<Vec<_>>>()
                    .map(AttributeValue::List)
            }
            Strategy::Map(values) => {
                let entries = match value {
                    NativeValue::Map(entries) => entries,
                    other => return Err(self.mismatch("Map", other.type_name())),
                };
                let mut out = BTreeMap::new();
                for (k, v) in entries {
                    out.insert(k.clone(), values.convert(v)?);
                }
                Ok(AttributeValue::Map(out))
            }
            Strategy::Document(slots) => {
                let fields = match value {
                    NativeValue::Document(fields) => fields,
                    other => return Err(self.mismatch("Document", other.type_name())),
                };
                if let Some(unknown) = fields
                    .keys()
                    .find(|k| !slots.iter().any(|s| &s.field == *k))
                {
                    return Err(self.mismatch("declared document field", format!("field {:?}", unknown)));
                }
                let mut out = BTreeMap::new();
                for slot in slots.iter() {
                    let v = fields.get(&slot.field).unwrap_or(&NativeValue::Null);
                    let av = slot.marshaller.convert(v)?;
                    if !av.is_null() {
                        out.insert(slot.attribute.clone(), av);
                    }
                }
                Ok(AttributeValue::Map(out))
            }
            Strategy::Custom { converter, inner } => {
                let stored = converter.convert(value)?;
                inner.convert(&stored)
            }
        }
    }

    /// Check that an attribute value has a shape this marshaller can read
    ///
    /// Null always passes. Nested values are checked when they are unconverted.
    pub fn type_check(&self, value: &AttributeValue) -> Result<()> {
        let observed = match value.attribute_type() {
            None => return Ok(()),
            Some(t) => t,
        };

        let ok = match &self.strategy {
            Strategy::Scalar(codec) => codec.accepts(observed),
            Strategy::Set { set_type, .. } => observed == *set_type,
            Strategy::List { .. } => observed == AttributeType::List,
            Strategy::Map(_) | Strategy::Document(_) => observed == AttributeType::Map,
            Strategy::Custom { inner, .. } => return inner.type_check(value),
        };

        if ok {
            Ok(())
        } else {
            let expected = match &self.strategy {
                Strategy::Scalar(codec) => codec.expected(),
                _ => self.attribute_type().to_string(),
            };
            Err(self.mismatch(expected, value.type_name()))
        }
    }

    /// Attribute value to native value, after a type check
    pub fn unconvert(&self, value: &AttributeValue) -> Result<NativeValue> {
        self.type_check(value)?;

        match &self.strategy {
            Strategy::Set { element, .. } => return self.unconvert_set(element, value),
            _ if value.is_null() => return Ok(NativeValue::Null),
            _ => {}
        }

        match (&self.strategy, value) {
            (Strategy::Scalar(codec), v) => codec.decode(&self.path, v),
            (
                Strategy::List {
                    element,
                    native_set,
                },
                AttributeValue::List(items),
            ) => {
                let values = items
                    .iter()
                    .map(|item| element.unconvert(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(if *native_set {
                    NativeValue::Set(values)
                } else {
                    NativeValue::List(values)
                })
            }
            (Strategy::Map(values), AttributeValue::Map(entries)) => {
                let mut out = BTreeMap::new();
                for (k, v) in entries {
                    out.insert(k.clone(), values.unconvert(v)?);
                }
                Ok(NativeValue::Map(out))
            }
            (Strategy::Document(slots), AttributeValue::Map(entries)) => {
                let mut out = BTreeMap::new();
                for slot in slots.iter() {
                    let v = match entries.get(&slot.attribute) {
                        Some(av) => slot.marshaller.unconvert(av)?,
                        None => slot.marshaller.unconvert(&AttributeValue::Null)?,
                    };
                    out.insert(slot.field.clone(), v);
                }
                Ok(NativeValue::Document(out))
            }
            (Strategy::Custom { converter, inner }, v) => match inner.unconvert(v)? {
                NativeValue::Null => Ok(NativeValue::Null),
                stored => converter.unconvert(stored),
            },
            (_, other) => Err(self.mismatch(self.attribute_type().to_string(), other.type_name())),
        }
    }

    fn convert_set(
        &self,
        element: &Marshaller,
        set_type: AttributeType,
        elements: &[NativeValue],
    ) -> Result<AttributeValue> {
        if elements.is_empty() {
            return Ok(AttributeValue::Null);
        }

        let mut strings = Vec::new();
        let mut numbers = Vec::new();
        let mut binaries = Vec::new();
        let mut seen: HashSet<Vec<u8>> = HashSet::with_capacity(elements.len());

        for e in elements {
            if e.is_null() {
                return Err(element.mismatch(element.attribute_type().to_string(), "Null"));
            }
            let encoded = element.convert(e)?;
            let (identity, rendered) = match &encoded {
                AttributeValue::String(s) => (s.as_bytes().to_vec(), format!("{:?}", s)),
                AttributeValue::Number(n) => (n.canonical().into_bytes(), n.to_string()),
                AttributeValue::Binary(b) => (b.clone(), format!("{:?}", b)),
                other => {
                    return Err(element.mismatch(set_type.to_string(), other.type_name()));
                }
            };
            if !seen.insert(identity) {
                return Err(MapperError::DuplicateSetElement {
                    property: self.path.to_string(),
                    element: rendered,
                });
            }
            match encoded {
                AttributeValue::String(s) => strings.push(s),
                AttributeValue::Number(n) => numbers.push(n),
                AttributeValue::Binary(b) => binaries.push(b),
                _ => {}
            }
        }

        Ok(match set_type {
            AttributeType::NumberSet => AttributeValue::NumberSet(numbers),
            AttributeType::BinarySet => AttributeValue::BinarySet(binaries),
            _ => AttributeValue::StringSet(strings),
        })
    }

    fn unconvert_set(&self, element: &Marshaller, value: &AttributeValue) -> Result<NativeValue> {
        let decoded = match value {
            AttributeValue::Null => Vec::new(),
            AttributeValue::StringSet(items) => items
                .iter()
                .map(|s| element.unconvert(&AttributeValue::String(s.clone())))
                .collect::<Result<Vec<_>>>()?,
            AttributeValue::NumberSet(items) => items
                .iter()
                .map(|n| element.unconvert(&AttributeValue::Number(n.clone())))
                .collect::<Result<Vec<_>>>()?,
            AttributeValue::BinarySet(items) => items
                .iter()
                .map(|b| element.unconvert(&AttributeValue::Binary(b.clone())))
                .collect::<Result<Vec<_>>>()?,
            other => return Err(self.mismatch(self.attribute_type().to_string(), other.type_name())),
        };
        Ok(NativeValue::Set(decoded))
    }

    fn mismatch(&self, expected: impl Into<String>, observed: impl Into<String>) -> MapperError {
        MapperError::type_mismatch(self.path.to_string(), expected, observed)
    }
}

impl fmt::Debug for Marshaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match &self.strategy {
            Strategy::Scalar(codec) => codec.kind.name(),
            Strategy::Set { .. } => "Set",
            Strategy::List { .. } => "List",
            Strategy::Map(_) => "Map",
            Strategy::Document(_) => "Document",
            Strategy::Custom { .. } => "Custom",
        };
        f.debug_struct("Marshaller")
            .field("path", &self.path)
            .field("strategy", &strategy)
            .field("attribute_type", &self.attribute_type())
            .finish()
    }
}
