//! AttributeType classification
//!
//! Decides which storage category a property maps to. Resolution order:
//!
//! 1. An explicit type override wins outright.
//! 2. A custom converter (named in the metadata, or registered for an opaque
//!    type) supplies its own stored type, which is classified instead.
//! 3. Otherwise the declared shape decides.
//!
//! Collection shapes are checked all the way down, so a raw generic nested
//! inside a list or map is rejected here rather than on first use.
//!
//! Classification does not know the conversion schema. Schemas may re-encode
//! booleans and dates onto a different wire type; see `schema`.

use crate::custom::TypeConverterFactory;
use strata_mapper_core::{AttributeType, DeclaredType, MapperError, PropertyMetadata, Result};

/// Classify one property
///
/// Errors carry the property name; the owning class is filled in by the
/// model builder.
pub fn classify(
    property: &str,
    declared: &DeclaredType,
    metadata: &PropertyMetadata,
    converters: &TypeConverterFactory,
) -> Result<AttributeType> {
    if let Some(overridden) = metadata.type_override {
        return Ok(overridden);
    }

    if let Some(name) = &metadata.converter {
        let converter = converters.named(name).ok_or_else(|| {
            MapperError::classification(
                "",
                property,
                format!("no converter registered under name {:?}", name),
            )
        })?;
        return classify_shape(property, &converter.stored_type(), converters);
    }

    classify_shape(property, declared, converters)
}

fn classify_shape(
    property: &str,
    declared: &DeclaredType,
    converters: &TypeConverterFactory,
) -> Result<AttributeType> {
    match declared {
        DeclaredType::Bool => Ok(AttributeType::Boolean),
        DeclaredType::Integer | DeclaredType::Float | DeclaredType::Decimal => {
            Ok(AttributeType::Number)
        }
        DeclaredType::String
        | DeclaredType::Enum(_)
        | DeclaredType::Date
        | DeclaredType::Reference => Ok(AttributeType::String),
        DeclaredType::Bytes => Ok(AttributeType::Binary),

        DeclaredType::Set(None) => Err(raw_generic(property, declared)),
        DeclaredType::Set(Some(elem)) => classify_set_element(property, elem, converters),

        DeclaredType::List(None) => Err(raw_generic(property, declared)),
        DeclaredType::List(Some(elem)) => {
            classify_shape(property, elem, converters)?;
            Ok(AttributeType::List)
        }

        DeclaredType::Map(None, _) | DeclaredType::Map(_, None) => {
            Err(raw_generic(property, declared))
        }
        DeclaredType::Map(Some(key), Some(value)) => {
            if **key != DeclaredType::String {
                return Err(MapperError::classification(
                    "",
                    property,
                    format!("map keys must be String, found {}", key),
                ));
            }
            classify_shape(property, value, converters)?;
            Ok(AttributeType::Map)
        }

        DeclaredType::Document(_) => Ok(AttributeType::Map),

        DeclaredType::Opaque(name) => match converters.for_type(name) {
            Some(converter) => classify_shape(property, &converter.stored_type(), converters),
            None => Err(MapperError::classification(
                "",
                property,
                format!("type {} has no built-in mapping and no registered converter", name),
            )),
        },
    }
}

fn classify_set_element(
    property: &str,
    elem: &DeclaredType,
    converters: &TypeConverterFactory,
) -> Result<AttributeType> {
    match elem {
        // Booleans have no set type on the wire; they are stored as 1/0.
        DeclaredType::Bool => Ok(AttributeType::NumberSet),
        DeclaredType::Integer | DeclaredType::Float | DeclaredType::Decimal => {
            Ok(AttributeType::NumberSet)
        }
        DeclaredType::String | DeclaredType::Enum(_) | DeclaredType::Date => {
            Ok(AttributeType::StringSet)
        }
        DeclaredType::Bytes => Ok(AttributeType::BinarySet),
        DeclaredType::Opaque(name) => match converters.for_type(name) {
            Some(converter) => classify_set_element(property, &converter.stored_type(), converters),
            None => Err(MapperError::classification(
                "",
                property,
                format!("set element type {} has no registered converter", name),
            )),
        },
        other => Err(MapperError::classification(
            "",
            property,
            format!("set elements must be scalar, found {}", other),
        )),
    }
}

fn raw_generic(property: &str, declared: &DeclaredType) -> MapperError {
    MapperError::classification(
        "",
        property,
        format!("{} has an unresolved type parameter", declared),
    )
}
