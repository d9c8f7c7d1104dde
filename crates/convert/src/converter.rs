//! Item converter
//!
//! [`ItemConverter`] is a conversion schema bound to its collaborators: the
//! custom converter registry and the dependency bag. It turns a property
//! signature into a [`Marshaller`], recursing through collection elements and
//! document fields. Every structural problem is reported here, before any
//! value is converted.

use crate::classify::classify;
use crate::custom::{TypeConverter, TypeConverterFactory};
use crate::dependencies::Dependencies;
use crate::marshal::{DocumentSlot, Marshaller, ScalarCodec, ScalarKind, Wire};
use crate::schema::ConversionSchema;
use std::collections::HashSet;
use std::sync::Arc;
use strata_mapper_core::{
    AttributeType, AttributeValue, DeclaredType, DocumentField, DocumentType, MapperError,
    NativeValue, PropertyDescriptor, PropertyMetadata, Result,
};

/// The parts of a property that decide its conversion
#[derive(Debug, Clone, Copy)]
pub struct PropertySignature<'a> {
    /// Property name, used as the root of error paths
    pub name: &'a str,
    /// Declared shape
    pub declared: &'a DeclaredType,
    /// Attached metadata
    pub metadata: &'a PropertyMetadata,
}

impl<'a> PropertySignature<'a> {
    /// Signature from its parts
    pub fn new(name: &'a str, declared: &'a DeclaredType, metadata: &'a PropertyMetadata) -> Self {
        PropertySignature {
            name,
            declared,
            metadata,
        }
    }
}

impl<'a, T> From<&'a PropertyDescriptor<T>> for PropertySignature<'a> {
    fn from(p: &'a PropertyDescriptor<T>) -> Self {
        PropertySignature::new(&p.name, &p.declared, &p.metadata)
    }
}

impl<'a> From<&'a DocumentField> for PropertySignature<'a> {
    fn from(f: &'a DocumentField) -> Self {
        PropertySignature::new(&f.name, &f.declared, &f.metadata)
    }
}

/// A conversion schema bound to converters and dependencies
#[derive(Debug, Clone)]
pub struct ItemConverter {
    schema: ConversionSchema,
    converters: TypeConverterFactory,
    dependencies: Dependencies,
}

impl ItemConverter {
    pub(crate) fn new(schema: ConversionSchema, dependencies: Dependencies) -> Self {
        ItemConverter {
            schema,
            converters: TypeConverterFactory::default(),
            dependencies,
        }
    }

    /// Use the given custom converter registry
    pub fn with_type_converters(mut self, converters: TypeConverterFactory) -> Self {
        self.converters = converters;
        self
    }

    /// Bound schema
    pub fn schema(&self) -> ConversionSchema {
        self.schema
    }

    /// Bound custom converter registry
    pub fn type_converters(&self) -> &TypeConverterFactory {
        &self.converters
    }

    /// Bound dependency bag
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Storage category of a property, independent of the schema
    pub fn classify(&self, property: PropertySignature<'_>) -> Result<AttributeType> {
        classify(
            property.name,
            property.declared,
            property.metadata,
            &self.converters,
        )
    }

    /// Build the marshaller for a property
    pub fn marshaller(&self, property: PropertySignature<'_>) -> Result<Marshaller> {
        self.classify(property)?;
        self.build(property.name, property.declared, property.metadata)
    }

    /// Build the marshaller for a property with no metadata
    pub fn marshaller_for(&self, name: &str, declared: &DeclaredType) -> Result<Marshaller> {
        let metadata = PropertyMetadata::default();
        self.marshaller(PropertySignature::new(name, declared, &metadata))
    }

    /// Convert one value without keeping the marshaller
    pub fn convert(
        &self,
        property: PropertySignature<'_>,
        value: &NativeValue,
    ) -> Result<AttributeValue> {
        self.marshaller(property)?.convert(value)
    }

    /// Unconvert one value without keeping the marshaller
    pub fn unconvert(
        &self,
        property: PropertySignature<'_>,
        value: &AttributeValue,
    ) -> Result<NativeValue> {
        self.marshaller(property)?.unconvert(value)
    }

    // ========================================================================
    // Builders
    // ========================================================================

    fn build(
        &self,
        path: &str,
        declared: &DeclaredType,
        metadata: &PropertyMetadata,
    ) -> Result<Marshaller> {
        if let Some(name) = &metadata.converter {
            let converter = self.converters.named(name).ok_or_else(|| {
                MapperError::classification(
                    "",
                    path,
                    format!("no converter registered under name {:?}", name),
                )
            })?;
            return self.build_custom(path, converter, metadata.type_override);
        }
        self.build_shape(path, declared, metadata.type_override)
    }

    fn build_custom(
        &self,
        path: &str,
        converter: Arc<dyn TypeConverter>,
        type_override: Option<AttributeType>,
    ) -> Result<Marshaller> {
        let stored = converter.stored_type();
        if let DeclaredType::Opaque(name) = &stored {
            return Err(MapperError::classification(
                "",
                path,
                format!("converter stores opaque type {}", name),
            ));
        }
        let inner = self.build_shape(path, &stored, type_override)?;
        Ok(Marshaller::custom(path, converter, inner))
    }

    fn build_shape(
        &self,
        path: &str,
        declared: &DeclaredType,
        type_override: Option<AttributeType>,
    ) -> Result<Marshaller> {
        use AttributeType as A;

        match declared {
            DeclaredType::Bool => self.scalar(
                path,
                declared,
                self.schema.bool_codec(),
                type_override,
                &[A::Boolean, A::Number, A::String],
            ),
            DeclaredType::Integer => self.scalar(
                path,
                declared,
                ScalarCodec::new(ScalarKind::Integer, Wire::Number),
                type_override,
                &[A::Number, A::String],
            ),
            DeclaredType::Float => self.scalar(
                path,
                declared,
                ScalarCodec::new(ScalarKind::Float, Wire::Number),
                type_override,
                &[A::Number, A::String],
            ),
            DeclaredType::Decimal => self.scalar(
                path,
                declared,
                ScalarCodec::new(ScalarKind::Decimal, Wire::Number),
                type_override,
                &[A::Number, A::String],
            ),
            DeclaredType::String => self.scalar(
                path,
                declared,
                ScalarCodec::new(ScalarKind::String, Wire::String),
                type_override,
                &[A::String],
            ),
            DeclaredType::Bytes => self.scalar(
                path,
                declared,
                ScalarCodec::new(ScalarKind::Bytes, Wire::Binary),
                type_override,
                &[A::Binary],
            ),
            DeclaredType::Date => self.scalar(
                path,
                declared,
                self.schema.date_codec(),
                type_override,
                &[A::String, A::Number],
            ),
            DeclaredType::Enum(t) => self.scalar(
                path,
                declared,
                ScalarCodec::new(ScalarKind::Enum(Arc::clone(t)), Wire::String),
                type_override,
                &[A::String],
            ),
            DeclaredType::Reference => {
                let resolver = self.dependencies.reference_resolver().ok_or_else(|| {
                    MapperError::MissingDependency {
                        class: String::new(),
                        property: path.to_string(),
                        dependency: "ReferenceResolver".to_string(),
                    }
                })?;
                self.scalar(
                    path,
                    declared,
                    ScalarCodec::new(ScalarKind::Reference(resolver), Wire::String),
                    type_override,
                    &[A::String],
                )
            }

            DeclaredType::Set(elem) => {
                let elem = elem
                    .as_deref()
                    .ok_or_else(|| unresolved(path, declared))?;
                self.build_set(path, declared, elem, type_override)
            }

            DeclaredType::List(elem) => {
                self.require_nested(path, declared)?;
                self.require_override(path, declared, type_override, A::List)?;
                let elem = elem
                    .as_deref()
                    .ok_or_else(|| unresolved(path, declared))?;
                let element = self.build(&format!("{}[]", path), elem, &PropertyMetadata::default())?;
                Ok(Marshaller::list(path, element, false))
            }

            DeclaredType::Map(key, value) => {
                self.require_nested(path, declared)?;
                self.require_override(path, declared, type_override, A::Map)?;
                match key.as_deref() {
                    Some(DeclaredType::String) => {}
                    _ => {
                        return Err(MapperError::classification(
                            "",
                            path,
                            format!("{} must have String keys", declared),
                        ))
                    }
                }
                let value = value
                    .as_deref()
                    .ok_or_else(|| unresolved(path, declared))?;
                let element = self.build(&format!("{}{{}}", path), value, &PropertyMetadata::default())?;
                Ok(Marshaller::map(path, element))
            }

            DeclaredType::Document(doc) => {
                self.require_nested(path, declared)?;
                self.require_override(path, declared, type_override, A::Map)?;
                self.build_document(path, doc)
            }

            DeclaredType::Opaque(name) => match self.converters.for_type(name) {
                Some(converter) => self.build_custom(path, converter, type_override),
                None => Err(MapperError::classification(
                    "",
                    path,
                    format!("type {} has no built-in mapping and no registered converter", name),
                )),
            },
        }
    }

    fn build_set(
        &self,
        path: &str,
        declared: &DeclaredType,
        elem: &DeclaredType,
        type_override: Option<AttributeType>,
    ) -> Result<Marshaller> {
        let element_path = format!("{}[]", path);

        let element_override = match type_override {
            None => None,
            Some(AttributeType::List) => {
                self.require_nested(path, declared)?;
                let element = self.build(&element_path, elem, &PropertyMetadata::default())?;
                return Ok(Marshaller::list(path, element, true));
            }
            Some(AttributeType::StringSet) => Some(AttributeType::String),
            Some(AttributeType::NumberSet) => Some(AttributeType::Number),
            Some(AttributeType::BinarySet) => Some(AttributeType::Binary),
            Some(other) => {
                return Err(self.unsupported(
                    path,
                    format!("{} cannot be stored as {}", declared, other),
                ))
            }
        };

        let element = self.build_set_element(&element_path, elem, element_override)?;
        let element_type = element.attribute_type();
        Marshaller::set(path, element).ok_or_else(|| {
            self.unsupported(
                path,
                format!("{} elements encode as {}, which has no set type", declared, element_type),
            )
        })
    }

    fn build_set_element(
        &self,
        path: &str,
        elem: &DeclaredType,
        type_override: Option<AttributeType>,
    ) -> Result<Marshaller> {
        use AttributeType as A;

        match elem {
            // No boolean set on the wire; elements are stored as 1/0.
            DeclaredType::Bool => self.scalar(
                path,
                elem,
                ScalarCodec::new(ScalarKind::Bool, Wire::Number),
                type_override,
                &[A::Number, A::String],
            ),
            DeclaredType::Date => self.scalar(
                path,
                elem,
                ScalarCodec::new(ScalarKind::Date, Wire::String),
                type_override,
                &[A::String, A::Number],
            ),
            DeclaredType::Opaque(name) => {
                let converter = self.converters.for_type(name).ok_or_else(|| {
                    MapperError::classification(
                        "",
                        path,
                        format!("set element type {} has no registered converter", name),
                    )
                })?;
                let stored = converter.stored_type();
                if matches!(stored, DeclaredType::Opaque(_)) {
                    return Err(MapperError::classification(
                        "",
                        path,
                        format!("converter for {} stores another opaque type", name),
                    ));
                }
                let inner = self.build_set_element(path, &stored, type_override)?;
                Ok(Marshaller::custom(path, converter, inner))
            }
            DeclaredType::Integer
            | DeclaredType::Float
            | DeclaredType::Decimal
            | DeclaredType::String
            | DeclaredType::Bytes
            | DeclaredType::Enum(_) => self.build_shape(path, elem, type_override),
            other => Err(MapperError::classification(
                "",
                path,
                format!("set elements must be scalar, found {}", other),
            )),
        }
    }

    fn build_document(&self, path: &str, doc: &DocumentType) -> Result<Marshaller> {
        let mut slots = Vec::with_capacity(doc.fields.len());
        let mut seen = HashSet::with_capacity(doc.fields.len());

        for field in doc.fields.iter().filter(|f| !f.metadata.ignored) {
            let attribute = field
                .metadata
                .attribute_name
                .clone()
                .unwrap_or_else(|| field.name.clone());
            if !seen.insert(attribute.clone()) {
                return Err(MapperError::invalid_schema(
                    &doc.name,
                    format!("duplicate attribute name {:?}", attribute),
                ));
            }

            let field_path = format!("{}.{}", path, field.name);
            classify(&field_path, &field.declared, &field.metadata, &self.converters)?;
            let marshaller = self.build(&field_path, &field.declared, &field.metadata)?;
            slots.push(DocumentSlot {
                field: field.name.clone(),
                attribute,
                marshaller,
            });
        }

        Ok(Marshaller::document(path, slots))
    }

    fn scalar(
        &self,
        path: &str,
        declared: &DeclaredType,
        codec: ScalarCodec,
        type_override: Option<AttributeType>,
        allowed: &[AttributeType],
    ) -> Result<Marshaller> {
        let codec = match type_override {
            None => codec,
            Some(t) if allowed.contains(&t) => match Wire::from_attribute_type(t) {
                Some(wire) if wire == codec.write => codec,
                Some(wire) => ScalarCodec::new(codec.kind.clone(), wire).reading_also(codec.write),
                None => return Err(self.unsupported(path, format!("{} is not a scalar type", t))),
            },
            Some(t) => {
                return Err(self.unsupported(
                    path,
                    format!("{} cannot be stored as {}", declared, t),
                ))
            }
        };
        Ok(Marshaller::scalar(path, codec))
    }

    fn require_nested(&self, path: &str, declared: &DeclaredType) -> Result<()> {
        if self.schema.supports_nested() {
            Ok(())
        } else {
            Err(self.unsupported(path, format!("{} attributes are not supported", declared)))
        }
    }

    fn require_override(
        &self,
        path: &str,
        declared: &DeclaredType,
        type_override: Option<AttributeType>,
        expected: AttributeType,
    ) -> Result<()> {
        match type_override {
            Some(t) if t != expected => Err(self.unsupported(
                path,
                format!("{} cannot be stored as {}", declared, t),
            )),
            _ => Ok(()),
        }
    }

    fn unsupported(&self, path: &str, reason: String) -> MapperError {
        MapperError::unsupported("", path, self.schema.tag(), reason)
    }
}

fn unresolved(path: &str, declared: &DeclaredType) -> MapperError {
    MapperError::classification(
        "",
        path,
        format!("{} has an unresolved type parameter", declared),
    )
}
