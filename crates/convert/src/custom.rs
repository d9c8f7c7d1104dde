//! User-pluggable converters
//!
//! A [`TypeConverter`] maps an application value the mapper cannot store
//! directly onto a value of a simpler declared type that it can. The mapper
//! classifies and marshals the converter's stored type; the converter itself
//! only ever sees non-null values.
//!
//! Converters are registered in a [`TypeConverterFactory`], either under a
//! name that properties opt into through `PropertyMetadata::converter`, or
//! under an opaque type name so every property of that type uses it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use strata_mapper_core::{DeclaredType, NativeValue, Result};

/// Converts between an application value and a storable value
pub trait TypeConverter: Send + Sync {
    /// Declared shape of the values `convert` produces
    fn stored_type(&self) -> DeclaredType;

    /// Application value to storable value
    fn convert(&self, value: &NativeValue) -> Result<NativeValue>;

    /// Storable value back to application value
    fn unconvert(&self, value: NativeValue) -> Result<NativeValue>;
}

/// Registry of custom converters
///
/// Cheap to clone; shared through the mapper configuration.
#[derive(Clone, Default)]
pub struct TypeConverterFactory {
    by_name: HashMap<String, Arc<dyn TypeConverter>>,
    by_type: HashMap<String, Arc<dyn TypeConverter>>,
}

impl TypeConverterFactory {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter that properties select by name
    pub fn with_named(
        mut self,
        name: impl Into<String>,
        converter: impl TypeConverter + 'static,
    ) -> Self {
        self.by_name.insert(name.into(), Arc::new(converter));
        self
    }

    /// Register the converter for every property of an opaque type
    pub fn with_type(
        mut self,
        type_name: impl Into<String>,
        converter: impl TypeConverter + 'static,
    ) -> Self {
        self.by_type.insert(type_name.into(), Arc::new(converter));
        self
    }

    /// Converter registered under `name`
    pub fn named(&self, name: &str) -> Option<Arc<dyn TypeConverter>> {
        self.by_name.get(name).cloned()
    }

    /// Converter registered for the opaque type `type_name`
    pub fn for_type(&self, type_name: &str) -> Option<Arc<dyn TypeConverter>> {
        self.by_type.get(type_name).cloned()
    }
}

impl fmt::Debug for TypeConverterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.by_name.keys().collect();
        names.sort();
        let mut types: Vec<&String> = self.by_type.keys().collect();
        types.sort();
        f.debug_struct("TypeConverterFactory")
            .field("named", &names)
            .field("types", &types)
            .finish()
    }
}
