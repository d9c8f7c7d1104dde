//! Field models
//!
//! A [`FieldModel`] is one persisted property after the build has resolved
//! everything about it: the attribute name, the key role, the marshaller and
//! the accessor pair. Converting a record is then a plain walk over fields.

use std::fmt;
use strata_mapper_convert::Marshaller;
use strata_mapper_core::{
    AttributeType, AttributeValue, Generation, Getter, IndexKey, KeyRole, NativeValue, Result,
    Setter,
};

/// One resolved property of a table model
pub struct FieldModel<T> {
    pub(crate) property: String,
    pub(crate) attribute_name: String,
    pub(crate) key_role: KeyRole,
    pub(crate) marshaller: Marshaller,
    pub(crate) getter: Getter<T>,
    pub(crate) setter: Setter<T>,
    pub(crate) generation: Option<Generation>,
    pub(crate) indexes: Vec<IndexKey>,
}

impl<T> FieldModel<T> {
    /// Property name on the mapped type
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Attribute name in the store
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// Primary key role
    pub fn key_role(&self) -> KeyRole {
        self.key_role
    }

    /// True for the hash or range key
    pub fn is_key(&self) -> bool {
        self.key_role != KeyRole::None
    }

    /// Attribute type written to the store
    pub fn attribute_type(&self) -> AttributeType {
        self.marshaller.attribute_type()
    }

    /// The property's marshaller
    pub fn marshaller(&self) -> &Marshaller {
        &self.marshaller
    }

    /// Value generation before writes
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    /// Secondary index key roles
    pub fn indexes(&self) -> &[IndexKey] {
        &self.indexes
    }

    /// Read the native value from an instance
    pub fn get(&self, object: &T) -> NativeValue {
        (self.getter)(object)
    }

    /// Write a native value into an instance
    pub fn set(&self, object: &mut T, value: NativeValue) -> Result<()> {
        (self.setter)(object, value)
    }

    /// Native value to attribute value
    pub fn convert(&self, value: &NativeValue) -> Result<AttributeValue> {
        self.marshaller.convert(value)
    }

    /// Attribute value to native value, after a type check
    pub fn unconvert(&self, value: &AttributeValue) -> Result<NativeValue> {
        self.marshaller.unconvert(value)
    }

    /// Read from an instance and convert
    pub fn read(&self, object: &T) -> Result<AttributeValue> {
        self.convert(&self.get(object))
    }

    /// Unconvert and write into an instance
    pub fn write(&self, object: &mut T, value: &AttributeValue) -> Result<()> {
        let native = self.unconvert(value)?;
        self.set(object, native)
    }
}

impl<T> fmt::Debug for FieldModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldModel")
            .field("property", &self.property)
            .field("attribute_name", &self.attribute_name)
            .field("key_role", &self.key_role)
            .field("attribute_type", &self.attribute_type())
            .field("generation", &self.generation)
            .finish()
    }
}
