//! Core types for the Strata object mapper
//!
//! This crate defines the foundational types shared by the conversion engine
//! and the model layer:
//! - AttributeValue / AttributeType: the store's wire representation
//! - Number: lossless decimal text
//! - NativeValue: the application-side image of a field
//! - DeclaredType: the shape a property declares
//! - PropertyDescriptor / ClassDescriptor / Mapped: the descriptor capability
//! - MapperError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attribute;
pub mod declared;
pub mod descriptor;
pub mod error;
pub mod native;
pub mod number;

pub use attribute::{item_from_json, item_to_json, AttributeType, AttributeValue, Item, WireFormatError};
pub use declared::{DeclaredType, DocumentField, DocumentType, EnumType};
pub use descriptor::{
    ClassDescriptor, Generation, Getter, IndexKey, KeyRole, Mapped, PropertyDescriptor,
    PropertyMetadata, Setter,
};
pub use error::{MapperError, Result};
pub use native::{ExternalReference, NativeValue};
pub use number::{InvalidNumber, Number};
