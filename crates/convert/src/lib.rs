//! Conversion engine for the object mapper
//!
//! This crate turns declared property shapes into marshallers:
//! - Classification: declared type + metadata -> storage category
//! - Marshallers: native value <-> attribute value, one per property
//! - Conversion schemas: versioned boolean/date/collection rules
//! - Custom converters and injected dependencies
//!
//! Everything here is pure and `Send + Sync`. Caching of built marshallers
//! belongs to the model layer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod converter;
pub mod custom;
pub mod dependencies;
pub mod marshal;
pub mod schema;

pub use classify::classify;
pub use converter::{ItemConverter, PropertySignature};
pub use custom::{TypeConverter, TypeConverterFactory};
pub use dependencies::{Dependencies, ReferenceResolver, StaticReferenceResolver};
pub use marshal::Marshaller;
pub use schema::ConversionSchema;
