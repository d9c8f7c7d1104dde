//! strata-mapper - object mapping for key-value document stores
//!
//! Translates between typed application records and the schemaless attribute
//! maps a key-value/document store persists. A type describes its properties
//! once; the mapper classifies each one, picks a conversion strategy under the
//! configured schema, and caches the result per (type, configuration).
//!
//! # Quick Start
//!
//! ```ignore
//! use strata_mapper::{Mapper, MapperConfig};
//!
//! let mapper = Mapper::new(MapperConfig::default());
//!
//! // Record -> item, filling generated attributes first
//! let item = mapper.prepare_write(&mut order)?;
//!
//! // Item -> record
//! let order: Order = mapper.from_item(&item)?;
//! ```
//!
//! # Architecture
//!
//! - `strata-mapper-core`: attribute values, native values, descriptors, errors
//! - `strata-mapper-convert`: classification, marshallers, conversion schemas
//! - `strata-mapper-model`: configuration, table models, the model cache
//!
//! Sending items to a store is left to the caller.

mod mapper;

pub use mapper::Mapper;

pub use strata_mapper_convert::{
    classify, ConversionSchema, Dependencies, ItemConverter, Marshaller, PropertySignature,
    ReferenceResolver, StaticReferenceResolver, TypeConverter, TypeConverterFactory,
};
pub use strata_mapper_core::{
    item_from_json, item_to_json, AttributeType, AttributeValue, ClassDescriptor, DeclaredType,
    DocumentField, DocumentType, EnumType, ExternalReference, Generation, Getter, IndexKey, Item,
    KeyRole, Mapped, MapperError, NativeValue, Number, PropertyDescriptor, PropertyMetadata,
    Result, Setter, WireFormatError,
};
pub use strata_mapper_model::{
    build_table_model, AttributeDefinition, FieldModel, IndexKeySchema, KeySchemaElement,
    MapperConfig, MapperConfigBuilder, MapperSettings, ModelFactory, TableFactory, TableModel,
    TableNameOverride, SETTINGS_FILE_NAME,
};
