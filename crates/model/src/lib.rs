//! Table models for the object mapper
//!
//! This crate resolves mapped types into cached table models:
//! - Config: schema, converters, table names, dependencies (`mapper.toml`)
//! - Field models: one resolved property each
//! - Table models: fields, keys, item conversion, generated values
//! - Factory: at most one build per (type, configuration)
//!
//! Everything built here is immutable and shared through `Arc`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod factory;
pub mod field;
pub mod table;

pub use builder::build_table_model;
pub use config::{
    MapperConfig, MapperConfigBuilder, MapperSettings, TableNameOverride, SETTINGS_FILE_NAME,
};
pub use factory::{ModelFactory, TableFactory};
pub use field::FieldModel;
pub use table::{AttributeDefinition, IndexKeySchema, KeySchemaElement, TableModel};
