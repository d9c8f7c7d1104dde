//! High-level typed wrapper over the model cache.
//!
//! [`Mapper`] binds one configuration to a model factory and exposes
//! record-level conversions. Table models are resolved through the cache on
//! every call, so the first call per type pays for the build and later calls
//! are a map lookup.

use std::sync::Arc;
use strata_mapper_core::{Item, Mapped, Result};
use strata_mapper_model::{MapperConfig, ModelFactory, TableFactory, TableModel};

/// Record-level conversions for one configuration
#[derive(Debug, Clone)]
pub struct Mapper {
    tables: TableFactory,
}

impl Mapper {
    /// Mapper over the process-wide model cache
    pub fn new(config: MapperConfig) -> Self {
        Self::with_factory(ModelFactory::global(), config)
    }

    /// Mapper over a caller-owned model cache
    pub fn with_factory(factory: &ModelFactory, config: MapperConfig) -> Self {
        Mapper {
            tables: factory.table_factory(config),
        }
    }

    /// The bound configuration
    pub fn config(&self) -> &MapperConfig {
        self.tables.config()
    }

    /// Table model for `T`
    pub fn table<T: Mapped>(&self) -> Result<Arc<TableModel<T>>> {
        self.tables.table::<T>()
    }

    /// Resolved table name for `T`
    pub fn table_name<T: Mapped>(&self) -> Result<String> {
        Ok(self.table::<T>()?.table_name().to_string())
    }

    /// Convert a record to an item as-is
    pub fn to_item<T: Mapped>(&self, object: &T) -> Result<Item> {
        self.table::<T>()?.convert(object)
    }

    /// Fill generated attributes, then convert
    pub fn prepare_write<T: Mapped>(&self, object: &mut T) -> Result<Item> {
        let table = self.table::<T>()?;
        table.apply_generated(object)?;
        table.convert(object)
    }

    /// Build a record from an item
    pub fn from_item<T: Mapped>(&self, item: &Item) -> Result<T> {
        self.table::<T>()?.unconvert(item)
    }

    /// Primary key attributes of a record
    pub fn key<T: Mapped>(&self, object: &T) -> Result<Item> {
        self.table::<T>()?.key(object)
    }
}
