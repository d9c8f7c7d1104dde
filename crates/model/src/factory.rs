//! Table model cache
//!
//! [`ModelFactory`] memoizes table models per (type, configuration identity).
//! Each key owns a `OnceCell` slot:
//!
//! - the first caller describes the type and builds the model;
//! - concurrent callers for the same key block until that build finishes and
//!   share its `Arc`;
//! - a failed build leaves the slot empty, so the next caller retries.
//!
//! Entries are never evicted. Table models are small and the set of mapped
//! types is fixed for the life of a process.

use crate::builder::build_table_model;
use crate::config::MapperConfig;
use crate::table::TableModel;
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use strata_mapper_core::{Mapped, MapperError, Result};
use tracing::{trace, warn};

type Slot = Arc<OnceCell<Arc<dyn Any + Send + Sync>>>;

/// Process-wide factory used by [`ModelFactory::global`]
static GLOBAL: Lazy<ModelFactory> = Lazy::new(ModelFactory::new);

/// Builds and caches table models
///
/// Cheap to clone; clones share the cache.
#[derive(Clone, Default)]
pub struct ModelFactory {
    models: Arc<DashMap<(TypeId, u64), Slot>>,
}

impl ModelFactory {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide factory
    pub fn global() -> &'static ModelFactory {
        &GLOBAL
    }

    /// Table model for `T` under `config`, building it on first use
    ///
    /// # Thread Safety
    ///
    /// Safe to call concurrently. The model is built at most once per
    /// (type, configuration); the map shard lock is released before the
    /// build runs, so builds for other keys proceed in parallel.
    pub fn table<T: Mapped>(&self, config: &MapperConfig) -> Result<Arc<TableModel<T>>> {
        let key = (TypeId::of::<T>(), config.id());
        let slot: Slot = self
            .models
            .entry(key)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        if let Some(model) = slot.get() {
            trace!(
                target: "strata::mapper::model",
                type_name = std::any::type_name::<T>(),
                config = config.id(),
                "Table model cache hit"
            );
            return downcast(model);
        }

        let model = slot
            .get_or_try_init(|| {
                build_table_model(T::describe(), config)
                    .map(|m| Arc::new(m) as Arc<dyn Any + Send + Sync>)
            })
            .map_err(|e| {
                warn!(
                    target: "strata::mapper::model",
                    type_name = std::any::type_name::<T>(),
                    config = config.id(),
                    error = %e,
                    "Table model build failed"
                );
                e
            })?;
        downcast(model)
    }

    /// A factory bound to one configuration
    pub fn table_factory(&self, config: MapperConfig) -> TableFactory {
        TableFactory {
            factory: self.clone(),
            config,
        }
    }

    /// Number of cached models
    pub fn len(&self) -> usize {
        self.models.iter().filter(|e| e.value().get().is_some()).count()
    }

    /// True when no model has been built
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("models", &self.len())
            .finish()
    }
}

fn downcast<T: Mapped>(model: &Arc<dyn Any + Send + Sync>) -> Result<Arc<TableModel<T>>> {
    // The TypeId in the key guarantees the concrete type.
    Arc::clone(model).downcast::<TableModel<T>>().map_err(|_| {
        MapperError::invalid_schema(
            std::any::type_name::<T>(),
            "cached table model has a different type",
        )
    })
}

/// Table models for one configuration
#[derive(Debug, Clone)]
pub struct TableFactory {
    factory: ModelFactory,
    config: MapperConfig,
}

impl TableFactory {
    /// Table model for `T`
    pub fn table<T: Mapped>(&self) -> Result<Arc<TableModel<T>>> {
        self.factory.table::<T>(&self.config)
    }

    /// The bound configuration
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }
}
