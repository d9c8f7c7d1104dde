//! Collaborators injected into converters
//!
//! Some converters need runtime state that the mapper does not own, such as
//! the resolver that knows the default location of external references.
//! [`Dependencies`] is a typed bag of such handles. Entries may be registered
//! eagerly or with an initializer that runs at most once, on first use.
//!
//! A missing entry only fails model builds for properties whose converter
//! asks for it.

use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Resolves external object references
pub trait ReferenceResolver: Send + Sync {
    /// Location applied to references stored without one
    fn default_location(&self) -> &str;
}

/// Resolver with a fixed default location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticReferenceResolver {
    location: String,
}

impl StaticReferenceResolver {
    /// Resolver defaulting to `location`
    pub fn new(location: impl Into<String>) -> Self {
        StaticReferenceResolver {
            location: location.into(),
        }
    }
}

impl ReferenceResolver for StaticReferenceResolver {
    fn default_location(&self) -> &str {
        &self.location
    }
}

struct Slot<T> {
    cell: OnceCell<T>,
    init: Option<Box<dyn Fn() -> T + Send + Sync>>,
}

impl<T: Clone> Slot<T> {
    fn get(&self) -> Option<T> {
        match &self.init {
            Some(init) => Some(self.cell.get_or_init(|| init()).clone()),
            None => self.cell.get().cloned(),
        }
    }
}

/// Typed bag of collaborator handles
///
/// Keyed by the handle's type, so there is at most one entry per type.
/// Cloning shares the entries, including lazily-initialized ones.
#[derive(Clone, Default)]
pub struct Dependencies {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    names: HashMap<TypeId, &'static str>,
}

impl Dependencies {
    /// Empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ready value
    pub fn insert<T>(&mut self, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let cell = OnceCell::new();
        let _ = cell.set(value);
        self.put(Slot { cell, init: None });
    }

    /// Register a value built on first use, shared by every later lookup
    pub fn insert_lazy<T, F>(&mut self, init: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.put(Slot {
            cell: OnceCell::new(),
            init: Some(Box::new(init)),
        });
    }

    fn put<T>(&mut self, slot: Slot<T>)
    where
        T: Clone + Send + Sync + 'static,
    {
        let id = TypeId::of::<T>();
        self.entries.insert(id, Arc::new(slot));
        self.names.insert(id, std::any::type_name::<T>());
    }

    /// Look up a handle by type
    pub fn get<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Slot<T>>())
            .and_then(Slot::get)
    }

    /// Register the resolver used by external-reference properties
    pub fn with_reference_resolver(mut self, resolver: impl ReferenceResolver + 'static) -> Self {
        let resolver: Arc<dyn ReferenceResolver> = Arc::new(resolver);
        self.insert(resolver);
        self
    }

    /// Resolver used by external-reference properties
    pub fn reference_resolver(&self) -> Option<Arc<dyn ReferenceResolver>> {
        self.get::<Arc<dyn ReferenceResolver>>()
    }

    /// Number of registered handles
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names.values().copied().collect();
        names.sort_unstable();
        f.debug_struct("Dependencies").field("entries", &names).finish()
    }
}
