//! Mapper configuration
//!
//! [`MapperConfig`] bundles everything a table model build depends on: the
//! conversion schema, the custom converter registry, the table name override
//! and the dependency bag. It is immutable once built. Each `build()` mints a
//! new identity; clones keep it, so every clone shares cached table models.
//!
//! The serializable subset lives in [`MapperSettings`] and can be loaded from
//! a `mapper.toml` file:
//!
//! ```toml
//! conversion_schema = "v2"
//! table_prefix = "prod-"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strata_mapper_convert::{
    ConversionSchema, Dependencies, ItemConverter, ReferenceResolver, TypeConverter,
    TypeConverterFactory,
};
use strata_mapper_core::{MapperError, Result};

/// Config file name conventionally used for mapper settings.
pub const SETTINGS_FILE_NAME: &str = "mapper.toml";

static NEXT_CONFIG_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Table names
// ============================================================================

/// Rewrites the table name a type declares
#[derive(Clone)]
pub enum TableNameOverride {
    /// Use this name for every type
    Replace(String),
    /// Prepend this prefix to the declared name
    Prefix(String),
    /// Compute the name from the declared one
    Resolver(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl TableNameOverride {
    /// Override computed by a closure
    pub fn resolver(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        TableNameOverride::Resolver(Arc::new(f))
    }

    /// Apply to a declared table name
    pub fn apply(&self, declared: &str) -> String {
        match self {
            TableNameOverride::Replace(name) => name.clone(),
            TableNameOverride::Prefix(prefix) => format!("{}{}", prefix, declared),
            TableNameOverride::Resolver(f) => f(declared),
        }
    }
}

impl fmt::Debug for TableNameOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableNameOverride::Replace(name) => f.debug_tuple("Replace").field(name).finish(),
            TableNameOverride::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            TableNameOverride::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

// ============================================================================
// MapperConfig
// ============================================================================

/// Immutable mapper configuration
#[derive(Debug, Clone)]
pub struct MapperConfig {
    id: u64,
    conversion_schema: ConversionSchema,
    type_converters: TypeConverterFactory,
    table_name_override: Option<TableNameOverride>,
    dependencies: Dependencies,
}

impl MapperConfig {
    /// Start building a configuration
    pub fn builder() -> MapperConfigBuilder {
        MapperConfigBuilder::new()
    }

    /// Configuration built from loaded settings
    pub fn from_settings(settings: &MapperSettings) -> Self {
        Self::builder().settings(settings).build()
    }

    /// Identity used to key cached table models
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Active conversion schema
    pub fn conversion_schema(&self) -> ConversionSchema {
        self.conversion_schema
    }

    /// Custom converter registry
    pub fn type_converters(&self) -> &TypeConverterFactory {
        &self.type_converters
    }

    /// Table name override, if any
    pub fn table_name_override(&self) -> Option<&TableNameOverride> {
        self.table_name_override.as_ref()
    }

    /// Injected collaborators
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Resolve the table name for a declared name
    pub fn table_name(&self, declared: &str) -> String {
        match &self.table_name_override {
            Some(o) => o.apply(declared),
            None => declared.to_string(),
        }
    }

    /// The conversion schema bound to this configuration's collaborators
    pub fn item_converter(&self) -> ItemConverter {
        self.conversion_schema
            .converter(self.dependencies.clone())
            .with_type_converters(self.type_converters.clone())
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`MapperConfig`]
#[derive(Debug, Clone, Default)]
pub struct MapperConfigBuilder {
    conversion_schema: ConversionSchema,
    type_converters: TypeConverterFactory,
    table_name_override: Option<TableNameOverride>,
    dependencies: Dependencies,
}

impl MapperConfigBuilder {
    /// Builder with the default schema and no collaborators
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conversion schema
    pub fn conversion_schema(mut self, schema: ConversionSchema) -> Self {
        self.conversion_schema = schema;
        self
    }

    /// Replace the custom converter registry
    pub fn type_converters(mut self, converters: TypeConverterFactory) -> Self {
        self.type_converters = converters;
        self
    }

    /// Register a converter that properties select by name
    pub fn named_converter(
        mut self,
        name: impl Into<String>,
        converter: impl TypeConverter + 'static,
    ) -> Self {
        self.type_converters = self.type_converters.with_named(name, converter);
        self
    }

    /// Register the converter for an opaque type
    pub fn type_converter(
        mut self,
        type_name: impl Into<String>,
        converter: impl TypeConverter + 'static,
    ) -> Self {
        self.type_converters = self.type_converters.with_type(type_name, converter);
        self
    }

    /// Rewrite table names
    pub fn table_name_override(mut self, table_name_override: TableNameOverride) -> Self {
        self.table_name_override = Some(table_name_override);
        self
    }

    /// Prefix every table name
    pub fn table_prefix(self, prefix: impl Into<String>) -> Self {
        self.table_name_override(TableNameOverride::Prefix(prefix.into()))
    }

    /// Replace the dependency bag
    pub fn dependencies(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Register the resolver used by external-reference properties
    pub fn reference_resolver(mut self, resolver: impl ReferenceResolver + 'static) -> Self {
        self.dependencies = self.dependencies.with_reference_resolver(resolver);
        self
    }

    /// Apply loaded settings
    pub fn settings(mut self, settings: &MapperSettings) -> Self {
        self.conversion_schema = settings.conversion_schema;
        if let Some(prefix) = &settings.table_prefix {
            self.table_name_override = Some(TableNameOverride::Prefix(prefix.clone()));
        }
        self
    }

    /// Finish, minting a new identity
    pub fn build(self) -> MapperConfig {
        MapperConfig {
            id: NEXT_CONFIG_ID.fetch_add(1, Ordering::Relaxed),
            conversion_schema: self.conversion_schema,
            type_converters: self.type_converters,
            table_name_override: self.table_name_override,
            dependencies: self.dependencies,
        }
    }
}

// ============================================================================
// MapperSettings
// ============================================================================

/// Serializable mapper settings, loaded from `mapper.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapperSettings {
    /// Conversion schema: `"v1"`, `"v2_compatible"` or `"v2"` (default).
    /// Case-insensitive; `"v2-compatible"` is also accepted.
    #[serde(default)]
    pub conversion_schema: ConversionSchema,
    /// Prefix prepended to every table name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_prefix: Option<String>,
}

impl MapperSettings {
    /// Returns the default settings file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Object mapper settings
#
# Conversion schema: "v1", "v2_compatible" or "v2" (default)
#   "v1"            = numeric booleans, ISO-8601 dates, no lists/maps/documents
#   "v2_compatible" = v1 scalar encodings with lists/maps/documents
#   "v2"            = native booleans, epoch-millisecond dates
conversion_schema = "v2"

# Prefix prepended to every table name (optional)
# table_prefix = "prod-"
"#
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| MapperError::config(format!("failed to parse settings: {}", e)))
    }

    /// Read and parse settings from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MapperError::config(format!(
                "failed to read settings file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            MapperError::Config(reason) => {
                MapperError::config(format!("{} ({})", reason, path.display()))
            }
            other => other,
        })
    }

    /// Serialize these settings to TOML and write them to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MapperError::config(format!("failed to serialize settings: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            MapperError::config(format!(
                "failed to write settings file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
