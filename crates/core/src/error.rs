//! Error types for the mapper
//!
//! This module defines all error types used throughout the mapper.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Error Classes
//!
//! - **Structural** errors (`Classification`, `UnsupportedConversion`,
//!   `InvalidSchema`, `MissingDependency`) are raised while a table model is
//!   being built. They abort the build and are never deferred to per-record
//!   conversion.
//! - **Per-value** errors (`TypeMismatch`, `Parse`, `DuplicateSetElement`) are
//!   raised by individual convert/unconvert calls and propagate to the caller.
//! - `Config` is raised while loading mapper settings.

use thiserror::Error;

/// Result type alias for mapper operations
pub type Result<T> = std::result::Result<T, MapperError>;

/// Error types for the object mapper
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapperError {
    /// The declared type of a property has an ambiguous or unsupported shape
    #[error("cannot classify {class}.{property}: {reason}")]
    Classification {
        /// Owning type name
        class: String,
        /// Property name
        property: String,
        /// What made the shape unclassifiable
        reason: String,
    },

    /// The active conversion schema has no rule for this type/metadata combination
    #[error("no conversion for {class}.{property} under schema {schema}: {reason}")]
    UnsupportedConversion {
        /// Owning type name
        class: String,
        /// Property name
        property: String,
        /// Schema version tag
        schema: String,
        /// Which combination is unsupported
        reason: String,
    },

    /// Structural violation in the mapped type
    #[error("invalid schema for {class}: {reason}")]
    InvalidSchema {
        /// Owning type name
        class: String,
        /// Violation description
        reason: String,
    },

    /// A converter requires a collaborator that was not supplied
    #[error("{class}.{property} requires dependency {dependency}")]
    MissingDependency {
        /// Owning type name
        class: String,
        /// Property name
        property: String,
        /// Dependency type name
        dependency: String,
    },

    /// A value does not match the resolved type of its property
    #[error("type mismatch for {property}: expected {expected}, observed {observed}")]
    TypeMismatch {
        /// Property (or nested path) being converted
        property: String,
        /// Expected shape
        expected: String,
        /// Observed shape
        observed: String,
    },

    /// A value has the right shape but its content cannot be parsed
    #[error("cannot parse {property}: {reason}")]
    Parse {
        /// Property (or nested path) being converted
        property: String,
        /// Parse failure description
        reason: String,
    },

    /// A set-valued property contained the same element twice
    #[error("duplicate element {element} in set {property}")]
    DuplicateSetElement {
        /// Property (or nested path) being converted
        property: String,
        /// Rendering of the repeated element
        element: String,
    },

    /// Mapper settings could not be read or parsed
    #[error("invalid mapper settings: {0}")]
    Config(String),
}

impl MapperError {
    /// Create a classification error
    pub fn classification(
        class: impl Into<String>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MapperError::Classification {
            class: class.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported-conversion error
    pub fn unsupported(
        class: impl Into<String>,
        property: impl Into<String>,
        schema: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MapperError::UnsupportedConversion {
            class: class.into(),
            property: property.into(),
            schema: schema.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-schema error
    pub fn invalid_schema(class: impl Into<String>, reason: impl Into<String>) -> Self {
        MapperError::InvalidSchema {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(
        property: impl Into<String>,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        MapperError::TypeMismatch {
            property: property.into(),
            expected: expected.into(),
            observed: observed.into(),
        }
    }

    /// Create a parse error
    pub fn parse(property: impl Into<String>, reason: impl Into<String>) -> Self {
        MapperError::Parse {
            property: property.into(),
            reason: reason.into(),
        }
    }

    /// Create a settings error
    pub fn config(reason: impl Into<String>) -> Self {
        MapperError::Config(reason.into())
    }

    /// True for errors detected while building a table model
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            MapperError::Classification { .. }
                | MapperError::UnsupportedConversion { .. }
                | MapperError::InvalidSchema { .. }
                | MapperError::MissingDependency { .. }
        )
    }

    /// Attach an owning-class context to a structural error raised without one.
    ///
    /// Marshaller construction happens below the level that knows the type
    /// name; the model builder fills it in here.
    pub fn in_class(self, class_name: &str) -> Self {
        match self {
            MapperError::Classification {
                class,
                property,
                reason,
            } if class.is_empty() => MapperError::Classification {
                class: class_name.to_string(),
                property,
                reason,
            },
            MapperError::UnsupportedConversion {
                class,
                property,
                schema,
                reason,
            } if class.is_empty() => MapperError::UnsupportedConversion {
                class: class_name.to_string(),
                property,
                schema,
                reason,
            },
            MapperError::MissingDependency {
                class,
                property,
                dependency,
            } if class.is_empty() => MapperError::MissingDependency {
                class: class_name.to_string(),
                property,
                dependency,
            },
            other => other,
        }
    }
}
