//! Conversion schemas
//!
//! A conversion schema is a versioned rule set deciding how booleans and dates
//! are written and read, and whether nested collections are available at all.
//! The schema is a plain value carried by the mapper configuration; each
//! table model binds exactly one.
//!
//! | Concern | `V1` | `V2Compatible` | `V2` |
//! |---------|------|----------------|------|
//! | bool write | N `1`/`0` | N `1`/`0` | BOOL |
//! | bool read | N | N or BOOL | BOOL or N |
//! | date write | S ISO-8601 | S ISO-8601 | N epoch millis |
//! | date read | S | S | N or S |
//! | List / Map / Document | unsupported | supported | supported |
//!
//! Enums are stored by variant name under every schema.

use crate::converter::ItemConverter;
use crate::dependencies::Dependencies;
use crate::marshal::{ScalarCodec, ScalarKind, Wire};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strata_mapper_core::MapperError;
use tracing::debug;

/// Versioned conversion rule set
///
/// Serialized as its tag. Parsing, through `FromStr` or serde, ignores case
/// and accepts `-` for `_`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConversionSchema {
    /// Legacy encodings: numeric booleans, ISO dates, scalars and sets only
    V1,
    /// Legacy scalar encodings with nested collections; reads both boolean forms
    V2Compatible,
    /// Native booleans and epoch-millisecond dates
    #[default]
    V2,
}

impl ConversionSchema {
    /// Every schema, oldest first
    pub const ALL: [ConversionSchema; 3] = [
        ConversionSchema::V1,
        ConversionSchema::V2Compatible,
        ConversionSchema::V2,
    ];

    /// Configuration tag ("v1", "v2_compatible", "v2")
    pub fn tag(&self) -> &'static str {
        match self {
            ConversionSchema::V1 => "v1",
            ConversionSchema::V2Compatible => "v2_compatible",
            ConversionSchema::V2 => "v2",
        }
    }

    /// Whether List, Map and Document attributes can be mapped
    pub fn supports_nested(&self) -> bool {
        !matches!(self, ConversionSchema::V1)
    }

    /// Bind the schema to its collaborators
    pub fn converter(self, dependencies: Dependencies) -> ItemConverter {
        debug!(
            target: "strata::mapper::convert",
            schema = self.tag(),
            dependencies = dependencies.len(),
            "Bound conversion schema"
        );
        ItemConverter::new(self, dependencies)
    }

    pub(crate) fn bool_codec(&self) -> ScalarCodec {
        match self {
            ConversionSchema::V1 => ScalarCodec::new(ScalarKind::Bool, Wire::Number),
            ConversionSchema::V2Compatible => {
                ScalarCodec::new(ScalarKind::Bool, Wire::Number).reading_also(Wire::Bool)
            }
            ConversionSchema::V2 => {
                ScalarCodec::new(ScalarKind::Bool, Wire::Bool).reading_also(Wire::Number)
            }
        }
    }

    pub(crate) fn date_codec(&self) -> ScalarCodec {
        match self {
            ConversionSchema::V1 | ConversionSchema::V2Compatible => {
                ScalarCodec::new(ScalarKind::Date, Wire::String)
            }
            ConversionSchema::V2 => {
                ScalarCodec::new(ScalarKind::Date, Wire::Number).reading_also(Wire::String)
            }
        }
    }
}

impl fmt::Display for ConversionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ConversionSchema {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "v1" => Ok(ConversionSchema::V1),
            "v2_compatible" => Ok(ConversionSchema::V2Compatible),
            "v2" => Ok(ConversionSchema::V2),
            other => Err(MapperError::config(format!(
                "unknown conversion schema {:?}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ConversionSchema {
    type Error = MapperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConversionSchema> for String {
    fn from(schema: ConversionSchema) -> Self {
        schema.tag().to_string()
    }
}
