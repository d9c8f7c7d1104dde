//! Mapper Comprehensive Test Suite
//!
//! End-to-end coverage of the object mapper: records described through the
//! descriptor capability, converted to items and back under each conversion
//! schema.
//!
//! ## Modules
//!
//! - `round_trip`: full records with every value kind
//! - `dates`: date encodings per schema
//! - `keys`: key validation, key helpers, attribute naming
//! - `sets`: duplicate and empty set handling
//! - `converters`: custom converters and external references
//! - `settings`: TOML settings and table names
//! - `wire`: the store's JSON wire form
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test mapper_comprehensive
//!
//! # Date scenarios only
//! cargo test --test mapper_comprehensive dates::
//! ```

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Once;

pub use strata_mapper::{
    AttributeType, AttributeValue, ClassDescriptor, ConversionSchema, DeclaredType, DocumentType,
    Generation, Item, Mapped, Mapper, MapperConfig, MapperError, ModelFactory, NativeValue,
    Number, PropertyDescriptor, PropertyMetadata, Result,
};
pub use strata_mapper::{item_from_json, item_to_json, MapperSettings, TableNameOverride};

pub mod converters;
pub mod dates;
pub mod sets;
pub mod wire;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

static INIT_TRACING: Once = Once::new();

/// Route mapper logs to the test harness output
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Mapper with its own model cache, so suites do not share models
pub fn mapper(schema: ConversionSchema) -> Mapper {
    init_tracing();
    let config = MapperConfig::builder().conversion_schema(schema).build();
    Mapper::with_factory(&ModelFactory::new(), config)
}

// =============================================================================
// FIXTURES
// =============================================================================

/// Order status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Pending,
    Shipped,
    Cancelled,
}

impl Status {
    fn name(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Shipped => "Shipped",
            Status::Cancelled => "Cancelled",
        }
    }

    fn parse(name: &str, property: &str) -> Result<Self> {
        match name {
            "Pending" => Ok(Status::Pending),
            "Shipped" => Ok(Status::Shipped),
            "Cancelled" => Ok(Status::Cancelled),
            other => Err(MapperError::parse(property, format!("unknown status {}", other))),
        }
    }

    fn declared() -> DeclaredType {
        DeclaredType::enumeration("Status", ["Pending", "Shipped", "Cancelled"])
    }
}

/// One order line, stored as a nested document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub sku: String,
    pub quantity: i64,
    pub gift: bool,
}

impl Line {
    fn declared() -> DeclaredType {
        DocumentType::new("Line")
            .field("sku", DeclaredType::String)
            .field_with(
                "quantity",
                DeclaredType::Integer,
                PropertyMetadata::new().attribute_name("qty"),
            )
            .field("gift", DeclaredType::Bool)
            .into_declared()
    }

    fn to_native(&self) -> NativeValue {
        let mut fields = BTreeMap::new();
        fields.insert("sku".to_string(), NativeValue::from(self.sku.clone()));
        fields.insert("quantity".to_string(), NativeValue::Int(self.quantity));
        fields.insert("gift".to_string(), NativeValue::Bool(self.gift));
        NativeValue::Document(fields)
    }

    fn from_native(value: NativeValue) -> Result<Self> {
        let mut fields = value.into_document("lines")?;
        let mut take = |name: &str| fields.remove(name).unwrap_or(NativeValue::Null);
        Ok(Line {
            sku: take("sku").into_option("lines.sku", NativeValue::into_string)?.unwrap_or_default(),
            quantity: take("quantity")
                .into_option("lines.quantity", NativeValue::into_int)?
                .unwrap_or_default(),
            gift: take("gift").into_option("lines.gift", NativeValue::into_bool)?.unwrap_or_default(),
        })
    }
}

/// A record exercising every value kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    pub customer: String,
    pub number: i64,
    pub total: Option<Number>,
    pub paid: bool,
    pub weight: f64,
    pub status: Status,
    pub tags: Vec<String>,
    pub lines: Vec<Line>,
    pub notes: BTreeMap<String, String>,
    pub receipt: Option<Vec<u8>>,
    pub placed_at: Option<DateTime<Utc>>,
    pub version: Option<i64>,
}

fn string_list(values: &[String]) -> Vec<NativeValue> {
    values.iter().cloned().map(NativeValue::String).collect()
}

impl Mapped for Order {
    fn describe() -> ClassDescriptor<Self> {
        ClassDescriptor::new("Order")
            .table("orders")
            .property(
                PropertyDescriptor::new("customer", DeclaredType::String)
                    .with_metadata(PropertyMetadata::new().hash_key())
                    .getter(|o: &Order| o.customer.clone().into())
                    .setter(|o, v| {
                        o.customer = v.into_string("customer")?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("number", DeclaredType::Integer)
                    .with_metadata(PropertyMetadata::new().range_key().attribute_name("order_no"))
                    .getter(|o: &Order| o.number.into())
                    .setter(|o, v| {
                        o.number = v.into_int("number")?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("total", DeclaredType::Decimal)
                    .getter(|o: &Order| o.total.clone().into())
                    .setter(|o, v| {
                        o.total = v.into_option("total", NativeValue::into_decimal)?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("paid", DeclaredType::Bool)
                    .getter(|o: &Order| o.paid.into())
                    .setter(|o, v| {
                        o.paid = v.into_bool("paid")?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("weight", DeclaredType::Float)
                    .getter(|o: &Order| o.weight.into())
                    .setter(|o, v| {
                        o.weight = v.into_float("weight")?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("status", Status::declared())
                    .getter(|o: &Order| NativeValue::Enum(o.status.name().to_string()))
                    .setter(|o, v| {
                        o.status = Status::parse(&v.into_enum("status")?, "status")?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("tags", DeclaredType::set_of(DeclaredType::String))
                    .getter(|o: &Order| NativeValue::Set(string_list(&o.tags)))
                    .setter(|o, v| {
                        o.tags = v
                            .into_set("tags")?
                            .into_iter()
                            .map(|t| t.into_string("tags"))
                            .collect::<Result<_>>()?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("lines", DeclaredType::list_of(Line::declared()))
                    .getter(|o: &Order| {
                        NativeValue::List(o.lines.iter().map(Line::to_native).collect())
                    })
                    .setter(|o, v| {
                        o.lines = v
                            .into_list("lines")?
                            .into_iter()
                            .map(Line::from_native)
                            .collect::<Result<_>>()?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("notes", DeclaredType::map_of(DeclaredType::String))
                    .getter(|o: &Order| {
                        NativeValue::Map(
                            o.notes
                                .iter()
                                .map(|(k, v)| (k.clone(), NativeValue::from(v.clone())))
                                .collect(),
                        )
                    })
                    .setter(|o, v| {
                        o.notes = v
                            .into_map("notes")?
                            .into_iter()
                            .map(|(k, v)| Ok((k, v.into_string("notes")?)))
                            .collect::<Result<_>>()?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("receipt", DeclaredType::Bytes)
                    .getter(|o: &Order| o.receipt.clone().into())
                    .setter(|o, v| {
                        o.receipt = v.into_option("receipt", NativeValue::into_bytes)?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("placed_at", DeclaredType::Date)
                    .with_metadata(PropertyMetadata::new().generated(Generation::CreatedTimestamp))
                    .getter(|o: &Order| o.placed_at.into())
                    .setter(|o, v| {
                        o.placed_at = v.into_option("placed_at", NativeValue::into_date)?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("version", DeclaredType::Integer)
                    .with_metadata(PropertyMetadata::new().generated(Generation::Version))
                    .getter(|o: &Order| o.version.into())
                    .setter(|o, v| {
                        o.version = v.into_option("version", NativeValue::into_int)?;
                        Ok(())
                    }),
            )
    }
}

/// A fully populated order
pub fn sample_order() -> Order {
    let mut notes = BTreeMap::new();
    notes.insert("gift-wrap".to_string(), "blue".to_string());
    notes.insert("door".to_string(), "side entrance, ring twice ✓".to_string());

    Order {
        customer: "cust-42".to_string(),
        number: 1001,
        total: Some(Number::parse("12345678901234567890.0000000001").unwrap()),
        paid: true,
        weight: 2.5,
        status: Status::Shipped,
        tags: vec!["priority".to_string(), "fragile".to_string()],
        lines: vec![
            Line {
                sku: "A-1".to_string(),
                quantity: 2,
                gift: false,
            },
            Line {
                sku: "B-7".to_string(),
                quantity: 1,
                gift: true,
            },
        ],
        notes,
        receipt: Some(vec![0, 1, 2, 254, 255]),
        placed_at: None,
        version: None,
    }
}

/// A flat record every schema can store, including V1
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub id: String,
    pub at: Option<DateTime<Utc>>,
    pub urgent: bool,
}

impl Mapped for Event {
    fn describe() -> ClassDescriptor<Self> {
        ClassDescriptor::new("Event")
            .table("events")
            .property(
                PropertyDescriptor::new("id", DeclaredType::String)
                    .with_metadata(PropertyMetadata::new().hash_key())
                    .getter(|e: &Event| e.id.clone().into())
                    .setter(|e, v| {
                        e.id = v.into_string("id")?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("at", DeclaredType::Date)
                    .getter(|e: &Event| e.at.into())
                    .setter(|e, v| {
                        e.at = v.into_option("at", NativeValue::into_date)?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("urgent", DeclaredType::Bool)
                    .getter(|e: &Event| e.urgent.into())
                    .setter(|e, v| {
                        e.urgent = v.into_bool("urgent")?;
                        Ok(())
                    }),
            )
    }
}
