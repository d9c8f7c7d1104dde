//! Custom converters and external references

use super::*;
use strata_mapper::{ExternalReference, StaticReferenceResolver, TypeConverter};

/// Integer cents stored as decimal text
struct Cents;

impl TypeConverter for Cents {
    fn stored_type(&self) -> DeclaredType {
        DeclaredType::String
    }

    fn convert(&self, value: &NativeValue) -> Result<NativeValue> {
        let cents = value.clone().into_int("amount")?;
        Ok(NativeValue::String(format!(
            "{}{}.{:02}",
            if cents < 0 { "-" } else { "" },
            (cents / 100).unsigned_abs(),
            (cents % 100).unsigned_abs()
        )))
    }

    fn unconvert(&self, value: NativeValue) -> Result<NativeValue> {
        let text = value.into_string("amount")?;
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.as_str()),
        };
        let (whole, fraction) = unsigned
            .split_once('.')
            .ok_or_else(|| MapperError::parse("amount", format!("{:?} has no cents", text)))?;
        let whole: i64 = whole
            .parse()
            .map_err(|_| MapperError::parse("amount", format!("bad amount {:?}", text)))?;
        let fraction: i64 = fraction
            .parse()
            .map_err(|_| MapperError::parse("amount", format!("bad amount {:?}", text)))?;
        let cents = whole * 100 + fraction;
        Ok(NativeValue::Int(if negative { -cents } else { cents }))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Invoice {
    id: String,
    amount: Option<i64>,
    fee: i64,
}

impl Mapped for Invoice {
    fn describe() -> ClassDescriptor<Self> {
        ClassDescriptor::new("Invoice")
            .property(
                PropertyDescriptor::new("id", DeclaredType::String)
                    .with_metadata(PropertyMetadata::new().hash_key())
                    .getter(|i: &Invoice| i.id.clone().into())
                    .setter(|i, v| {
                        i.id = v.into_string("id")?;
                        Ok(())
                    }),
            )
            .property(
                // No built-in mapping; resolved through the type registry.
                PropertyDescriptor::new("amount", DeclaredType::opaque("Money"))
                    .getter(|i: &Invoice| i.amount.into())
                    .setter(|i, v| {
                        i.amount = v.into_option("amount", NativeValue::into_int)?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("fee", DeclaredType::Integer)
                    .with_metadata(PropertyMetadata::new().converter("cents"))
                    .getter(|i: &Invoice| i.fee.into())
                    .setter(|i, v| {
                        i.fee = v.into_int("fee")?;
                        Ok(())
                    }),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Photo {
    id: String,
    image: Option<ExternalReference>,
}

impl Mapped for Photo {
    fn describe() -> ClassDescriptor<Self> {
        ClassDescriptor::new("Photo")
            .property(
                PropertyDescriptor::new("id", DeclaredType::String)
                    .with_metadata(PropertyMetadata::new().hash_key())
                    .getter(|p: &Photo| p.id.clone().into())
                    .setter(|p, v| {
                        p.id = v.into_string("id")?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("image", DeclaredType::Reference)
                    .getter(|p: &Photo| match &p.image {
                        Some(r) => NativeValue::Reference(r.clone()),
                        None => NativeValue::Null,
                    })
                    .setter(|p, v| {
                        p.image = v.into_option("image", NativeValue::into_reference)?;
                        Ok(())
                    }),
            )
    }
}

fn invoice_mapper(schema: ConversionSchema) -> Mapper {
    init_tracing();
    let config = MapperConfig::builder()
        .conversion_schema(schema)
        .type_converter("Money", Cents)
        .named_converter("cents", Cents)
        .build();
    Mapper::with_factory(&ModelFactory::new(), config)
}

fn photo_mapper(resolver: Option<StaticReferenceResolver>) -> Mapper {
    init_tracing();
    let mut builder = MapperConfig::builder();
    if let Some(resolver) = resolver {
        builder = builder.reference_resolver(resolver);
    }
    Mapper::with_factory(&ModelFactory::new(), builder.build())
}

// ============================================================================
// Custom converters
// ============================================================================

#[test]
fn test_opaque_and_named_converters_round_trip() {
    let mapper = invoice_mapper(ConversionSchema::V2);
    let invoice = Invoice {
        id: "inv-1".into(),
        amount: Some(1234),
        fee: 5,
    };

    let item = mapper.to_item(&invoice).unwrap();
    assert_eq!(item["amount"], AttributeValue::String("12.34".into()));
    assert_eq!(item["fee"], AttributeValue::String("0.05".into()));

    let back: Invoice = mapper.from_item(&item).unwrap();
    assert_eq!(back, invoice);
}

#[test]
fn test_negative_amounts_round_trip() {
    let mapper = invoice_mapper(ConversionSchema::V2);
    let refund = Invoice {
        id: "inv-4".into(),
        amount: Some(-150),
        fee: -5,
    };

    let item = mapper.to_item(&refund).unwrap();
    assert_eq!(item["amount"], AttributeValue::String("-1.50".into()));
    assert_eq!(item["fee"], AttributeValue::String("-0.05".into()));

    let back: Invoice = mapper.from_item(&item).unwrap();
    assert_eq!(back, refund);
}

#[test]
fn test_converter_never_sees_null() {
    let mapper = invoice_mapper(ConversionSchema::V1);
    let invoice = Invoice {
        id: "inv-2".into(),
        amount: None,
        fee: 0,
    };

    let item = mapper.to_item(&invoice).unwrap();
    assert!(!item.contains_key("amount"));

    let back: Invoice = mapper.from_item(&item).unwrap();
    assert_eq!(back.amount, None);
}

#[test]
fn test_converter_parse_errors_surface() {
    let mapper = invoice_mapper(ConversionSchema::V2);
    let mut item = mapper
        .to_item(&Invoice {
            id: "inv-3".into(),
            amount: Some(1),
            fee: 1,
        })
        .unwrap();
    item.insert("amount".into(), AttributeValue::String("twelve".into()));

    let err = mapper.from_item::<Invoice>(&item).unwrap_err();
    assert!(matches!(err, MapperError::Parse { .. }), "{:?}", err);
}

#[test]
fn test_opaque_type_without_converter_fails_to_classify() {
    let err = mapper(ConversionSchema::V2).table::<Invoice>().unwrap_err();
    match err {
        MapperError::Classification {
            class, property, ..
        } => {
            assert_eq!(class, "Invoice");
            assert_eq!(property, "amount");
        }
        other => panic!("expected Classification, got {:?}", other),
    }
}

// ============================================================================
// External references
// ============================================================================

#[test]
fn test_reference_default_location_is_filled() {
    let mapper = photo_mapper(Some(StaticReferenceResolver::new("eu-1")));
    let photo = Photo {
        id: "p-1".into(),
        image: Some(ExternalReference::new("", "photos/1.png")),
    };

    let item = mapper.to_item(&photo).unwrap();
    let stored = item["image"].as_str().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stored).unwrap();
    assert_eq!(parsed["location"], "eu-1");
    assert_eq!(parsed["key"], "photos/1.png");

    let back: Photo = mapper.from_item(&item).unwrap();
    assert_eq!(
        back.image,
        Some(ExternalReference::new("eu-1", "photos/1.png"))
    );
}

#[test]
fn test_reference_with_location_is_kept() {
    let mapper = photo_mapper(Some(StaticReferenceResolver::new("eu-1")));
    let photo = Photo {
        id: "p-2".into(),
        image: Some(ExternalReference::new("us-2", "a.png")),
    };
    let back: Photo = mapper.from_item(&mapper.to_item(&photo).unwrap()).unwrap();
    assert_eq!(back, photo);
}

#[test]
fn test_reference_without_resolver_is_a_missing_dependency() {
    let err = photo_mapper(None).table::<Photo>().unwrap_err();
    match err {
        MapperError::MissingDependency {
            class,
            property,
            dependency,
        } => {
            assert_eq!(class, "Photo");
            assert_eq!(property, "image");
            assert_eq!(dependency, "ReferenceResolver");
        }
        other => panic!("expected MissingDependency, got {:?}", other),
    }
}
