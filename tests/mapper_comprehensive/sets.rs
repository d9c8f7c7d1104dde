//! Set-valued properties: distinctness, empty sets, element encodings

use super::*;
use chrono::TimeZone;

#[derive(Debug, Clone, Default, PartialEq)]
struct Survey {
    id: String,
    scores: Vec<i64>,
    answers: Vec<bool>,
    milestones: Vec<DateTime<Utc>>,
    ratings: Vec<Number>,
    weights: Vec<f64>,
}

fn native_set<T: Clone + Into<NativeValue>>(values: &[T]) -> NativeValue {
    NativeValue::Set(values.iter().cloned().map(Into::into).collect())
}

fn from_set<T>(
    value: NativeValue,
    property: &str,
    f: fn(NativeValue, &str) -> Result<T>,
) -> Result<Vec<T>> {
    value
        .into_set(property)?
        .into_iter()
        .map(|v| f(v, property))
        .collect()
}

impl Mapped for Survey {
    fn describe() -> ClassDescriptor<Self> {
        ClassDescriptor::new("Survey")
            .property(
                PropertyDescriptor::new("id", DeclaredType::String)
                    .with_metadata(PropertyMetadata::new().hash_key())
                    .getter(|s: &Survey| s.id.clone().into())
                    .setter(|s, v| {
                        s.id = v.into_string("id")?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("scores", DeclaredType::set_of(DeclaredType::Integer))
                    .getter(|s: &Survey| native_set(&s.scores))
                    .setter(|s, v| {
                        s.scores = from_set(v, "scores", NativeValue::into_int)?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("answers", DeclaredType::set_of(DeclaredType::Bool))
                    .getter(|s: &Survey| native_set(&s.answers))
                    .setter(|s, v| {
                        s.answers = from_set(v, "answers", NativeValue::into_bool)?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("milestones", DeclaredType::set_of(DeclaredType::Date))
                    .getter(|s: &Survey| native_set(&s.milestones))
                    .setter(|s, v| {
                        s.milestones = from_set(v, "milestones", NativeValue::into_date)?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("ratings", DeclaredType::set_of(DeclaredType::Decimal))
                    .getter(|s: &Survey| native_set(&s.ratings))
                    .setter(|s, v| {
                        s.ratings = from_set(v, "ratings", NativeValue::into_decimal)?;
                        Ok(())
                    }),
            )
            .property(
                PropertyDescriptor::new("weights", DeclaredType::set_of(DeclaredType::Float))
                    .getter(|s: &Survey| native_set(&s.weights))
                    .setter(|s, v| {
                        s.weights = from_set(v, "weights", NativeValue::into_float)?;
                        Ok(())
                    }),
            )
    }
}

fn survey() -> Survey {
    Survey {
        id: "s-1".to_string(),
        scores: vec![3, 1, 2],
        answers: vec![true, false],
        milestones: vec![Utc.timestamp_millis_opt(1_700_000_000_000).single().unwrap()],
        ratings: Vec::new(),
        weights: Vec::new(),
    }
}

// ============================================================================
// Distinctness
// ============================================================================

#[test]
fn test_duplicate_string_elements_are_rejected() {
    let mut order = sample_order();
    order.tags = vec!["priority".into(), "fragile".into(), "priority".into()];

    let err = mapper(ConversionSchema::V2).to_item(&order).unwrap_err();
    match err {
        MapperError::DuplicateSetElement { property, element } => {
            assert_eq!(property, "tags");
            assert!(element.contains("priority"), "{}", element);
        }
        other => panic!("expected DuplicateSetElement, got {:?}", other),
    }
}

#[test]
fn test_duplicate_number_elements_are_rejected() {
    let mut record = survey();
    record.scores = vec![1, 2, 1];

    let err = mapper(ConversionSchema::V2).to_item(&record).unwrap_err();
    assert!(
        matches!(err, MapperError::DuplicateSetElement { ref property, .. } if property == "scores"),
        "{:?}",
        err
    );
}

#[test]
fn test_numerically_equal_decimals_are_duplicates() {
    let mapper = mapper(ConversionSchema::V2);
    let mut record = survey();
    record.ratings = vec![
        Number::parse("4.5").unwrap(),
        Number::parse("1").unwrap(),
        Number::parse("1.00").unwrap(),
    ];

    let err = mapper.to_item(&record).unwrap_err();
    assert_eq!(
        err,
        MapperError::DuplicateSetElement {
            property: "ratings".into(),
            element: "1.00".into(),
        }
    );

    record.ratings = vec![Number::parse("1").unwrap(), Number::parse("1.01").unwrap()];
    let back: Survey = mapper.from_item(&mapper.to_item(&record).unwrap()).unwrap();
    assert_eq!(back, record);
}

#[test]
fn test_signed_zeros_are_duplicates() {
    let mut record = survey();
    record.weights = vec![0.0, -0.0];

    let err = mapper(ConversionSchema::V2).to_item(&record).unwrap_err();
    assert!(
        matches!(err, MapperError::DuplicateSetElement { ref property, .. } if property == "weights"),
        "{:?}",
        err
    );
}

// ============================================================================
// Empty sets
// ============================================================================

#[test]
fn test_empty_set_is_omitted_and_reads_back_empty() {
    let mapper = mapper(ConversionSchema::V2);
    let mut order = sample_order();
    order.tags.clear();

    let item = mapper.to_item(&order).unwrap();
    assert!(!item.contains_key("tags"));

    let back: Order = mapper.from_item(&item).unwrap();
    assert!(back.tags.is_empty());
}

#[test]
fn test_explicit_null_reads_back_as_empty_set() {
    let mapper = mapper(ConversionSchema::V2);
    let mut item = mapper.to_item(&survey()).unwrap();
    item.insert("scores".into(), AttributeValue::Null);

    let back: Survey = mapper.from_item(&item).unwrap();
    assert!(back.scores.is_empty());
}

// ============================================================================
// Element encodings
// ============================================================================

#[test]
fn test_set_element_encodings_ignore_schema() {
    for schema in ConversionSchema::ALL {
        let mapper = mapper(schema);
        let item = mapper.to_item(&survey()).unwrap();

        assert_eq!(
            item["scores"],
            AttributeValue::NumberSet(vec![
                Number::from(3i64),
                Number::from(1i64),
                Number::from(2i64)
            ]),
            "schema {}",
            schema
        );
        assert_eq!(
            item["answers"],
            AttributeValue::NumberSet(vec![Number::from(1i64), Number::from(0i64)]),
            "schema {}",
            schema
        );
        assert_eq!(
            item["milestones"],
            AttributeValue::StringSet(vec!["2023-11-14T22:13:20.000Z".into()]),
            "schema {}",
            schema
        );

        let back: Survey = mapper.from_item(&item).unwrap();
        assert_eq!(back, survey(), "schema {}", schema);
    }
}

#[test]
fn test_set_attribute_with_wrong_set_type_is_rejected() {
    let mapper = mapper(ConversionSchema::V2);
    let mut item = mapper.to_item(&survey()).unwrap();
    item.insert("scores".into(), AttributeValue::StringSet(vec!["1".into()]));

    let err = mapper.from_item::<Survey>(&item).unwrap_err();
    assert_eq!(err, MapperError::type_mismatch("scores", "NS", "SS"));
}
