//! Date and boolean encodings per conversion schema

use super::*;
use chrono::TimeZone;

fn event() -> Event {
    Event {
        id: "evt-1".to_string(),
        at: Utc.timestamp_millis_opt(1_709_296_245_123).single(),
        urgent: true,
    }
}

#[test]
fn test_v1_writes_iso_text_and_numeric_bools() {
    let item = mapper(ConversionSchema::V1).to_item(&event()).unwrap();
    assert_eq!(
        item["at"],
        AttributeValue::String("2024-03-01T12:30:45.123Z".into())
    );
    assert_eq!(item["urgent"], AttributeValue::Number(Number::from(1i64)));
}

#[test]
fn test_v2_compatible_keeps_v1_scalar_encodings() {
    let item = mapper(ConversionSchema::V2Compatible).to_item(&event()).unwrap();
    assert_eq!(
        item["at"],
        AttributeValue::String("2024-03-01T12:30:45.123Z".into())
    );
    assert_eq!(item["urgent"], AttributeValue::Number(Number::from(1i64)));
}

#[test]
fn test_v2_writes_epoch_millis_and_native_bools() {
    let item = mapper(ConversionSchema::V2).to_item(&event()).unwrap();
    assert_eq!(
        item["at"],
        AttributeValue::Number(Number::from(1_709_296_245_123i64))
    );
    assert_eq!(item["urgent"], AttributeValue::Bool(true));
}

#[test]
fn test_every_schema_reads_back_the_same_instant() {
    for schema in ConversionSchema::ALL {
        let mapper = mapper(schema);
        let item = mapper.to_item(&event()).unwrap();
        let back: Event = mapper.from_item(&item).unwrap();
        assert_eq!(back, event(), "schema {}", schema);
    }
}

#[test]
fn test_v2_reads_items_written_under_v1() {
    let item = mapper(ConversionSchema::V1).to_item(&event()).unwrap();
    let back: Event = mapper(ConversionSchema::V2).from_item(&item).unwrap();
    assert_eq!(back, event());
}

#[test]
fn test_v1_rejects_epoch_millis() {
    let item = mapper(ConversionSchema::V2).to_item(&event()).unwrap();
    let err = mapper(ConversionSchema::V1)
        .from_item::<Event>(&item)
        .unwrap_err();
    assert!(matches!(err, MapperError::TypeMismatch { .. }), "{:?}", err);
}

#[test]
fn test_sub_millisecond_precision_is_dropped() {
    let precise = Utc
        .timestamp_opt(1_709_296_245, 123_456_789)
        .single()
        .unwrap();
    let record = Event {
        id: "evt-2".to_string(),
        at: Some(precise),
        urgent: false,
    };

    for schema in ConversionSchema::ALL {
        let mapper = mapper(schema);
        let back: Event = mapper.from_item(&mapper.to_item(&record).unwrap()).unwrap();
        assert_eq!(back.at.map(|d| d.timestamp_millis()), Some(1_709_296_245_123));
    }
}

#[test]
fn test_malformed_date_text_is_a_parse_error() {
    let mut item = Item::new();
    item.insert("id".into(), AttributeValue::String("evt-3".into()));
    item.insert("at".into(), AttributeValue::String("yesterday".into()));

    let err = mapper(ConversionSchema::V1)
        .from_item::<Event>(&item)
        .unwrap_err();
    match err {
        MapperError::Parse { property, .. } => assert_eq!(property, "at"),
        other => panic!("expected Parse, got {:?}", other),
    }
}

#[test]
fn test_five_digit_years_need_epoch_millis() {
    let record = Event {
        id: "evt-4".to_string(),
        at: Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).single(),
        urgent: false,
    };

    for schema in [ConversionSchema::V1, ConversionSchema::V2Compatible] {
        let err = mapper(schema).to_item(&record).unwrap_err();
        match err {
            MapperError::Parse { property, .. } => assert_eq!(property, "at"),
            other => panic!("expected Parse under {}, got {:?}", schema, other),
        }
    }

    let mapper = mapper(ConversionSchema::V2);
    let back: Event = mapper.from_item(&mapper.to_item(&record).unwrap()).unwrap();
    assert_eq!(back, record);
}
