//! Items in the store's JSON wire form

use super::*;
use serde_json::json;
use strata_mapper::WireFormatError;

#[test]
fn test_order_item_renders_tagged_json() {
    let item = mapper(ConversionSchema::V2).to_item(&sample_order()).unwrap();
    let wire = item_to_json(&item);

    assert_eq!(wire["customer"], json!({ "S": "cust-42" }));
    assert_eq!(wire["order_no"], json!({ "N": "1001" }));
    assert_eq!(wire["paid"], json!({ "BOOL": true }));
    assert_eq!(wire["receipt"], json!({ "B": "AAEC/v8=" }));
    assert_eq!(wire["tags"], json!({ "SS": ["priority", "fragile"] }));
    assert_eq!(
        wire["lines"]["L"][1],
        json!({ "M": { "gift": { "BOOL": true }, "qty": { "N": "1" }, "sku": { "S": "B-7" } } })
    );
}

#[test]
fn test_order_survives_json_transport() {
    let mapper = mapper(ConversionSchema::V2);
    let order = sample_order();

    let text = item_to_json(&mapper.to_item(&order).unwrap()).to_string();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    let item = item_from_json(&parsed).unwrap();

    let back: Order = mapper.from_item(&item).unwrap();
    assert_eq!(back, order);
}

#[test]
fn test_hand_written_v1_item_reads_under_v2() {
    let wire = json!({
        "id": { "S": "evt-9" },
        "at": { "S": "2021-06-01T08:00:00.000Z" },
        "urgent": { "N": "0" }
    });
    let item = item_from_json(&wire).unwrap();

    let event: Event = mapper(ConversionSchema::V2).from_item(&item).unwrap();
    assert_eq!(event.id, "evt-9");
    assert!(!event.urgent);
    assert_eq!(
        event.at.map(|d| d.to_rfc3339()),
        Some("2021-06-01T08:00:00+00:00".to_string())
    );
}

#[test]
fn test_malformed_wire_json_is_rejected() {
    let two_tags = json!({ "id": { "S": "a", "N": "1" } });
    assert!(item_from_json(&two_tags).is_err());

    let bad_number = json!({ "n": { "N": "one" } });
    assert!(item_from_json(&bad_number).is_err());

    let err: WireFormatError = item_from_json(&json!({ "x": { "Q": 1 } })).unwrap_err();
    assert!(err.to_string().contains("\"Q\""), "{}", err);
}
