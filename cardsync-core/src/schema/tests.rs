//! Unit tests for record validation.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::RawRecord;

fn object(value: Value) -> RawRecord {
    value.as_object().cloned().expect("fixture must be a JSON object")
}

#[fixture]
fn set_payload() -> RawRecord {
    object(json!({
        "object": "set",
        "id": "1a2b3c",
        "code": "tdm",
        "name": "Tarkir: Dragonstorm",
        "set_type": "expansion",
        "released_at": "2025-04-11",
        "card_count": 286,
        "digital": false,
        "nonfoil_only": true,
        "icon_svg_uri": "https://svgs.scryfall.io/sets/tdm.svg",
        "search_uri": "https://api.scryfall.com/cards/search?q=e%3Atdm"
    }))
}

#[fixture]
fn card_payload() -> RawRecord {
    object(json!({
        "object": "card",
        "id": "0000579f-7b35-4ed3-b44c-db2a538066fe",
        "name": "Fury Sliver",
        "mana_cost": "{5}{R}",
        "cmc": 6.0,
        "type_line": "Creature Sliver",
        "oracle_text": "All Sliver creatures have double strike.",
        "power": "3",
        "toughness": "3",
        "colors": ["R"],
        "color_identity": ["R"],
        "rarity": "uncommon",
        "set": "tsp",
        "set_name": "Time Spiral",
        "collector_number": "157",
        "artist": "Paolo Parente",
        "layout": "normal",
        "prices": {"usd": "0.29"}
    }))
}

#[rstest]
fn set_keeps_only_declared_fields(set_payload: RawRecord) {
    let record = validate(&SET_SCHEMA, &set_payload).expect("set should validate");
    assert_eq!(record.values().len(), SET_SCHEMA.fields.len());
    assert_eq!(record.key(), Some("tdm"));
    assert_eq!(record.get("search_uri"), None);
    assert_eq!(record.get("card_count"), Some(&FieldValue::Integer(286)));
    assert_eq!(record.get("nonfoil_only"), Some(&FieldValue::Boolean(true)));
}

#[rstest]
fn set_defaults_absent_flags(mut set_payload: RawRecord) {
    set_payload.remove("nonfoil_only");
    set_payload.insert("foil_only".into(), Value::Null);
    let record = validate(&SET_SCHEMA, &set_payload).expect("set should validate");
    assert_eq!(record.get("foil_only"), Some(&FieldValue::Boolean(false)));
    assert_eq!(record.get("nonfoil_only"), Some(&FieldValue::Boolean(false)));
}

#[rstest]
#[case("name")]
#[case("card_count")]
#[case("icon_svg_uri")]
fn set_missing_required_field_is_reported(mut set_payload: RawRecord, #[case] field: &str) {
    set_payload.remove(field);
    let err = validate(&SET_SCHEMA, &set_payload).expect_err("should be rejected");
    assert_eq!(
        err,
        SchemaViolation::Missing {
            table: "sets",
            record: "tdm".into(),
            field: SET_SCHEMA.field(field).expect("declared").name,
        }
    );
}

#[rstest]
fn null_required_field_counts_as_missing(mut set_payload: RawRecord) {
    set_payload.insert("set_type".into(), Value::Null);
    let err = validate(&SET_SCHEMA, &set_payload).expect_err("should be rejected");
    assert!(matches!(err, SchemaViolation::Missing { field: "set_type", .. }));
}

#[rstest]
#[case("card_count", json!("286"), "text")]
#[case("card_count", json!(2.5), "real")]
#[case("digital", json!(0), "integer")]
#[case("code", json!(["tdm"]), "array")]
fn set_wrong_type_is_reported(
    mut set_payload: RawRecord,
    #[case] field: &str,
    #[case] value: Value,
    #[case] found: &str,
) {
    set_payload.insert(field.into(), value);
    let err = validate(&SET_SCHEMA, &set_payload).expect_err("should be rejected");
    match err {
        SchemaViolation::TypeMismatch {
            field: reported,
            found: actual,
            ..
        } => {
            assert_eq!(reported, field);
            assert_eq!(actual, found);
        }
        other => panic!("unexpected violation: {other:?}"),
    }
}

#[rstest]
fn unkeyed_record_is_labelled(mut set_payload: RawRecord) {
    set_payload.remove("code");
    let err = validate(&SET_SCHEMA, &set_payload).expect_err("should be rejected");
    assert!(err.to_string().contains("<unkeyed>"));
    assert_eq!(err.field(), "code");
}

#[rstest]
fn card_lists_are_stored_as_json_text(card_payload: RawRecord) {
    let record = validate(&CARD_SCHEMA, &card_payload).expect("card should validate");
    assert_eq!(record.get("colors"), Some(&FieldValue::Json(r#"["R"]"#.into())));
    assert_eq!(record.get("cmc"), Some(&FieldValue::Real(6.0)));
    assert_eq!(record.get("all_parts"), Some(&FieldValue::Null));
    assert_eq!(record.get("prices"), None);
}

#[rstest]
fn card_integer_cmc_is_accepted_as_real(mut card_payload: RawRecord) {
    card_payload.insert("cmc".into(), json!(6));
    let record = validate(&CARD_SCHEMA, &card_payload).expect("card should validate");
    assert_eq!(record.get("cmc"), Some(&FieldValue::Real(6.0)));
}

#[rstest]
fn multi_faced_card_without_top_level_text_validates(mut card_payload: RawRecord) {
    for field in ["mana_cost", "oracle_text", "power", "toughness", "colors"] {
        card_payload.remove(field);
    }
    card_payload.insert("layout".into(), json!("transform"));
    let record = validate(&CARD_SCHEMA, &card_payload).expect("card should validate");
    assert_eq!(record.get("oracle_text"), Some(&FieldValue::Null));
}

#[rstest]
fn colour_identity_must_hold_strings(mut card_payload: RawRecord) {
    card_payload.insert("color_identity".into(), json!(["R", 1]));
    let err = validate(&CARD_SCHEMA, &card_payload).expect_err("should be rejected");
    assert!(matches!(
        err,
        SchemaViolation::TypeMismatch {
            field: "color_identity",
            expected: FieldKind::TextList,
            ..
        }
    ));
}

#[rstest]
fn validate_all_stops_at_first_violation(set_payload: RawRecord) {
    let mut broken = set_payload.clone();
    broken.insert("code".into(), json!("bad"));
    broken.remove("digital");
    let records = [set_payload.clone(), broken, set_payload];
    let err = validate_all(&SET_SCHEMA, &records).expect_err("run should fail");
    assert!(matches!(err, SchemaViolation::Missing { ref record, .. } if record == "bad"));
}

#[rstest]
fn validate_all_preserves_order(set_payload: RawRecord) {
    let mut second = set_payload.clone();
    second.insert("code".into(), json!("fdn"));
    let records = validate_all(&SET_SCHEMA, [&set_payload, &second]).expect("run should pass");
    let keys: Vec<_> = records.iter().filter_map(ValidatedRecord::key).collect();
    assert_eq!(keys, ["tdm", "fdn"]);
}

#[rstest]
#[case(&SET_SCHEMA)]
#[case(&CARD_SCHEMA)]
fn primary_key_is_a_required_text_field(#[case] schema: &'static RecordSchema) {
    let key = schema.field(schema.primary_key).expect("key is declared");
    assert_eq!(key.kind, FieldKind::Text);
    assert_eq!(key.requirement, Requirement::Required);
}

#[rstest]
#[case(&SET_SCHEMA)]
#[case(&CARD_SCHEMA)]
fn field_names_are_unique(#[case] schema: &'static RecordSchema) {
    let mut names: Vec<_> = schema.field_names().collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), schema.fields.len());
}
