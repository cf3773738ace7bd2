use warehouse_etl::extract::json::read_json_from_str;
use warehouse_etl::types::{DataType, Field, Schema, Value};

use chrono::NaiveDate;

fn order_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("amount", DataType::Float64),
        Field::new("placed_on", DataType::Date),
    ])
}

#[test]
fn read_json_array_of_objects() {
    let schema = order_schema();
    let input = r#"[
        {"id": 1, "amount": 9.5, "placed_on": "2024-03-15"},
        {"id": 2, "amount": 1.25, "placed_on": "2024-03-16"}
    ]"#;

    let ds = read_json_from_str(input, &schema).unwrap();
    assert_eq!(ds.row_count(), 2);
    assert_eq!(
        ds.rows[0],
        vec![
            Value::Int64(1),
            Value::Float64(9.5),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()),
        ]
    );
}

#[test]
fn read_ndjson_lines() {
    let schema = Schema::new(vec![Field::new("id", DataType::Int64)]);
    let input = "{\"id\": 1}\n{\"id\": 2}\n\n{\"id\": 3}\n";

    let ds = read_json_from_str(input, &schema).unwrap();
    assert_eq!(ds.row_count(), 3);
    assert_eq!(ds.rows[2][0], Value::Int64(3));
}

#[test]
fn nested_fields_via_dot_paths() {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("customer.name", DataType::Utf8),
    ]);
    let input = r#"[{"id": 1, "customer": {"name": "Ada"}}]"#;

    let ds = read_json_from_str(input, &schema).unwrap();
    assert_eq!(ds.rows[0][1], Value::Utf8("Ada".to_string()));
}

#[test]
fn json_null_becomes_null_value() {
    let schema = order_schema();
    let input = r#"[{"id": 1, "amount": null, "placed_on": "2024-03-15"}]"#;

    let ds = read_json_from_str(input, &schema).unwrap();
    assert_eq!(ds.rows[0][1], Value::Null);
}

#[test]
fn missing_required_field_is_an_error() {
    let schema = order_schema();
    let input = r#"[{"id": 1, "amount": 2.0}]"#;

    let err = read_json_from_str(input, &schema).unwrap_err();
    assert!(err.to_string().contains("missing required field 'placed_on'"));
}

#[test]
fn bad_date_string_is_a_parse_error() {
    let schema = order_schema();
    let input = r#"[{"id": 1, "amount": 2.0, "placed_on": "springtime"}]"#;

    let err = read_json_from_str(input, &schema).unwrap_err();
    assert!(err.to_string().contains("failed to parse value"));
}
