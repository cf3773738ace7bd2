//! End-to-end transformation runs: raw extract shape through cleaning,
//! enrichment, validation, and summary.

use std::collections::BTreeMap;

use warehouse_etl::transform::{BusinessRule, MissingPolicy, Transformer};
use warehouse_etl::types::{DataSet, DataType, Field, Schema, Value};
use warehouse_etl::validate::{self, RangeRule};

/// A raw extract the way a flat file delivers it: messy headers, string
/// dates, duplicates, and gaps.
fn raw_sales() -> DataSet {
    let schema = Schema::new(vec![
        Field::new("Order ID", DataType::Int64),
        Field::new("Quantity", DataType::Int64),
        Field::new("Unit-Price", DataType::Float64),
        Field::new("Cost", DataType::Float64),
        Field::new("Order Date", DataType::Utf8),
    ]);
    DataSet::new(
        schema,
        vec![
            vec![
                Value::Int64(1),
                Value::Int64(2),
                Value::Float64(10.0),
                Value::Float64(6.0),
                Value::Utf8("2024-03-15".into()),
            ],
            // Exact duplicate of the first row.
            vec![
                Value::Int64(1),
                Value::Int64(2),
                Value::Float64(10.0),
                Value::Float64(6.0),
                Value::Utf8("2024-03-15".into()),
            ],
            vec![
                Value::Int64(2),
                Value::Int64(150),
                Value::Float64(1.0),
                Value::Float64(0.5),
                Value::Utf8("2024-03-16".into()),
            ],
            vec![
                Value::Int64(3),
                Value::Null,
                Value::Float64(4.0),
                Value::Float64(2.0),
                Value::Utf8("2024-03-17".into()),
            ],
        ],
    )
}

#[test]
fn full_transform_run_produces_enriched_validated_dataset() {
    let raw = raw_sales();
    let mut transformer = Transformer::new();

    let ds = transformer.standardize_column_names(&raw);
    let ds = transformer.clean(&ds, true, MissingPolicy::Drop);
    let ds = transformer.add_date_dimensions(&ds, "order_date");
    let ds = transformer.calculate_metrics(&ds);

    let rules = vec![BusinessRule::filter("positive_quantity", |row| {
        matches!(row.get("quantity"), Some(Value::Int64(q)) if *q > 0)
    })];
    let ds = transformer.apply_business_rules(&ds, &rules);

    // Duplicate and null-bearing rows are gone.
    assert_eq!(ds.row_count(), 2);

    // Enrichment landed.
    let subtotal_idx = ds.schema.index_of("subtotal").unwrap();
    assert_eq!(ds.rows[0][subtotal_idx], Value::Float64(20.0));
    let profit_idx = ds.schema.index_of("profit").unwrap();
    assert_eq!(ds.rows[0][profit_idx], Value::Float64(8.0));
    let weekend_idx = ds.schema.index_of("order_date_is_weekend").unwrap();
    assert_eq!(ds.rows[0][weekend_idx], Value::Bool(false));
    assert_eq!(ds.rows[1][weekend_idx], Value::Bool(true));

    // Range validation drops the quantity=150 outlier.
    let mut ranges = BTreeMap::new();
    ranges.insert("quantity".to_string(), RangeRule::between(1.0, 100.0));
    let (ds, report) = validate::validate_ranges(&ds, &ranges);
    assert_eq!(report.rows_removed, 1);
    assert_eq!(ds.row_count(), 1);

    // One log entry per operation, in call order.
    let log = transformer.into_log();
    let operations: Vec<&str> = log.iter().map(|e| e.operation.as_str()).collect();
    assert_eq!(
        operations,
        vec![
            "standardize_column_names",
            "clean",
            "add_date_dimensions",
            "calculate_metrics",
            "apply_business_rules",
        ]
    );
}

#[test]
fn convert_types_feeds_date_dimensions() {
    let schema = Schema::new(vec![
        Field::new("qty", DataType::Utf8),
        Field::new("sold_on", DataType::Utf8),
    ]);
    let ds = DataSet::new(
        schema,
        vec![vec![Value::Utf8("7".into()), Value::Utf8("2024-12-25".into())]],
    );

    let mut mapping = BTreeMap::new();
    mapping.insert("qty".to_string(), DataType::Int64);
    mapping.insert("sold_on".to_string(), DataType::Date);

    let mut transformer = Transformer::new();
    let ds = transformer.convert_types(&ds, &mapping);
    let ds = transformer.add_date_dimensions(&ds, "sold_on");

    let month_idx = ds.schema.index_of("sold_on_month").unwrap();
    assert_eq!(ds.rows[0][month_idx], Value::Int64(12));
    let qty_idx = ds.schema.index_of("qty").unwrap();
    assert_eq!(ds.rows[0][qty_idx], Value::Int64(7));
}

#[test]
fn stage_boundaries_leave_inputs_untouched() {
    let raw = raw_sales();
    let before = raw.clone();

    let mut transformer = Transformer::new();
    let _ = transformer.standardize_column_names(&raw);
    let _ = transformer.clean(&raw, true, MissingPolicy::FillMean);
    let _ = transformer.calculate_metrics(&raw);

    assert_eq!(raw, before);
}

#[test]
fn summary_reflects_transformed_shape() {
    let raw = raw_sales();
    let mut transformer = Transformer::new();
    let ds = transformer.standardize_column_names(&raw);
    let ds = transformer.clean(&ds, true, MissingPolicy::FillZero);

    let summary = validate::summarize(&ds);
    assert_eq!(summary.row_count, 3);
    assert_eq!(summary.column_count, 5);
    assert_eq!(summary.null_counts["quantity"], 0);
    assert_eq!(summary.types["unit_price"], "float64");
}
