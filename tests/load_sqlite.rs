//! Load-path behavior against a real (in-memory) SQLite sink: strategy
//! semantics, audit discipline, transactional rollback, post-load checks.

use warehouse_etl::extract::read_query;
use warehouse_etl::load::{LoadOutcome, LoadStrategy, Loader, TableRole};
use warehouse_etl::sink::{SinkConnection, SqliteSink};
use warehouse_etl::types::{DataSet, DataType, Field, Schema, Value};

fn sales_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("region", DataType::Utf8),
        Field::new("amount", DataType::Float64),
    ])
}

fn sales_rows(ids: &[i64]) -> DataSet {
    DataSet::new(
        sales_schema(),
        ids.iter()
            .map(|id| {
                vec![
                    Value::Int64(*id),
                    Value::Utf8("west".to_string()),
                    Value::Float64(*id as f64 * 1.5),
                ]
            })
            .collect(),
    )
}

fn in_memory_loader() -> Loader<SqliteSink> {
    Loader::new(SqliteSink::open_in_memory().unwrap())
}

fn count(loader: &mut Loader<SqliteSink>, table: &str) -> i64 {
    loader
        .connection()
        .fetch_scalar(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .unwrap()
}

#[test]
fn append_creates_table_and_accumulates_rows() {
    let mut loader = in_memory_loader();

    let written = loader.load_fact_table(&sales_rows(&[1, 2, 3]), "fact_sales").unwrap();
    assert_eq!(written, 3);
    let written = loader.load_fact_table(&sales_rows(&[4]), "fact_sales").unwrap();
    assert_eq!(written, 1);

    assert_eq!(count(&mut loader, "fact_sales"), 4);
}

#[test]
fn replace_overwrites_table_contents() {
    let mut loader = in_memory_loader();

    loader.load_dimension_table(&sales_rows(&[1, 2, 3]), "dim_region").unwrap();
    loader.load_dimension_table(&sales_rows(&[9]), "dim_region").unwrap();

    assert_eq!(count(&mut loader, "dim_region"), 1);
    let rows = loader
        .connection()
        .query("SELECT id FROM dim_region", &[])
        .unwrap()
        .rows;
    assert_eq!(rows, vec![vec![Value::Int64(9)]]);
}

#[test]
fn truncate_and_load_empties_then_reloads() {
    let mut loader = in_memory_loader();

    loader.load_fact_table(&sales_rows(&[1, 2, 3]), "staging_sales").unwrap();
    let written = loader.truncate_and_load(&sales_rows(&[7, 8]), "staging_sales").unwrap();

    assert_eq!(written, 2);
    assert_eq!(count(&mut loader, "staging_sales"), 2);
}

#[test]
fn role_based_strategy_selection_loads_per_role() {
    let mut loader = in_memory_loader();
    let ds = sales_rows(&[1, 2]);

    loader.load(&ds, "fact_sales", &TableRole::Fact.strategy()).unwrap();
    loader.load(&ds, "fact_sales", &TableRole::Fact.strategy()).unwrap();
    assert_eq!(count(&mut loader, "fact_sales"), 4);

    loader.load(&ds, "dim_store", &TableRole::Dimension.strategy()).unwrap();
    loader.load(&ds, "dim_store", &TableRole::Dimension.strategy()).unwrap();
    assert_eq!(count(&mut loader, "dim_store"), 2);
}

#[test]
fn every_successful_load_appends_exactly_one_audit_record() {
    let mut loader = in_memory_loader();
    let ds = sales_rows(&[1, 2, 3]);

    loader.load_fact_table(&ds, "fact_sales").unwrap();
    loader.truncate_and_load(&ds, "staging_sales").unwrap();

    let audit = loader.audit_log();
    assert_eq!(audit.len(), 2);

    assert_eq!(audit[0].table, "fact_sales");
    assert_eq!(audit[0].method, "append");
    assert_eq!(audit[0].outcome, LoadOutcome::Records(3));
    assert_eq!(audit[0].outcome.total(), ds.row_count());

    assert_eq!(audit[1].table, "staging_sales");
    assert_eq!(audit[1].method, "truncate_reload");
}

#[test]
fn upsert_audit_counts_match_dataset_size() {
    let mut loader = in_memory_loader();

    loader.load_fact_table(&sales_rows(&[1]), "t").unwrap();
    loader.upsert(&sales_rows(&[1, 2]), "t", &["id".to_string()]).unwrap();

    let audit = loader.audit_log();
    assert_eq!(audit.len(), 2);
    assert_eq!(
        audit[1].outcome,
        LoadOutcome::Upsert {
            inserted: 1,
            updated: 1
        }
    );
    assert_eq!(audit[1].outcome.total(), 2);
}

#[test]
fn failed_load_appends_no_audit_and_keeps_prior_entries() {
    let mut loader = in_memory_loader();
    loader.load_fact_table(&sales_rows(&[1]), "fact_sales").unwrap();

    // A table whose constraint the dataset violates.
    loader
        .connection()
        .execute("CREATE TABLE guarded (id INTEGER CHECK (id < 10), region TEXT, amount REAL)", &[])
        .unwrap();
    let err = loader.load_fact_table(&sales_rows(&[50]), "guarded");
    assert!(err.is_err());

    let audit = loader.audit_log();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].table, "fact_sales");
}

#[test]
fn failed_truncate_reload_rolls_back_the_truncation() {
    let mut loader = in_memory_loader();

    // Pre-existing target with a constraint and three committed rows.
    loader
        .connection()
        .execute("CREATE TABLE guarded (id INTEGER CHECK (id < 10), region TEXT, amount REAL)", &[])
        .unwrap();
    loader.load_fact_table(&sales_rows(&[1, 2, 3]), "guarded").unwrap();
    assert_eq!(count(&mut loader, "guarded"), 3);

    // The reload violates the constraint after truncation has run.
    let err = loader.truncate_and_load(&sales_rows(&[7, 50]), "guarded");
    assert!(err.is_err());

    // Truncation itself was rolled back: row count unchanged.
    assert_eq!(count(&mut loader, "guarded"), 3);
}

#[test]
fn validate_load_passes_when_enough_rows_landed() {
    let mut loader = in_memory_loader();
    let ds = sales_rows(&[1, 2]);
    loader.load_fact_table(&ds, "fact_sales").unwrap();

    let check = loader.validate_load(&ds, "fact_sales").unwrap();
    assert!(check.passed);
    assert_eq!(check.expected_rows, 2);
    assert_eq!(check.actual_rows, 2);
}

#[test]
fn validate_load_reports_failure_without_raising() {
    let mut loader = in_memory_loader();
    let ds = sales_rows(&[1, 2, 3]);
    loader.load_fact_table(&ds, "fact_sales").unwrap();

    loader
        .connection()
        .execute("DELETE FROM fact_sales WHERE id > ?", &[Value::Int64(1)])
        .unwrap();

    let check = loader.validate_load(&ds, "fact_sales").unwrap();
    assert!(!check.passed);
    assert_eq!(check.expected_rows, 3);
    assert_eq!(check.actual_rows, 1);
}

#[test]
fn empty_dataset_loads_zero_records() {
    let mut loader = in_memory_loader();
    let empty = DataSet::empty(sales_schema());

    let written = loader.load_fact_table(&empty, "fact_sales").unwrap();
    assert_eq!(written, 0);
    assert_eq!(count(&mut loader, "fact_sales"), 0);
    assert_eq!(loader.audit_log().len(), 1);
}

#[test]
fn batched_writes_land_every_row() {
    let sink = SqliteSink::open_in_memory().unwrap();
    let mut loader = Loader::with_batch_size(sink, 10);

    let ids: Vec<i64> = (0..57).collect();
    let written = loader.load_fact_table(&sales_rows(&ids), "fact_sales").unwrap();
    assert_eq!(written, 57);
    assert_eq!(count(&mut loader, "fact_sales"), 57);
}

#[test]
fn read_query_materializes_loaded_rows_as_a_dataset() {
    let mut loader = in_memory_loader();
    loader.load_fact_table(&sales_rows(&[1, 2, 3]), "fact_sales").unwrap();

    let ds = read_query(
        loader.connection(),
        "SELECT id, region FROM fact_sales WHERE id >= ? ORDER BY id",
        &[Value::Int64(2)],
    )
    .unwrap();

    assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["id", "region"]);
    assert_eq!(ds.schema.fields[0].data_type, DataType::Int64);
    assert_eq!(ds.schema.fields[1].data_type, DataType::Utf8);
    assert_eq!(
        ds.rows,
        vec![
            vec![Value::Int64(2), Value::Utf8("west".to_string())],
            vec![Value::Int64(3), Value::Utf8("west".to_string())],
        ]
    );
}

#[test]
fn upsert_reconciles_against_preexisting_target() {
    let mut loader = in_memory_loader();
    loader
        .connection()
        .execute("CREATE TABLE dim_customer (key INTEGER, value TEXT)", &[])
        .unwrap();
    loader
        .connection()
        .execute(
            "INSERT INTO dim_customer (key, value) VALUES (?, ?)",
            &[Value::Int64(1), Value::Utf8("A".into())],
        )
        .unwrap();

    let schema = Schema::new(vec![
        Field::new("key", DataType::Int64),
        Field::new("value", DataType::Utf8),
    ]);
    let source = DataSet::new(
        schema,
        vec![
            vec![Value::Int64(1), Value::Utf8("B".into())],
            vec![Value::Int64(2), Value::Utf8("C".into())],
        ],
    );

    let outcome = loader
        .load(
            &source,
            "dim_customer",
            &LoadStrategy::Upsert {
                key_columns: vec!["key".to_string()],
            },
        )
        .unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Upsert {
            inserted: 1,
            updated: 1
        }
    );

    let rows = loader
        .connection()
        .query("SELECT key, value FROM dim_customer ORDER BY key", &[])
        .unwrap()
        .rows;
    assert_eq!(
        rows,
        vec![
            vec![Value::Int64(1), Value::Utf8("B".into())],
            vec![Value::Int64(2), Value::Utf8("C".into())],
        ]
    );
}
