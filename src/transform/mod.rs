//! Cleaning and enrichment operations over [`crate::types::DataSet`].
//!
//! The [`Transformer`] is a per-run service: create one at the start of a
//! pipeline run, call operations on it, and read back the operation log when
//! the run is done. Every operation consumes a dataset by reference and
//! returns a new dataset, appending exactly one [`OpLogEntry`].
//!
//! Operations:
//!
//! - [`Transformer::clean`]: duplicate removal + missing-value policy
//! - [`Transformer::standardize_column_names`]: idempotent name normalization
//! - [`Transformer::convert_types`]: best-effort per-column type coercion
//! - [`Transformer::add_date_dimensions`]: calendar columns from a date column
//! - [`Transformer::calculate_metrics`]: derived sales metrics
//! - [`Transformer::apply_business_rules`]: ordered filter/transform rules
//!
//! ## Example: clean → metrics
//!
//! ```rust
//! use warehouse_etl::transform::{MissingPolicy, Transformer};
//! use warehouse_etl::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("quantity", DataType::Int64),
//!     Field::new("unit_price", DataType::Float64),
//! ]);
//! let raw = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Int64(2), Value::Float64(10.0)],
//!         vec![Value::Int64(2), Value::Float64(10.0)],
//!         vec![Value::Null, Value::Float64(4.5)],
//!     ],
//! );
//!
//! let mut transformer = Transformer::new();
//! let ds = transformer.clean(&raw, true, MissingPolicy::Drop);
//! let ds = transformer.calculate_metrics(&ds);
//!
//! assert_eq!(ds.row_count(), 1);
//! assert_eq!(ds.rows[0][2], Value::Float64(20.0));
//! assert_eq!(transformer.log().len(), 2);
//! ```

pub mod clean;
pub mod convert;
pub mod dates;
pub mod metrics;
pub mod rules;

pub use clean::MissingPolicy;
pub use rules::BusinessRule;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::DataSet;

/// One entry in the transformation operation log.
///
/// Append-only; one entry per operation call, never removed.
#[derive(Debug, Clone, Serialize)]
pub struct OpLogEntry {
    /// Operation name (e.g. `"clean"`).
    pub operation: String,
    /// Operation-specific parameters and outcomes.
    pub parameters: serde_json::Value,
    /// Row count of the input dataset.
    pub rows_before: usize,
    /// Row count of the returned dataset.
    pub rows_after: usize,
    /// When the operation ran.
    pub timestamp: DateTime<Utc>,
}

/// Stateful transformation engine with a per-run operation log.
#[derive(Debug, Default)]
pub struct Transformer {
    log: Vec<OpLogEntry>,
}

impl Transformer {
    /// Create a transformer with an empty operation log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated log entries, in call order.
    pub fn log(&self) -> &[OpLogEntry] {
        &self.log
    }

    /// Consume the transformer and take ownership of its log, e.g. to
    /// persist it alongside a pipeline run.
    pub fn into_log(self) -> Vec<OpLogEntry> {
        self.log
    }

    /// Lower-case every column name and replace spaces and hyphens with
    /// underscores. Values are untouched; re-running yields the same names.
    pub fn standardize_column_names(&mut self, dataset: &DataSet) -> DataSet {
        let mut schema = dataset.schema.clone();
        for field in &mut schema.fields {
            field.name = standardize_name(&field.name);
        }
        tracing::info!(columns = ?schema.field_names().collect::<Vec<_>>(), "standardized column names");

        let rows = dataset.row_count();
        self.record(
            "standardize_column_names",
            serde_json::json!({ "columns": schema.field_names().collect::<Vec<_>>() }),
            rows,
            rows,
        );
        DataSet::new(schema, dataset.rows.clone())
    }

    fn record(
        &mut self,
        operation: &str,
        parameters: serde_json::Value,
        rows_before: usize,
        rows_after: usize,
    ) {
        self.log.push(OpLogEntry {
            operation: operation.to_string(),
            parameters,
            rows_before,
            rows_after,
            timestamp: Utc::now(),
        });
    }
}

fn standardize_name(name: &str) -> String {
    name.to_lowercase().replace([' ', '-'], "_")
}

/// Standard transformation pass for raw sales extracts: standardize column
/// names, then drop duplicates and rows with missing values.
///
/// Returns the transformed dataset together with the run's operation log.
pub fn transform_sales_records(dataset: &DataSet) -> (DataSet, Vec<OpLogEntry>) {
    let mut transformer = Transformer::new();
    let ds = transformer.standardize_column_names(dataset);
    let ds = transformer.clean(&ds, true, MissingPolicy::Drop);
    (ds, transformer.into_log())
}
