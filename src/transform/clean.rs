//! Duplicate removal and missing-value handling.

use std::collections::HashSet;

use super::Transformer;
use crate::types::{row_key, DataSet, DataType, Value, ValueKey};

/// How [`Transformer::clean`] resolves missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Remove any row containing a missing value in any column.
    Drop,
    /// Replace missing values with the column type's zero-equivalent
    /// (`0`, `0.0`, `false`, `""`; date nulls are left as-is).
    FillZero,
    /// Replace missing numeric values with the per-column mean computed over
    /// non-missing values. Non-numeric columns are untouched. Integer
    /// columns round the mean to the nearest integer to preserve the type.
    FillMean,
}

impl MissingPolicy {
    /// Stable name used in operation logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::FillZero => "fill_zero",
            Self::FillMean => "fill_mean",
        }
    }
}

impl Transformer {
    /// Remove exact-duplicate rows (keeping the first occurrence) when
    /// `drop_duplicates` is set, then resolve missing values per `missing`.
    ///
    /// Duplicates are removed before missing-value handling, so `FillMean`
    /// computes column means over the deduplicated rows.
    pub fn clean(
        &mut self,
        dataset: &DataSet,
        drop_duplicates: bool,
        missing: MissingPolicy,
    ) -> DataSet {
        let rows_before = dataset.row_count();

        let mut ds = dataset.clone();
        if drop_duplicates {
            ds = dedupe(&ds);
            tracing::info!(removed = rows_before - ds.row_count(), "removed duplicate rows");
        }

        ds = match missing {
            MissingPolicy::Drop => ds.filter_rows(|row| !row.iter().any(Value::is_null)),
            MissingPolicy::FillZero => fill_zero(&ds),
            MissingPolicy::FillMean => fill_mean(&ds),
        };
        tracing::info!(rows = ds.row_count(), policy = missing.name(), "resolved missing values");

        self.record(
            "clean",
            serde_json::json!({
                "drop_duplicates": drop_duplicates,
                "missing_policy": missing.name(),
            }),
            rows_before,
            ds.row_count(),
        );
        ds
    }
}

fn dedupe(dataset: &DataSet) -> DataSet {
    let mut seen: HashSet<Vec<ValueKey>> = HashSet::with_capacity(dataset.row_count());
    dataset.filter_rows(|row| seen.insert(row_key(row)))
}

fn zero_for(data_type: &DataType) -> Value {
    match data_type {
        DataType::Int64 => Value::Int64(0),
        DataType::Float64 => Value::Float64(0.0),
        DataType::Bool => Value::Bool(false),
        DataType::Utf8 => Value::Utf8(String::new()),
        // No deterministic zero date exists; leave the gap.
        DataType::Date => Value::Null,
    }
}

fn fill_zero(dataset: &DataSet) -> DataSet {
    let fills: Vec<Value> = dataset
        .schema
        .fields
        .iter()
        .map(|f| zero_for(&f.data_type))
        .collect();

    dataset.map_rows(|row| {
        row.iter()
            .zip(&fills)
            .map(|(v, fill)| if v.is_null() { fill.clone() } else { v.clone() })
            .collect()
    })
}

fn fill_mean(dataset: &DataSet) -> DataSet {
    let fills: Vec<Option<Value>> = dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            if !field.data_type.is_numeric() {
                return None;
            }
            column_mean(dataset, idx).map(|mean| match field.data_type {
                DataType::Int64 => Value::Int64(mean.round() as i64),
                _ => Value::Float64(mean),
            })
        })
        .collect();

    dataset.map_rows(|row| {
        row.iter()
            .zip(&fills)
            .map(|(v, fill)| match (v, fill) {
                (Value::Null, Some(fill)) => fill.clone(),
                _ => v.clone(),
            })
            .collect()
    })
}

/// Mean over the non-null values of a numeric column; `None` if the column
/// has no non-null values.
fn column_mean(dataset: &DataSet, idx: usize) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in dataset.column_values(idx) {
        if let Some(x) = value.as_f64() {
            sum += x;
            count += 1;
        }
    }
    (count > 0).then(|| sum / count as f64)
}
