//! Best-effort per-column type coercion.

use std::collections::BTreeMap;

use super::Transformer;
use crate::types::{parse_date, DataSet, DataType, Value};

impl Transformer {
    /// Coerce each mapped column to its target type.
    ///
    /// Failures are per column, not per call: the first value that cannot be
    /// coerced leaves that whole column unconverted (logged and recorded in
    /// the operation-log entry), and the remaining mapped columns are still
    /// attempted. Columns absent from the dataset are skipped the same way.
    pub fn convert_types(
        &mut self,
        dataset: &DataSet,
        mapping: &BTreeMap<String, DataType>,
    ) -> DataSet {
        let mut schema = dataset.schema.clone();
        let mut rows = dataset.rows.clone();

        let mut converted: Vec<String> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();

        for (column, target) in mapping {
            let Some(idx) = schema.index_of(column) else {
                tracing::warn!(column = %column, "convert_types: column not in dataset");
                skipped.push(column.clone());
                continue;
            };

            match convert_column(&rows, idx, target) {
                Ok(values) => {
                    for (row, value) in rows.iter_mut().zip(values) {
                        row[idx] = value;
                    }
                    schema.fields[idx].data_type = target.clone();
                    tracing::info!(column = %column, target = target.name(), "converted column");
                    converted.push(column.clone());
                }
                Err(message) => {
                    tracing::error!(
                        column = %column,
                        target = target.name(),
                        %message,
                        "type conversion failed, column left unconverted"
                    );
                    skipped.push(column.clone());
                }
            }
        }

        let row_count = rows.len();
        self.record(
            "convert_types",
            serde_json::json!({ "converted": converted, "skipped": skipped }),
            row_count,
            row_count,
        );
        DataSet::new(schema, rows)
    }
}

fn convert_column(rows: &[Vec<Value>], idx: usize, target: &DataType) -> Result<Vec<Value>, String> {
    rows.iter()
        .map(|row| coerce_value(&row[idx], target))
        .collect()
}

/// Coerce one value to `target`. Nulls pass through unchanged.
pub(crate) fn coerce_value(value: &Value, target: &DataType) -> Result<Value, String> {
    match (value, target) {
        (Value::Null, _) => Ok(Value::Null),

        (Value::Int64(v), DataType::Int64) => Ok(Value::Int64(*v)),
        (Value::Float64(v), DataType::Int64) => {
            if v.fract() == 0.0 && v.is_finite() {
                Ok(Value::Int64(*v as i64))
            } else {
                Err(format!("expected integer (got non-integer float {v})"))
            }
        }
        (Value::Bool(v), DataType::Int64) => Ok(Value::Int64(i64::from(*v))),
        (Value::Utf8(s), DataType::Int64) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| e.to_string()),

        (Value::Float64(v), DataType::Float64) => Ok(Value::Float64(*v)),
        (Value::Int64(v), DataType::Float64) => Ok(Value::Float64(*v as f64)),
        (Value::Utf8(s), DataType::Float64) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| e.to_string()),

        (Value::Bool(v), DataType::Bool) => Ok(Value::Bool(*v)),
        (Value::Int64(v), DataType::Bool) => Ok(Value::Bool(*v != 0)),
        (Value::Float64(v), DataType::Bool) => Ok(Value::Bool(*v != 0.0)),
        (Value::Utf8(s), DataType::Bool) => parse_bool(s).map(Value::Bool),

        (Value::Utf8(s), DataType::Utf8) => Ok(Value::Utf8(s.clone())),
        (Value::Int64(v), DataType::Utf8) => Ok(Value::Utf8(v.to_string())),
        (Value::Float64(v), DataType::Utf8) => Ok(Value::Utf8(v.to_string())),
        (Value::Bool(v), DataType::Utf8) => Ok(Value::Utf8(v.to_string())),
        (Value::Date(v), DataType::Utf8) => Ok(Value::Utf8(v.format("%Y-%m-%d").to_string())),

        (Value::Date(v), DataType::Date) => Ok(Value::Date(*v)),
        (Value::Utf8(s), DataType::Date) => parse_date(s)
            .map(Value::Date)
            .ok_or_else(|| format!("cannot parse '{s}' as a date")),

        (v, t) => Err(format!("cannot convert {v:?} to {}", t.name())),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}
