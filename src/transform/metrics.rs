//! Derived sales metrics.

use super::Transformer;
use crate::types::{DataSet, DataType, Field, Value};

impl Transformer {
    /// Derive standard sales metrics, each gated on its source columns:
    ///
    /// - `subtotal = quantity * unit_price`
    /// - `net_amount = subtotal - discount_amount`
    /// - `profit = (unit_price - cost) * quantity`
    ///
    /// Gates are independent, so a partial schema produces the subset of
    /// derived columns it can support. A derived column that already exists
    /// is overwritten. Rows with a null operand derive null.
    pub fn calculate_metrics(&mut self, dataset: &DataSet) -> DataSet {
        let rows = dataset.row_count();
        let mut ds = dataset.clone();
        let mut derived: Vec<&str> = Vec::new();

        if let (Some(q), Some(p)) = (ds.schema.index_of("quantity"), ds.schema.index_of("unit_price")) {
            let dtype = result_type(&ds, &[q, p]);
            let values = ds
                .rows
                .iter()
                .map(|row| mul(&row[q], &row[p], &dtype))
                .collect();
            ds = set_column(&ds, "subtotal", dtype, values);
            derived.push("subtotal");
        }

        if let (Some(s), Some(d)) = (ds.schema.index_of("subtotal"), ds.schema.index_of("discount_amount")) {
            let dtype = result_type(&ds, &[s, d]);
            let values = ds
                .rows
                .iter()
                .map(|row| sub(&row[s], &row[d], &dtype))
                .collect();
            ds = set_column(&ds, "net_amount", dtype, values);
            derived.push("net_amount");
        }

        if let (Some(q), Some(p), Some(c)) = (
            ds.schema.index_of("quantity"),
            ds.schema.index_of("unit_price"),
            ds.schema.index_of("cost"),
        ) {
            let dtype = result_type(&ds, &[q, p, c]);
            let values = ds
                .rows
                .iter()
                .map(|row| mul(&sub(&row[p], &row[c], &dtype), &row[q], &dtype))
                .collect();
            ds = set_column(&ds, "profit", dtype, values);
            derived.push("profit");
        }

        tracing::info!(?derived, "calculated derived metrics");
        self.record(
            "calculate_metrics",
            serde_json::json!({ "derived": derived }),
            rows,
            rows,
        );
        ds
    }
}

/// Integer arithmetic only when every operand column is integer-typed.
fn result_type(dataset: &DataSet, idxs: &[usize]) -> DataType {
    let all_int = idxs
        .iter()
        .all(|&i| dataset.schema.fields[i].data_type == DataType::Int64);
    if all_int { DataType::Int64 } else { DataType::Float64 }
}

fn mul(a: &Value, b: &Value, dtype: &DataType) -> Value {
    binary_op(a, b, dtype, |x, y| x * y, |x, y| x * y)
}

fn sub(a: &Value, b: &Value, dtype: &DataType) -> Value {
    binary_op(a, b, dtype, |x, y| x - y, |x, y| x - y)
}

fn binary_op(
    a: &Value,
    b: &Value,
    dtype: &DataType,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Value {
    if a.is_null() || b.is_null() {
        return Value::Null;
    }
    match dtype {
        DataType::Int64 => match (a, b) {
            (Value::Int64(x), Value::Int64(y)) => Value::Int64(int_op(*x, *y)),
            _ => Value::Null,
        },
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Value::Float64(float_op(x, y)),
            _ => Value::Null,
        },
    }
}

/// Overwrite `name` if it exists, otherwise append it.
fn set_column(dataset: &DataSet, name: &str, data_type: DataType, values: Vec<Value>) -> DataSet {
    match dataset.schema.index_of(name) {
        Some(idx) => {
            let mut schema = dataset.schema.clone();
            schema.fields[idx].data_type = data_type;
            let rows = dataset
                .rows
                .iter()
                .zip(values)
                .map(|(row, v)| {
                    let mut out = row.clone();
                    out[idx] = v;
                    out
                })
                .collect();
            DataSet::new(schema, rows)
        }
        None => dataset.with_column(Field::new(name, data_type), values),
    }
}
