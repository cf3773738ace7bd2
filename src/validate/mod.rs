//! Range validation and dataset inspection.
//!
//! Two stateless entry points:
//!
//! - [`validate_ranges`]: drops rows outside per-column inclusive bounds and
//!   reports how many were removed
//! - [`summarize`]: pure shape/null/type inspection of a dataset, used for
//!   pre-load sanity checks and extraction-time acceptance

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DataSet, Value};

/// Inclusive numeric bounds for one column. A rule with both bounds unset is
/// a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeRule {
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Inclusive upper bound.
    pub max: Option<f64>,
}

impl RangeRule {
    /// Rule with both bounds.
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Rule with only a lower bound.
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Rule with only an upper bound.
    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    fn is_noop(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Outcome of a [`validate_ranges`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeReport {
    /// Row count before filtering.
    pub rows_before: usize,
    /// Row count after filtering.
    pub rows_after: usize,
    /// Rows removed for violating at least one bound.
    pub rows_removed: usize,
}

/// Filter out rows that violate any bound of any rule whose column exists.
///
/// Bounds are applied independently and a row must satisfy both to survive.
/// A null (or non-numeric) value fails any bounded rule. Columns absent from
/// the dataset are silently skipped.
pub fn validate_ranges(
    dataset: &DataSet,
    rules: &BTreeMap<String, RangeRule>,
) -> (DataSet, RangeReport) {
    let rows_before = dataset.row_count();

    let checks: Vec<(usize, RangeRule)> = rules
        .iter()
        .filter_map(|(column, rule)| match dataset.schema.index_of(column) {
            Some(_) if rule.is_noop() => None,
            Some(idx) => Some((idx, *rule)),
            None => {
                tracing::debug!(column = %column, "range rule skipped: column not in dataset");
                None
            }
        })
        .collect();

    let out = dataset.filter_rows(|row| checks.iter().all(|(idx, rule)| passes(&row[*idx], rule)));

    let rows_removed = rows_before - out.row_count();
    if rows_removed > 0 {
        tracing::warn!(rows_removed, "rows removed by range validation");
    }

    (
        out,
        RangeReport {
            rows_before,
            rows_after: rows_before - rows_removed,
            rows_removed,
        },
    )
}

fn passes(value: &Value, rule: &RangeRule) -> bool {
    let Some(x) = value.as_f64() else {
        return false;
    };
    rule.min.is_none_or(|m| x >= m) && rule.max.is_none_or(|m| x <= m)
}

/// Shape, null, and type statistics for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    /// Number of rows.
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// Column names in schema order.
    pub column_names: Vec<String>,
    /// Null count per column.
    pub null_counts: BTreeMap<String, usize>,
    /// Logical type name per column.
    pub types: BTreeMap<String, String>,
    /// Rough in-memory footprint (value storage plus string heap).
    pub approx_memory_bytes: usize,
}

/// Pure, side-effect-free inspection of a dataset.
pub fn summarize(dataset: &DataSet) -> DatasetSummary {
    let mut null_counts = BTreeMap::new();
    let mut types = BTreeMap::new();
    for (idx, field) in dataset.schema.fields.iter().enumerate() {
        let nulls = dataset.column_values(idx).filter(|v| v.is_null()).count();
        null_counts.insert(field.name.clone(), nulls);
        types.insert(field.name.clone(), field.data_type.name().to_string());
    }

    let mut bytes = 0usize;
    for row in &dataset.rows {
        bytes += std::mem::size_of::<Vec<Value>>();
        for value in row {
            bytes += std::mem::size_of::<Value>();
            if let Value::Utf8(s) = value {
                bytes += s.len();
            }
        }
    }

    DatasetSummary {
        row_count: dataset.row_count(),
        column_count: dataset.column_count(),
        column_names: dataset.schema.field_names().map(str::to_string).collect(),
        null_counts,
        types,
        approx_memory_bytes: bytes,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{summarize, validate_ranges, RangeRule};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn quantities(values: &[Value]) -> DataSet {
        let schema = Schema::new(vec![Field::new("quantity", DataType::Int64)]);
        DataSet::new(schema, values.iter().map(|v| vec![v.clone()]).collect())
    }

    #[test]
    fn rows_outside_bounds_are_removed() {
        let ds = quantities(&[Value::Int64(0), Value::Int64(5), Value::Int64(150)]);
        let mut rules = BTreeMap::new();
        rules.insert("quantity".to_string(), RangeRule::between(1.0, 100.0));

        let (out, report) = validate_ranges(&ds, &rules);
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.rows[0][0], Value::Int64(5));
        assert_eq!(report.rows_removed, 2);
        assert_eq!(report.rows_before, 3);
        assert_eq!(report.rows_after, 1);
    }

    #[test]
    fn bounds_apply_independently() {
        let ds = quantities(&[Value::Int64(0), Value::Int64(5)]);

        let mut min_only = BTreeMap::new();
        min_only.insert("quantity".to_string(), RangeRule::at_least(1.0));
        let (out, _) = validate_ranges(&ds, &min_only);
        assert_eq!(out.row_count(), 1);

        let mut max_only = BTreeMap::new();
        max_only.insert("quantity".to_string(), RangeRule::at_most(3.0));
        let (out, _) = validate_ranges(&ds, &max_only);
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.rows[0][0], Value::Int64(0));
    }

    #[test]
    fn missing_column_and_unbounded_rules_are_no_ops() {
        let ds = quantities(&[Value::Int64(5)]);
        let mut rules = BTreeMap::new();
        rules.insert("absent".to_string(), RangeRule::between(0.0, 1.0));
        rules.insert("quantity".to_string(), RangeRule::default());

        let (out, report) = validate_ranges(&ds, &rules);
        assert_eq!(out.row_count(), 1);
        assert_eq!(report.rows_removed, 0);
    }

    #[test]
    fn null_values_fail_bounded_rules() {
        let ds = quantities(&[Value::Null, Value::Int64(5)]);
        let mut rules = BTreeMap::new();
        rules.insert("quantity".to_string(), RangeRule::at_least(0.0));

        let (out, report) = validate_ranges(&ds, &rules);
        assert_eq!(out.row_count(), 1);
        assert_eq!(report.rows_removed, 1);
    }

    #[test]
    fn summarize_reports_shape_nulls_and_types() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("name", DataType::Utf8),
        ]);
        let ds = DataSet::new(
            schema,
            vec![
                vec![Value::Int64(1), Value::Utf8("ada".into())],
                vec![Value::Int64(2), Value::Null],
            ],
        );

        let summary = summarize(&ds);
        assert_eq!(summary.row_count, 2);
        assert_eq!(summary.column_count, 2);
        assert_eq!(summary.column_names, vec!["id", "name"]);
        assert_eq!(summary.null_counts["id"], 0);
        assert_eq!(summary.null_counts["name"], 1);
        assert_eq!(summary.types["id"], "int64");
        assert_eq!(summary.types["name"], "utf8");
        assert!(summary.approx_memory_bytes > 0);
    }

    #[test]
    fn summarize_is_pure() {
        let ds = quantities(&[Value::Int64(5)]);
        let before = ds.clone();
        let _ = summarize(&ds);
        assert_eq!(ds, before);
    }
}
