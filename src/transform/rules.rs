//! Ordered business rules: row filters and per-column transforms.

use std::fmt;

use super::Transformer;
use crate::types::{DataSet, RowView, Value};

/// A single business rule. Rules are applied strictly in list order; later
/// rules see the output of earlier ones.
pub enum BusinessRule {
    /// Keep only rows for which `predicate` returns `true`.
    Filter {
        /// Label used in logs.
        name: String,
        /// Boolean predicate over the row's columns.
        predicate: Box<dyn Fn(RowView<'_>) -> bool>,
    },
    /// Replace a column's values via a pure per-row function.
    ///
    /// A missing column is a logged no-op.
    TransformColumn {
        /// Column to rewrite.
        column: String,
        /// Per-value function.
        apply: Box<dyn Fn(&Value) -> Value>,
    },
}

impl BusinessRule {
    /// Keep rows matching `predicate`.
    pub fn filter(name: impl Into<String>, predicate: impl Fn(RowView<'_>) -> bool + 'static) -> Self {
        Self::Filter {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Rewrite `column` with `apply`.
    pub fn transform_column(
        column: impl Into<String>,
        apply: impl Fn(&Value) -> Value + 'static,
    ) -> Self {
        Self::TransformColumn {
            column: column.into(),
            apply: Box::new(apply),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Filter { name, .. } => format!("filter:{name}"),
            Self::TransformColumn { column, .. } => format!("transform:{column}"),
        }
    }
}

impl fmt::Debug for BusinessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Transformer {
    /// Fold the rule list left-to-right over the dataset.
    pub fn apply_business_rules(&mut self, dataset: &DataSet, rules: &[BusinessRule]) -> DataSet {
        let rows_before = dataset.row_count();
        let mut ds = dataset.clone();

        for rule in rules {
            ds = match rule {
                BusinessRule::Filter { name, predicate } => {
                    let schema = ds.schema.clone();
                    let out = ds.filter_rows(|row| predicate(RowView::new(&schema, row)));
                    tracing::info!(rule = %name, rows = out.row_count(), "applied filter rule");
                    out
                }
                BusinessRule::TransformColumn { column, apply } => {
                    match ds.schema.index_of(column) {
                        Some(idx) => {
                            tracing::info!(column = %column, "applied column transform rule");
                            ds.map_rows(|row| {
                                let mut out = row.to_vec();
                                out[idx] = apply(&row[idx]);
                                out
                            })
                        }
                        None => {
                            tracing::warn!(column = %column, "transform rule skipped: column not in dataset");
                            ds
                        }
                    }
                }
            };
        }

        self.record(
            "apply_business_rules",
            serde_json::json!({ "rules": rules.iter().map(BusinessRule::label).collect::<Vec<_>>() }),
            rows_before,
            ds.row_count(),
        );
        ds
    }
}
