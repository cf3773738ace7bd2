//! Calendar dimension derivation from a date column.

use chrono::{Datelike, NaiveDate};

use super::Transformer;
use crate::types::{parse_date, DataSet, DataType, Field, Value};

impl Transformer {
    /// Derive calendar dimension columns from `date_column`.
    ///
    /// The source column is converted to [`DataType::Date`] (values that do
    /// not parse become null), and nine columns named `{date_column}_{suffix}`
    /// are appended: `year`, `quarter`, `month`, `month_name`, `week`
    /// (ISO week number), `day`, `day_of_week` (0 = Monday), `day_name`,
    /// and `is_weekend` (true for day-of-week 5 and 6). A null date yields
    /// null in every derived column.
    ///
    /// If `date_column` does not exist the dataset is returned unchanged and
    /// the failure is logged.
    pub fn add_date_dimensions(&mut self, dataset: &DataSet, date_column: &str) -> DataSet {
        let rows = dataset.row_count();
        let Some(idx) = dataset.schema.index_of(date_column) else {
            tracing::error!(column = date_column, "add_date_dimensions: column not in dataset");
            self.record(
                "add_date_dimensions",
                serde_json::json!({ "date_column": date_column, "error": "column not found" }),
                rows,
                rows,
            );
            return dataset.clone();
        };

        let dates: Vec<Option<NaiveDate>> = dataset
            .rows
            .iter()
            .map(|row| as_date(&row[idx]))
            .collect();

        let mut schema = dataset.schema.clone();
        schema.fields[idx].data_type = DataType::Date;
        let mut out_rows = dataset.rows.clone();
        for (row, date) in out_rows.iter_mut().zip(&dates) {
            row[idx] = match date {
                Some(d) => Value::Date(*d),
                None => Value::Null,
            };
        }
        let mut ds = DataSet::new(schema, out_rows);

        ds = append_dimension(&ds, date_column, "year", DataType::Int64, &dates, |d| {
            Value::Int64(i64::from(d.year()))
        });
        ds = append_dimension(&ds, date_column, "quarter", DataType::Int64, &dates, |d| {
            Value::Int64(i64::from((d.month() - 1) / 3 + 1))
        });
        ds = append_dimension(&ds, date_column, "month", DataType::Int64, &dates, |d| {
            Value::Int64(i64::from(d.month()))
        });
        ds = append_dimension(&ds, date_column, "month_name", DataType::Utf8, &dates, |d| {
            Value::Utf8(d.format("%B").to_string())
        });
        ds = append_dimension(&ds, date_column, "week", DataType::Int64, &dates, |d| {
            Value::Int64(i64::from(d.iso_week().week()))
        });
        ds = append_dimension(&ds, date_column, "day", DataType::Int64, &dates, |d| {
            Value::Int64(i64::from(d.day()))
        });
        ds = append_dimension(&ds, date_column, "day_of_week", DataType::Int64, &dates, |d| {
            Value::Int64(i64::from(d.weekday().num_days_from_monday()))
        });
        ds = append_dimension(&ds, date_column, "day_name", DataType::Utf8, &dates, |d| {
            Value::Utf8(d.format("%A").to_string())
        });
        ds = append_dimension(&ds, date_column, "is_weekend", DataType::Bool, &dates, |d| {
            Value::Bool(d.weekday().num_days_from_monday() >= 5)
        });

        tracing::info!(column = date_column, "added date dimension columns");
        self.record(
            "add_date_dimensions",
            serde_json::json!({ "date_column": date_column }),
            rows,
            rows,
        );
        ds
    }
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Utf8(s) => parse_date(s),
        _ => None,
    }
}

fn append_dimension<F>(
    dataset: &DataSet,
    date_column: &str,
    suffix: &str,
    data_type: DataType,
    dates: &[Option<NaiveDate>],
    derive: F,
) -> DataSet
where
    F: Fn(NaiveDate) -> Value,
{
    let values = dates
        .iter()
        .map(|d| match d {
            Some(d) => derive(*d),
            None => Value::Null,
        })
        .collect();
    dataset.with_column(
        Field::new(format!("{date_column}_{suffix}"), data_type),
        values,
    )
}

#[cfg(test)]
mod tests {
    use crate::transform::Transformer;
    use crate::types::{DataSet, DataType, Field, Schema, Value};
    use chrono::NaiveDate;

    fn get<'a>(ds: &'a DataSet, row: usize, column: &str) -> &'a Value {
        &ds.rows[row][ds.schema.index_of(column).unwrap()]
    }

    #[test]
    fn derives_calendar_columns_for_a_friday() {
        let schema = Schema::new(vec![Field::new("order_date", DataType::Utf8)]);
        let ds = DataSet::new(schema, vec![vec![Value::Utf8("2024-03-15".into())]]);

        let mut t = Transformer::new();
        let out = t.add_date_dimensions(&ds, "order_date");

        assert_eq!(out.column_count(), 10);
        assert_eq!(
            *get(&out, 0, "order_date"),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        );
        assert_eq!(*get(&out, 0, "order_date_year"), Value::Int64(2024));
        assert_eq!(*get(&out, 0, "order_date_quarter"), Value::Int64(1));
        assert_eq!(*get(&out, 0, "order_date_month"), Value::Int64(3));
        assert_eq!(*get(&out, 0, "order_date_month_name"), Value::Utf8("March".into()));
        assert_eq!(*get(&out, 0, "order_date_week"), Value::Int64(11));
        assert_eq!(*get(&out, 0, "order_date_day"), Value::Int64(15));
        // Friday under the Monday=0 convention.
        assert_eq!(*get(&out, 0, "order_date_day_of_week"), Value::Int64(4));
        assert_eq!(*get(&out, 0, "order_date_day_name"), Value::Utf8("Friday".into()));
        assert_eq!(*get(&out, 0, "order_date_is_weekend"), Value::Bool(false));
    }

    #[test]
    fn weekend_days_are_flagged() {
        let schema = Schema::new(vec![Field::new("d", DataType::Utf8)]);
        let ds = DataSet::new(
            schema,
            vec![
                vec![Value::Utf8("2024-03-16".into())], // Saturday
                vec![Value::Utf8("2024-03-17".into())], // Sunday
                vec![Value::Utf8("2024-03-18".into())], // Monday
            ],
        );

        let mut t = Transformer::new();
        let out = t.add_date_dimensions(&ds, "d");

        assert_eq!(*get(&out, 0, "d_is_weekend"), Value::Bool(true));
        assert_eq!(*get(&out, 1, "d_is_weekend"), Value::Bool(true));
        assert_eq!(*get(&out, 2, "d_is_weekend"), Value::Bool(false));
        assert_eq!(*get(&out, 2, "d_day_of_week"), Value::Int64(0));
    }

    #[test]
    fn missing_column_is_a_logged_no_op() {
        let schema = Schema::new(vec![Field::new("id", DataType::Int64)]);
        let ds = DataSet::new(schema, vec![vec![Value::Int64(1)]]);

        let mut t = Transformer::new();
        let out = t.add_date_dimensions(&ds, "order_date");

        assert_eq!(out, ds);
        let entry = &t.log()[0];
        assert_eq!(entry.operation, "add_date_dimensions");
        assert_eq!(entry.parameters["error"], "column not found");
    }

    #[test]
    fn unparseable_dates_yield_null_dimensions() {
        let schema = Schema::new(vec![Field::new("d", DataType::Utf8)]);
        let ds = DataSet::new(
            schema,
            vec![
                vec![Value::Utf8("2024-03-15".into())],
                vec![Value::Utf8("soon".into())],
            ],
        );

        let mut t = Transformer::new();
        let out = t.add_date_dimensions(&ds, "d");

        assert_eq!(*get(&out, 1, "d"), Value::Null);
        assert_eq!(*get(&out, 1, "d_year"), Value::Null);
        assert_eq!(*get(&out, 1, "d_is_weekend"), Value::Null);
        assert_eq!(*get(&out, 0, "d_year"), Value::Int64(2024));
    }
}
