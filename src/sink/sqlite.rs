//! SQLite-backed sink connection.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};

use super::{QueryRows, SinkConnection};
use crate::error::EtlResult;
use crate::types::Value;

/// A [`SinkConnection`] over a local SQLite database.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open (creating if needed) a database file.
    pub fn open(path: impl AsRef<Path>) -> EtlResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open a private in-memory database. Handy for tests.
    pub fn open_in_memory() -> EtlResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }
}

/// Dataset value → SQLite storage class. Booleans become integers and dates
/// ISO-8601 text, matching [`Value::lookup_key`](crate::types::Value) so
/// written keys compare equal when read back.
fn bind(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Int64(v) => SqlValue::Integer(*v),
        Value::Float64(v) => SqlValue::Real(*v),
        Value::Bool(v) => SqlValue::Integer(i64::from(*v)),
        Value::Utf8(v) => SqlValue::Text(v.clone()),
        Value::Date(v) => SqlValue::Text(v.format("%Y-%m-%d").to_string()),
    }
}

fn unbind(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::Int64(v),
        SqlValue::Real(v) => Value::Float64(v),
        SqlValue::Text(v) => Value::Utf8(v),
        SqlValue::Blob(v) => Value::Utf8(String::from_utf8_lossy(&v).into_owned()),
    }
}

impl SinkConnection for SqliteSink {
    fn execute(&mut self, sql: &str, params: &[Value]) -> EtlResult<usize> {
        Ok(self.conn.execute(sql, params_from_iter(params.iter().map(bind)))?)
    }

    fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> EtlResult<usize> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut affected = 0;
        for row in rows {
            affected += stmt.execute(params_from_iter(row.iter().map(bind)))?;
        }
        Ok(affected)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> EtlResult<QueryRows> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let mut out: Vec<Vec<Value>> = Vec::new();
        let mut rows = stmt.query(params_from_iter(params.iter().map(bind)))?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let v: SqlValue = row.get(idx)?;
                values.push(unbind(v));
            }
            out.push(values);
        }

        Ok(QueryRows {
            columns,
            rows: out,
        })
    }

    fn fetch_scalar(&mut self, sql: &str, params: &[Value]) -> EtlResult<i64> {
        Ok(self
            .conn
            .query_row(sql, params_from_iter(params.iter().map(bind)), |row| row.get(0))?)
    }

    fn begin(&mut self) -> EtlResult<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> EtlResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> EtlResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
