//! The sink connection seam.
//!
//! The load path talks to the warehouse through [`SinkConnection`], so the
//! executor and reconciler stay driver-agnostic. Values always travel as
//! bind parameters; identifiers go through [`quote_ident`]. Interpolating
//! values into statement text is a correctness and injection bug.
//!
//! A connection is single-owner and non-reentrant: callers wanting parallel
//! loads across independent tables must use one connection per worker.
//!
//! [`SqliteSink`] is the bundled driver; other warehouses implement the same
//! trait outside this crate.

pub mod sqlite;

pub use sqlite::SqliteSink;

use crate::error::EtlResult;
use crate::types::Value;

/// Result set of a read-only query: column names plus row-major values.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRows {
    /// Column names in statement order.
    pub columns: Vec<String>,
    /// Row-major values.
    pub rows: Vec<Vec<Value>>,
}

/// Minimal connection surface needed by the load path.
///
/// Transactions are explicit: [`begin`](Self::begin) opens one,
/// [`commit`](Self::commit)/[`rollback`](Self::rollback) close it. Without
/// an open transaction each statement commits on its own.
pub trait SinkConnection {
    /// Execute one statement with bind parameters; returns affected rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> EtlResult<usize>;

    /// Execute one prepared statement once per row of bind parameters;
    /// returns total affected rows.
    fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> EtlResult<usize>;

    /// Run a read-only query and materialize the full result set.
    fn query(&mut self, sql: &str, params: &[Value]) -> EtlResult<QueryRows>;

    /// Run a query expected to return a single integer (e.g. `COUNT(*)`).
    fn fetch_scalar(&mut self, sql: &str, params: &[Value]) -> EtlResult<i64>;

    /// Open a transaction.
    fn begin(&mut self) -> EtlResult<()>;

    /// Commit the open transaction.
    fn commit(&mut self) -> EtlResult<()>;

    /// Roll back the open transaction.
    fn rollback(&mut self) -> EtlResult<()>;
}

/// Quote an identifier (table or column name) for use in statement text.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
