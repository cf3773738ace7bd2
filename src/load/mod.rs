//! Strategy-driven loading of datasets into the warehouse.
//!
//! A [`Loader`] owns a sink connection and a per-run load audit. Every
//! [`Loader::load`] call runs inside one sink transaction: all steps of the
//! chosen strategy commit together or roll back together, and exactly one
//! [`LoadAudit`] record is appended on success (none on failure).
//!
//! Strategy selection is an explicit caller choice. [`TableRole`] captures
//! the conventional mapping for warehouse tables:
//!
//! | role | strategy |
//! |---|---|
//! | fact | append |
//! | dimension (SCD type 1) | replace |
//! | staging / ad-hoc | truncate-then-append |
//!
//! Upsert is chosen directly via [`LoadStrategy::Upsert`] with an explicit
//! key column set.

pub mod upsert;

pub use upsert::UpsertCounts;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{EtlError, EtlResult};
use crate::sink::{quote_ident, SinkConnection};
use crate::types::{DataSet, DataType};

/// Default number of rows grouped into one underlying write call.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Conventional role of a warehouse table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    /// Append-only event/measurement table.
    Fact,
    /// Descriptive reference table, overwritten on load (SCD type 1).
    Dimension,
    /// Staging or ad-hoc table, emptied then reloaded.
    Staging,
}

impl TableRole {
    /// The load strategy conventionally used for this role.
    pub fn strategy(&self) -> LoadStrategy {
        match self {
            Self::Fact => LoadStrategy::Append,
            Self::Dimension => LoadStrategy::Replace,
            Self::Staging => LoadStrategy::TruncateReload,
        }
    }
}

/// How a dataset is reconciled against the target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Add all rows; existing rows untouched. Creates the table if missing.
    Append,
    /// Drop and recreate the table from the dataset schema, then load.
    Replace,
    /// Empty the table (within the load transaction), then append.
    TruncateReload,
    /// Insert-or-update keyed by `key_columns`; see [`upsert`].
    Upsert {
        /// Columns that identify a row in both source and target.
        key_columns: Vec<String>,
    },
}

impl LoadStrategy {
    /// Stable method name used in audit records.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Replace => "replace",
            Self::TruncateReload => "truncate_reload",
            Self::Upsert { .. } => "upsert",
        }
    }
}

/// What a load call wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadOutcome {
    /// Rows written by a bulk strategy.
    Records(usize),
    /// Rows inserted/updated by an upsert.
    Upsert {
        /// Newly inserted rows.
        inserted: usize,
        /// Existing rows updated.
        updated: usize,
    },
}

impl LoadOutcome {
    /// Total rows the call accounted for.
    pub fn total(&self) -> usize {
        match self {
            Self::Records(n) => *n,
            Self::Upsert { inserted, updated } => inserted + updated,
        }
    }
}

/// One record in the load audit log; appended per successful load call,
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct LoadAudit {
    /// Target table.
    pub table: String,
    /// Strategy method name.
    pub method: String,
    /// What was written.
    pub outcome: LoadOutcome,
    /// Wall-clock duration of the call.
    pub duration: Duration,
    /// When the call finished.
    pub timestamp: DateTime<Utc>,
}

/// Verdict of a post-load row-count check. A failed check is reported here,
/// never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadValidation {
    /// Table that was checked.
    pub table: String,
    /// Rows the caller expected to have landed.
    pub expected_rows: usize,
    /// Rows counted in the target table.
    pub actual_rows: i64,
    /// `actual_rows >= expected_rows` (the target may hold pre-existing
    /// data, so this is not an equality check).
    pub passed: bool,
    /// When the check ran.
    pub timestamp: DateTime<Utc>,
}

/// Batched, transactional load executor with a per-run audit log.
pub struct Loader<C: SinkConnection> {
    conn: C,
    batch_size: usize,
    audit: Vec<LoadAudit>,
}

impl<C: SinkConnection> Loader<C> {
    /// Create a loader with [`DEFAULT_BATCH_SIZE`].
    pub fn new(conn: C) -> Self {
        Self::with_batch_size(conn, DEFAULT_BATCH_SIZE)
    }

    /// Create a loader writing `batch_size` rows per sink call.
    ///
    /// # Panics
    ///
    /// Panics if `batch_size == 0`.
    pub fn with_batch_size(conn: C, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be > 0");
        Self {
            conn,
            batch_size,
            audit: Vec::new(),
        }
    }

    /// The underlying connection (e.g. for read-only queries between loads).
    pub fn connection(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Consume the loader, returning the connection.
    pub fn into_connection(self) -> C {
        self.conn
    }

    /// Audit records accumulated by this loader, in call order.
    pub fn audit_log(&self) -> &[LoadAudit] {
        &self.audit
    }

    /// Load `dataset` into `table` using `strategy`.
    ///
    /// The whole call is one sink transaction: on any failure every effect
    /// (including a truncate that already ran) is rolled back and the error
    /// re-raised; no audit record is appended.
    pub fn load(
        &mut self,
        dataset: &DataSet,
        table: &str,
        strategy: &LoadStrategy,
    ) -> EtlResult<LoadOutcome> {
        tracing::info!(
            table,
            rows = dataset.row_count(),
            method = strategy.method(),
            "loading dataset"
        );
        let start = Instant::now();

        self.conn.begin()?;
        let result = self.dispatch(dataset, table, strategy);
        let result = match result {
            Ok(outcome) => match self.conn.commit() {
                Ok(()) => Ok(outcome),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                let duration = start.elapsed();
                tracing::info!(table, records = outcome.total(), ?duration, "load committed");
                self.audit.push(LoadAudit {
                    table: table.to_string(),
                    method: strategy.method().to_string(),
                    outcome,
                    duration,
                    timestamp: Utc::now(),
                });
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(table, error = %e, "load failed, rolling back");
                if let Err(rb) = self.conn.rollback() {
                    tracing::error!(table, error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Append into a fact table. Returns records written.
    pub fn load_fact_table(&mut self, dataset: &DataSet, table: &str) -> EtlResult<usize> {
        self.load(dataset, table, &LoadStrategy::Append)
            .map(|o| o.total())
    }

    /// Replace a dimension table's contents (SCD type 1). Returns records
    /// written.
    pub fn load_dimension_table(&mut self, dataset: &DataSet, table: &str) -> EtlResult<usize> {
        self.load(dataset, table, &LoadStrategy::Replace)
            .map(|o| o.total())
    }

    /// Empty `table` and reload it, all in one transaction. Returns records
    /// written.
    pub fn truncate_and_load(&mut self, dataset: &DataSet, table: &str) -> EtlResult<usize> {
        self.load(dataset, table, &LoadStrategy::TruncateReload)
            .map(|o| o.total())
    }

    /// Insert-or-update keyed by `key_columns`.
    pub fn upsert(
        &mut self,
        dataset: &DataSet,
        table: &str,
        key_columns: &[String],
    ) -> EtlResult<UpsertCounts> {
        let strategy = LoadStrategy::Upsert {
            key_columns: key_columns.to_vec(),
        };
        match self.load(dataset, table, &strategy)? {
            LoadOutcome::Upsert { inserted, updated } => Ok(UpsertCounts { inserted, updated }),
            LoadOutcome::Records(_) => unreachable!("upsert strategy reports upsert outcome"),
        }
    }

    /// Post-load sanity check: count rows in `table` and report whether at
    /// least `dataset.row_count()` are present.
    pub fn validate_load(&mut self, dataset: &DataSet, table: &str) -> EtlResult<LoadValidation> {
        let actual_rows = self.conn.fetch_scalar(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            &[],
        )?;
        let expected_rows = dataset.row_count();
        let passed = actual_rows >= expected_rows as i64;
        if passed {
            tracing::info!(table, actual_rows, expected_rows, "load validation passed");
        } else {
            tracing::warn!(table, actual_rows, expected_rows, "load validation failed");
        }
        Ok(LoadValidation {
            table: table.to_string(),
            expected_rows,
            actual_rows,
            passed,
            timestamp: Utc::now(),
        })
    }

    fn dispatch(
        &mut self,
        dataset: &DataSet,
        table: &str,
        strategy: &LoadStrategy,
    ) -> EtlResult<LoadOutcome> {
        if dataset.column_count() == 0 {
            return Err(EtlError::SchemaMismatch {
                message: "cannot load a dataset with no columns".to_string(),
            });
        }

        match strategy {
            LoadStrategy::Append => {
                self.create_table(dataset, table, true)?;
                self.insert_rows(dataset, table).map(LoadOutcome::Records)
            }
            LoadStrategy::Replace => {
                self.conn.execute(
                    &format!("DROP TABLE IF EXISTS {}", quote_ident(table)),
                    &[],
                )?;
                self.create_table(dataset, table, false)?;
                self.insert_rows(dataset, table).map(LoadOutcome::Records)
            }
            LoadStrategy::TruncateReload => {
                self.create_table(dataset, table, true)?;
                self.conn
                    .execute(&format!("DELETE FROM {}", quote_ident(table)), &[])?;
                self.insert_rows(dataset, table).map(LoadOutcome::Records)
            }
            LoadStrategy::Upsert { key_columns } => upsert::reconcile(
                &mut self.conn,
                dataset,
                table,
                key_columns,
                self.batch_size,
            )
            .map(|c| LoadOutcome::Upsert {
                inserted: c.inserted,
                updated: c.updated,
            }),
        }
    }

    fn create_table(&mut self, dataset: &DataSet, table: &str, if_missing: bool) -> EtlResult<()> {
        let columns = dataset
            .schema
            .fields
            .iter()
            .map(|f| format!("{} {}", quote_ident(&f.name), sql_type(&f.data_type)))
            .collect::<Vec<_>>()
            .join(", ");
        let clause = if if_missing { " IF NOT EXISTS" } else { "" };
        let sql = format!("CREATE TABLE{clause} {} ({columns})", quote_ident(table));
        self.conn.execute(&sql, &[])?;
        Ok(())
    }

    fn insert_rows(&mut self, dataset: &DataSet, table: &str) -> EtlResult<usize> {
        if dataset.is_empty() {
            return Ok(0);
        }

        let columns = dataset
            .schema
            .fields
            .iter()
            .map(|f| quote_ident(&f.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; dataset.column_count()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            quote_ident(table)
        );

        let mut written = 0;
        for chunk in dataset.rows.chunks(self.batch_size) {
            written += self.conn.execute_batch(&sql, chunk)?;
            tracing::debug!(table, written, "wrote batch");
        }
        Ok(written)
    }
}

fn sql_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Int64 | DataType::Bool => "INTEGER",
        DataType::Float64 => "REAL",
        DataType::Utf8 | DataType::Date => "TEXT",
    }
}
