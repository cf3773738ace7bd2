//! `warehouse-etl` moves tabular business records (e.g. retail sales) from
//! flat-file or query sources into a structured warehouse, applying
//! cleaning, enrichment, and load-strategy logic along the way.
//!
//! The pipeline flows [`types::DataSet`] values through four stages:
//!
//! 1. **Extract** ([`extract`]): schema-first readers for CSV, JSON, Excel
//!    (cargo feature `excel`), glob'd CSV sets, and read-only queries.
//! 2. **Transform** ([`transform`]): a per-run [`transform::Transformer`]
//!    applies cleaning and enrichment operations, recording one operation-log
//!    entry per call.
//! 3. **Validate** ([`validate`]): range-constraint filtering and pure
//!    dataset summaries.
//! 4. **Load** ([`load`]): a [`load::Loader`] reconciles the dataset against
//!    a warehouse table through a [`sink::SinkConnection`], using append,
//!    replace, truncate-reload, or keyed upsert semantics, with one
//!    transaction and one audit record per call.
//!
//! ## Quick example: transform and inspect
//!
//! ```rust
//! use warehouse_etl::transform::{MissingPolicy, Transformer};
//! use warehouse_etl::types::{DataSet, DataType, Field, Schema, Value};
//! use warehouse_etl::validate;
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
//!
//! let summary = validate::summarize(&ds);
//! assert_eq!(summary.column_names, vec!["quantity", "unit_price", "subtotal"]);
//! ```
//!
//! ## Quick example: load into SQLite
//!
//! ```no_run
//! use warehouse_etl::load::{LoadStrategy, Loader};
//! use warehouse_etl::sink::SqliteSink;
//! use warehouse_etl::types::{DataSet, DataType, Field, Schema};
//!
//! # fn main() -> Result<(), warehouse_etl::EtlError> {
//! # let dataset = DataSet::empty(Schema::new(vec![Field::new("id", DataType::Int64)]));
//! let sink = SqliteSink::open("warehouse.db")?;
//! let mut loader = Loader::new(sink);
//!
//! loader.load(&dataset, "fact_sales", &LoadStrategy::Append)?;
//! let check = loader.validate_load(&dataset, "fact_sales")?;
//! assert!(check.passed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`extract`]: source readers (files, globs, queries)
//! - [`transform`]: cleaning/enrichment engine with operation log
//! - [`validate`]: range validation and dataset summaries
//! - [`load`]: load strategies, executor, upsert reconciler, audit log
//! - [`sink`]: the sink connection seam + bundled SQLite driver
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: error types used across the pipeline
//!
//! The core is single-threaded, synchronous, and blocking; a sink connection
//! is single-owner and non-reentrant. Callers wanting parallel loads across
//! independent tables coordinate their own connections.

pub mod error;
pub mod extract;
pub mod load;
pub mod sink;
pub mod transform;
pub mod types;
pub mod validate;

pub use error::{EtlError, EtlResult};
