use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type EtlResult<T> = Result<T, EtlError>;

/// Error type shared across extraction, transformation, and loading.
#[derive(Debug, Error)]
pub enum EtlError {
    /// The source file does not exist.
    ///
    /// Kept distinct from [`EtlError::Io`] so callers can tell a missing
    /// source apart from a generic read failure.
    #[error("source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Underlying I/O error (e.g. permission denied, disk failure).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV extraction error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "excel")]
    /// Excel extraction error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// The input does not conform to the provided schema (missing required
    /// fields/columns, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    Parse {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// An upsert key column is absent from the dataset.
    ///
    /// Unlike most missing-column situations this is fatal: without the key
    /// the reconciler cannot decide row identity.
    #[error("upsert key column '{column}' is missing from the dataset")]
    MissingKeyColumn { column: String },

    /// A statement against the sink failed. The surrounding load call has
    /// already been rolled back when this reaches the caller.
    #[error("sink error: {0}")]
    Sink(String),
}

impl From<rusqlite::Error> for EtlError {
    fn from(e: rusqlite::Error) -> Self {
        EtlError::Sink(e.to_string())
    }
}
