//! Source readers: files and read-only queries into a [`crate::types::DataSet`].
//!
//! Most callers use [`read_from_path`], which auto-detects the source format
//! from the file extension (or takes an explicit override via
//! [`ReadOptions`]). A missing file surfaces as
//! [`EtlError::SourceNotFound`], distinct from generic read failures.
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - Excel (behind the `excel` cargo feature)
//!
//! [`read_csv_glob`] concatenates every CSV matching a glob pattern, and
//! [`read_query`] materializes a read-only query through a sink connection.

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod json;

use std::path::Path;

use crate::error::{EtlError, EtlResult};
use crate::sink::SinkConnection;
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// How to choose sheet(s) when extracting an Excel workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcelSheetSelection {
    /// Extract the first sheet (default).
    First,
    /// Extract a single named sheet.
    Sheet(String),
    /// Extract all sheets and concatenate rows.
    AllSheets,
    /// Extract only the listed sheets (in order) and concatenate rows.
    Sheets(Vec<String>),
}

impl Default for ExcelSheetSelection {
    fn default() -> Self {
        Self::First
    }
}

/// Options controlling extraction behavior.
///
/// Use [`Default`] for common cases.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<SourceFormat>,
    /// Excel-specific options.
    pub excel_sheet_selection: ExcelSheetSelection,
}

/// Unified extraction entry point for path-based sources.
///
/// - If `options.format` is `None`, format is inferred from the file extension.
/// - Use `options.excel_sheet_selection` for Excel multi-tab behavior.
///
/// # Examples
///
/// ```no_run
/// use warehouse_etl::extract::{read_from_path, ReadOptions};
/// use warehouse_etl::types::{DataType, Field, Schema};
///
/// # fn main() -> Result<(), warehouse_etl::EtlError> {
/// let schema = Schema::new(vec![
///     Field::new("id", DataType::Int64),
///     Field::new("name", DataType::Utf8),
/// ]);
/// // Uses `.csv` to select CSV extraction.
/// let ds = read_from_path("sales.csv", &schema, &ReadOptions::default())?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn read_from_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &ReadOptions,
) -> EtlResult<DataSet> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::error!(path = %path.display(), "source not found");
        return Err(EtlError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let result = match format {
        SourceFormat::Csv => csv::read_csv_from_path(path, schema),
        SourceFormat::Json => json::read_json_from_path(path, schema),
        SourceFormat::Excel => read_excel_dispatch(path, schema, &options.excel_sheet_selection),
    };

    match &result {
        Ok(ds) => {
            tracing::info!(path = %path.display(), ?format, rows = ds.row_count(), "extracted dataset");
        }
        Err(e) => {
            tracing::error!(path = %path.display(), ?format, error = %e, "extraction failed");
        }
    }
    result
}

/// Extract and concatenate every CSV file matching a glob pattern.
///
/// Matching no files is not an error: a warning is logged and an empty
/// dataset with the given schema is returned.
pub fn read_csv_glob(pattern: &str, schema: &Schema) -> EtlResult<DataSet> {
    let entries = glob::glob(pattern).map_err(|e| EtlError::SchemaMismatch {
        message: format!("invalid glob pattern '{pattern}': {e}"),
    })?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut files = 0usize;
    for entry in entries {
        let path = entry.map_err(|e| EtlError::Io(e.into_error()))?;
        let ds = csv::read_csv_from_path(&path, schema)?;
        tracing::info!(path = %path.display(), rows = ds.row_count(), "extracted csv");
        files += 1;
        rows.extend(ds.rows);
    }

    if files == 0 {
        tracing::warn!(pattern, "no files matched pattern");
    } else {
        tracing::info!(files, rows = rows.len(), "combined csv extracts");
    }
    Ok(DataSet::new(schema.clone(), rows))
}

/// Materialize a read-only query as a dataset.
///
/// Column types are inferred from the first non-null value of each result
/// column (defaulting to text for all-null columns).
pub fn read_query<C: SinkConnection>(
    conn: &mut C,
    sql: &str,
    params: &[Value],
) -> EtlResult<DataSet> {
    let result = conn.query(sql, params)?;

    let fields = result
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let data_type = result
                .rows
                .iter()
                .find_map(|row| row.get(idx).and_then(value_type))
                .unwrap_or(DataType::Utf8);
            Field::new(name.clone(), data_type)
        })
        .collect();

    tracing::info!(rows = result.rows.len(), "extracted dataset from query");
    Ok(DataSet::new(Schema::new(fields), result.rows))
}

fn value_type(value: &Value) -> Option<DataType> {
    match value {
        Value::Null => None,
        Value::Int64(_) => Some(DataType::Int64),
        Value::Float64(_) => Some(DataType::Float64),
        Value::Bool(_) => Some(DataType::Bool),
        Value::Utf8(_) => Some(DataType::Utf8),
        Value::Date(_) => Some(DataType::Date),
    }
}

fn infer_format_from_path(path: &Path) -> EtlResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| EtlError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    SourceFormat::from_extension(ext).ok_or_else(|| EtlError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn read_excel_dispatch(
    path: &Path,
    schema: &Schema,
    sel: &ExcelSheetSelection,
) -> EtlResult<DataSet> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, schema, sel);

    #[cfg(feature = "excel")]
    {
        match sel {
            ExcelSheetSelection::First => excel::read_excel_from_path(path, None, schema),
            ExcelSheetSelection::Sheet(name) => {
                excel::read_excel_from_path(path, Some(name.as_str()), schema)
            }
            ExcelSheetSelection::AllSheets => {
                excel::read_excel_workbook_from_path(path, None, schema)
            }
            ExcelSheetSelection::Sheets(names) => {
                let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
                excel::read_excel_workbook_from_path(path, Some(refs.as_slice()), schema)
            }
        }
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(EtlError::SchemaMismatch {
            message: "excel extraction not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
