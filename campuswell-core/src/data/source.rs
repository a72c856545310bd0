//! Data sources for the student lifestyle dataset.
//!
//! Two sources are supported: a read-only SQLite table (the relational
//! store) and a flat CSV file. [`resolve_dataset`] implements the two-step
//! resolution policy: relational first, flat file on failure, fatal when
//! both are unusable.

use crate::config::DataConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A rectangular batch of loaded rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl DataBatch {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Information about a data source for lineage logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceInfo {
    pub source_type: String,
    pub location: String,
    pub accessed_at: chrono::DateTime<chrono::Utc>,
    pub row_count: Option<usize>,
}

/// Trait for loading the dataset from a source.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Load all rows from this source.
    async fn load(&self) -> Result<DataBatch, PipelineError>;

    /// Return metadata about this source for lineage logging.
    fn source_info(&self) -> DataSourceInfo;
}

// ---------------------------------------------------------------------------
// SqliteSource
// ---------------------------------------------------------------------------

/// SQLite table data source. Opens the database read-only.
pub struct SqliteSource {
    pub db_path: PathBuf,
    pub table: String,
}

impl SqliteSource {
    pub fn new(db_path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            table: table.into(),
        }
    }
}

#[async_trait]
impl DataSource for SqliteSource {
    async fn load(&self) -> Result<DataBatch, PipelineError> {
        if !self
            .table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
            || self.table.is_empty()
        {
            return Err(PipelineError::dataset(format!(
                "invalid table name: {:?}",
                self.table
            )));
        }

        let db_path = self.db_path.clone();
        let query = format!("SELECT * FROM \"{}\"", self.table);

        // Run blocking SQLite operations on a blocking thread
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open_with_flags(
                &db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
            )?;
            let mut stmt = conn.prepare(&query)?;
            let column_count = stmt.column_count();
            let columns: Vec<String> = (0..column_count)
                .map(|i| stmt.column_name(i).unwrap_or("?").to_string())
                .collect();

            let mut rows = Vec::new();
            let mut result_rows = stmt.query([])?;
            while let Some(row) = result_rows.next()? {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    let val = match row.get_ref(i) {
                        Ok(rusqlite::types::ValueRef::Null) => serde_json::Value::Null,
                        Ok(rusqlite::types::ValueRef::Integer(n)) => serde_json::json!(n),
                        Ok(rusqlite::types::ValueRef::Real(f)) => serde_json::Number::from_f64(f)
                            .map(serde_json::Value::Number)
                            .unwrap_or(serde_json::Value::Null),
                        Ok(rusqlite::types::ValueRef::Text(t)) => {
                            serde_json::Value::String(String::from_utf8_lossy(t).into_owned())
                        }
                        Ok(rusqlite::types::ValueRef::Blob(_)) => {
                            serde_json::Value::String("<blob>".to_string())
                        }
                        Err(_) => serde_json::Value::Null,
                    };
                    values.push(val);
                }
                rows.push(values);
            }

            Ok(DataBatch { columns, rows })
        })
        .await
        .map_err(|e| PipelineError::dataset(format!("SQLite task join error: {e}")))?
    }

    fn source_info(&self) -> DataSourceInfo {
        DataSourceInfo {
            source_type: "sqlite".to_string(),
            location: format!("{}#{}", self.db_path.display(), self.table),
            accessed_at: chrono::Utc::now(),
            row_count: None,
        }
    }
}

// ---------------------------------------------------------------------------
// CsvSource
// ---------------------------------------------------------------------------

/// Flat-file CSV data source.
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: char,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }
}

/// Parse a CSV cell into a typed value: integer, float, boolean, or string.
fn parse_cell(s: &str) -> serde_json::Value {
    if let Ok(i) = s.parse::<i64>() {
        serde_json::Value::Number(i.into())
    } else if let Ok(f) = s.parse::<f64>() {
        serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(s.to_string()))
    } else if s == "true" || s == "false" {
        serde_json::Value::Bool(s == "true")
    } else {
        serde_json::Value::String(s.to_string())
    }
}

#[async_trait]
impl DataSource for CsvSource {
    async fn load(&self) -> Result<DataBatch, PipelineError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let mut lines = content.lines();

        // Parse header
        let columns: Vec<String> = lines
            .next()
            .ok_or_else(|| PipelineError::dataset("Empty CSV file"))?
            .split(self.delimiter)
            .map(|s| s.trim().trim_matches('"').to_string())
            .collect();

        let mut rows = Vec::new();
        for (line_no, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row: Vec<serde_json::Value> = line
                .split(self.delimiter)
                .map(|s| parse_cell(s.trim().trim_matches('"')))
                .collect();
            if row.len() != columns.len() {
                return Err(PipelineError::dataset(format!(
                    "line {}: expected {} fields, found {}",
                    line_no + 2,
                    columns.len(),
                    row.len()
                )));
            }
            rows.push(row);
        }

        Ok(DataBatch { columns, rows })
    }

    fn source_info(&self) -> DataSourceInfo {
        DataSourceInfo {
            source_type: "csv".to_string(),
            location: self.path.display().to_string(),
            accessed_at: chrono::Utc::now(),
            row_count: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Two-step source resolution
// ---------------------------------------------------------------------------

/// Resolve the dataset: relational store first, flat file on failure.
///
/// An empty batch counts as a failed source; training must never proceed on
/// an empty dataset. When both sources fail the error carries both causes.
pub async fn resolve_dataset(
    config: &DataConfig,
) -> Result<(DataBatch, DataSourceInfo), PipelineError> {
    let sqlite = SqliteSource::new(&config.db_path, &config.table);
    let primary_failure = match sqlite.load().await {
        Ok(batch) if !batch.is_empty() => {
            let mut info = sqlite.source_info();
            info.row_count = Some(batch.row_count());
            tracing::info!(
                rows = batch.row_count(),
                source = %info.location,
                "loaded dataset from relational store"
            );
            return Ok((batch, info));
        }
        Ok(_) => PipelineError::dataset(format!(
            "table {:?} in {} contains no rows",
            config.table,
            config.db_path.display()
        )),
        Err(e) => e,
    };

    tracing::warn!(
        error = %primary_failure,
        fallback = %config.csv_path.display(),
        "relational read failed, falling back to flat file"
    );

    let csv = CsvSource::new(&config.csv_path, config.delimiter);
    match csv.load().await {
        Ok(batch) if !batch.is_empty() => {
            let mut info = csv.source_info();
            info.row_count = Some(batch.row_count());
            tracing::info!(
                rows = batch.row_count(),
                source = %info.location,
                "loaded dataset from flat file"
            );
            Ok((batch, info))
        }
        Ok(_) => Err(PipelineError::config(format!(
            "no usable data source: relational read failed ({primary_failure}); flat file {} contains no rows",
            config.csv_path.display()
        ))),
        Err(fallback_failure) => Err(PipelineError::config(format!(
            "no usable data source: relational read failed ({primary_failure}); flat-file read failed ({fallback_failure})"
        ))),
    }
}
