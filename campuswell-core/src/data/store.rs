//! CSV-to-SQLite import for the relational store.

use crate::config::DataConfig;
use crate::data::schema::FeatureSchema;
use crate::data::source::{CsvSource, DataSource};
use crate::error::PipelineError;
use serde_json::Value;

/// Read the flat CSV file and (re)load it into the configured SQLite table,
/// replacing any previous contents. Returns the number of imported rows.
///
/// Numeric feature columns become REAL, the target becomes INTEGER 0/1,
/// everything else (categories, the id column) becomes TEXT. The batch is
/// schema-validated before a single row is written.
pub async fn import_csv_to_sqlite(
    config: &DataConfig,
    schema: &FeatureSchema,
) -> Result<usize, PipelineError> {
    let csv = CsvSource::new(&config.csv_path, config.delimiter);
    let batch = csv.load().await?;
    if batch.is_empty() {
        return Err(PipelineError::dataset(format!(
            "{} contains no rows",
            config.csv_path.display()
        )));
    }
    schema.validate_batch(&batch)?;

    let db_path = config.db_path.clone();
    let table = config.table.clone();
    if !table
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
        || table.is_empty()
    {
        return Err(PipelineError::dataset(format!(
            "invalid table name: {table:?}"
        )));
    }

    let schema = schema.clone();
    let rows = tokio::task::spawn_blocking(move || {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = rusqlite::Connection::open(&db_path)?;

        let column_defs: Vec<String> = batch
            .columns
            .iter()
            .map(|col| {
                let sql_type = if schema.numeric.iter().any(|n| n == col) {
                    "REAL"
                } else if *col == schema.target {
                    "INTEGER"
                } else {
                    "TEXT"
                };
                format!("\"{col}\" {sql_type}")
            })
            .collect();

        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{table}\";
             CREATE TABLE \"{table}\" ({});",
            column_defs.join(", ")
        ))?;

        let placeholders: Vec<&str> = batch.columns.iter().map(|_| "?").collect();
        let insert = format!(
            "INSERT INTO \"{table}\" VALUES ({})",
            placeholders.join(", ")
        );

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for (row_no, row) in batch.rows.iter().enumerate() {
                let params: Vec<rusqlite::types::Value> = row
                    .iter()
                    .zip(&batch.columns)
                    .map(|(value, col)| sql_value(value, col, &schema, row_no))
                    .collect::<Result<_, PipelineError>>()?;
                stmt.execute(rusqlite::params_from_iter(params))?;
            }
        }
        tx.commit()?;
        Ok::<usize, PipelineError>(batch.rows.len())
    })
    .await
    .map_err(|e| PipelineError::dataset(format!("SQLite task join error: {e}")))??;

    tracing::info!(
        rows,
        table = %config.table,
        db = %config.db_path.display(),
        "imported flat file into relational store"
    );
    Ok(rows)
}

fn sql_value(
    value: &Value,
    column: &str,
    schema: &FeatureSchema,
    row_no: usize,
) -> Result<rusqlite::types::Value, PipelineError> {
    if schema.numeric.iter().any(|n| n == column) {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            PipelineError::dataset(format!("row {row_no}: column {column} is not numeric"))
        })?;
        return Ok(rusqlite::types::Value::Real(number));
    }
    if column == schema.target {
        let label = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim() {
                "True" | "true" | "1" => Some(true),
                "False" | "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
        .ok_or_else(|| {
            PipelineError::dataset(format!("row {row_no}: column {column} is not a boolean"))
        })?;
        return Ok(rusqlite::types::Value::Integer(i64::from(label)));
    }
    Ok(match value {
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Number(n) => rusqlite::types::Value::Text(n.to_string()),
        Value::Bool(b) => rusqlite::types::Value::Text(b.to_string()),
        _ => rusqlite::types::Value::Null,
    })
}
