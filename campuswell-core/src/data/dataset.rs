//! Typed, column-major dataset built from a validated batch.

use crate::data::schema::FeatureSchema;
use crate::data::source::DataBatch;
use crate::error::PipelineError;
use serde_json::Value;

/// A validated, typed dataset: numeric and categorical feature columns plus
/// boolean labels. Immutable after construction; partitions are produced
/// with [`Dataset::subset`].
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: FeatureSchema,
    /// Column-major numeric values, parallel to `schema.numeric`.
    numeric: Vec<Vec<f64>>,
    /// Column-major categorical values, parallel to `schema.categorical`.
    categorical: Vec<Vec<String>>,
    labels: Vec<bool>,
}

impl Dataset {
    /// Build a dataset from a loaded batch, validating the schema and every
    /// cell. Any missing, null, or unparsable value is a fatal dataset
    /// error; there is no imputation.
    pub fn from_batch(schema: &FeatureSchema, batch: &DataBatch) -> Result<Self, PipelineError> {
        schema.validate_batch(batch)?;

        let column_index = |name: &str| -> Result<usize, PipelineError> {
            batch
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| PipelineError::schema(format!("missing column: {name}")))
        };

        let n_rows = batch.row_count();
        let mut numeric = Vec::with_capacity(schema.numeric.len());
        for name in &schema.numeric {
            let col = column_index(name)?;
            let mut values = Vec::with_capacity(n_rows);
            for (row_no, row) in batch.rows.iter().enumerate() {
                let value = row.get(col).unwrap_or(&Value::Null);
                values.push(parse_numeric(value).ok_or_else(|| {
                    PipelineError::dataset(format!(
                        "row {row_no}: column {name} is not numeric: {value}"
                    ))
                })?);
            }
            numeric.push(values);
        }

        let mut categorical = Vec::with_capacity(schema.categorical.len());
        for name in &schema.categorical {
            let col = column_index(name)?;
            let mut values = Vec::with_capacity(n_rows);
            for (row_no, row) in batch.rows.iter().enumerate() {
                let value = row.get(col).unwrap_or(&Value::Null);
                match value {
                    Value::String(s) if !s.is_empty() => values.push(s.clone()),
                    _ => {
                        return Err(PipelineError::dataset(format!(
                            "row {row_no}: column {name} is not a category label: {value}"
                        )));
                    }
                }
            }
            categorical.push(values);
        }

        let target_col = column_index(&schema.target)?;
        let mut labels = Vec::with_capacity(n_rows);
        for (row_no, row) in batch.rows.iter().enumerate() {
            let value = row.get(target_col).unwrap_or(&Value::Null);
            labels.push(parse_label(value).ok_or_else(|| {
                PipelineError::dataset(format!(
                    "row {row_no}: column {} is not a boolean target: {value}",
                    schema.target
                ))
            })?);
        }

        Ok(Self {
            schema: schema.clone(),
            numeric,
            categorical,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    /// Numeric column by schema position.
    pub fn numeric_column(&self, index: usize) -> &[f64] {
        &self.numeric[index]
    }

    /// Categorical column by schema position.
    pub fn categorical_column(&self, index: usize) -> &[String] {
        &self.categorical[index]
    }

    /// (negative, positive) label counts.
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l).count();
        (self.labels.len() - positives, positives)
    }

    pub fn positive_fraction(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        let (_, positives) = self.class_counts();
        positives as f64 / self.labels.len() as f64
    }

    /// Materialize a partition from row indices. Indices may repeat
    /// (bootstrap use is not needed here, but subsetting is order-preserving).
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            schema: self.schema.clone(),
            numeric: self
                .numeric
                .iter()
                .map(|col| indices.iter().map(|&i| col[i]).collect())
                .collect(),
            categorical: self
                .categorical
                .iter()
                .map(|col| indices.iter().map(|&i| col[i].clone()).collect())
                .collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

fn parse_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Accept boolean, 0/1 integer, and "True"/"False" spellings for the target.
fn parse_label(value: &Value) -> Option<bool> {
    match value {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_from_rows(rows: Vec<Vec<Value>>) -> DataBatch {
        DataBatch {
            columns: vec![
                "Age".to_string(),
                "Gender".to_string(),
                "Department".to_string(),
                "CGPA".to_string(),
                "Sleep_Duration".to_string(),
                "Study_Hours".to_string(),
                "Social_Media_Hours".to_string(),
                "Physical_Activity".to_string(),
                "Stress_Level".to_string(),
                "Depression".to_string(),
            ],
            rows,
        }
    }

    fn row(age: i64, gender: &str, depression: Value) -> Vec<Value> {
        vec![
            serde_json::json!(age),
            serde_json::json!(gender),
            serde_json::json!("Science"),
            serde_json::json!(3.0),
            serde_json::json!(7.0),
            serde_json::json!(4.0),
            serde_json::json!(2.0),
            serde_json::json!(90),
            serde_json::json!(3),
            depression,
        ]
    }

    #[test]
    fn test_from_batch_builds_typed_columns() {
        let schema = FeatureSchema::student_lifestyle();
        let batch = batch_from_rows(vec![
            row(20, "Male", serde_json::json!(false)),
            row(22, "Female", serde_json::json!("True")),
            row(25, "Male", serde_json::json!(1)),
        ]);
        let dataset = Dataset::from_batch(&schema, &batch).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.numeric_column(0), &[20.0, 22.0, 25.0]);
        assert_eq!(dataset.categorical_column(0)[1], "Female");
        assert_eq!(dataset.labels(), &[false, true, true]);
        assert_eq!(dataset.class_counts(), (1, 2));
    }

    #[test]
    fn test_from_batch_rejects_null_numeric() {
        let schema = FeatureSchema::student_lifestyle();
        let mut bad = row(20, "Male", serde_json::json!(false));
        bad[0] = Value::Null;
        let batch = batch_from_rows(vec![bad]);
        let err = Dataset::from_batch(&schema, &batch).unwrap_err();
        assert!(err.to_string().contains("Age"));
    }

    #[test]
    fn test_from_batch_rejects_unparsable_target() {
        let schema = FeatureSchema::student_lifestyle();
        let batch = batch_from_rows(vec![row(20, "Male", serde_json::json!("maybe"))]);
        let err = Dataset::from_batch(&schema, &batch).unwrap_err();
        assert!(err.to_string().contains("Depression"));
    }

    #[test]
    fn test_subset_preserves_order() {
        let schema = FeatureSchema::student_lifestyle();
        let batch = batch_from_rows(vec![
            row(20, "Male", serde_json::json!(false)),
            row(22, "Female", serde_json::json!(true)),
            row(25, "Male", serde_json::json!(false)),
        ]);
        let dataset = Dataset::from_batch(&schema, &batch).unwrap();
        let part = dataset.subset(&[2, 0]);
        assert_eq!(part.len(), 2);
        assert_eq!(part.numeric_column(0), &[25.0, 20.0]);
        assert_eq!(part.labels(), &[false, false]);
    }
}
