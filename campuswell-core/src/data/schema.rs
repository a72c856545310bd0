//! Declared feature schema and the typed student record.
//!
//! The schema is an explicit declaration of which columns are numeric,
//! which are categorical, and which one is the target. It is validated once
//! against the loaded batch, before any fitting.

use crate::data::source::DataBatch;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Declared column sets for a tabular dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Numeric feature columns, in canonical order.
    pub numeric: Vec<String>,
    /// Categorical feature columns, in canonical order.
    pub categorical: Vec<String>,
    /// Boolean target column.
    pub target: String,
    /// Optional identifier column; tolerated in the source, never used as
    /// a feature.
    pub id_column: Option<String>,
}

impl FeatureSchema {
    /// The canonical student lifestyle schema.
    pub fn student_lifestyle() -> Self {
        Self {
            numeric: vec![
                "Age".to_string(),
                "CGPA".to_string(),
                "Sleep_Duration".to_string(),
                "Study_Hours".to_string(),
                "Social_Media_Hours".to_string(),
                "Physical_Activity".to_string(),
                "Stress_Level".to_string(),
            ],
            categorical: vec!["Gender".to_string(), "Department".to_string()],
            target: "Depression".to_string(),
            id_column: Some("Student_ID".to_string()),
        }
    }

    /// All feature columns (numeric then categorical), excluding the target.
    pub fn feature_columns(&self) -> Vec<&str> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
            .collect()
    }

    /// Validate a loaded batch against the declared column sets.
    ///
    /// Missing declared columns and unknown extra columns are both fatal;
    /// this runs before any fitting begins.
    pub fn validate_batch(&self, batch: &DataBatch) -> Result<(), PipelineError> {
        let mut missing = Vec::new();
        for col in self.feature_columns() {
            if !batch.columns.iter().any(|c| c == col) {
                missing.push(col.to_string());
            }
        }
        if !batch.columns.iter().any(|c| *c == self.target) {
            missing.push(self.target.clone());
        }
        if !missing.is_empty() {
            return Err(PipelineError::schema(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let extra: Vec<&str> = batch
            .columns
            .iter()
            .map(String::as_str)
            .filter(|c| {
                !self.numeric.iter().any(|n| n == c)
                    && !self.categorical.iter().any(|k| k == c)
                    && *c != self.target
                    && self.id_column.as_deref() != Some(c)
            })
            .collect();
        if !extra.is_empty() {
            return Err(PipelineError::schema(format!(
                "unknown columns not covered by the declared schema: {}",
                extra.join(", ")
            )));
        }

        // Duplicated headers would make column lookup ambiguous.
        for (i, col) in batch.columns.iter().enumerate() {
            if batch.columns[..i].iter().any(|c| c == col) {
                return Err(PipelineError::schema(format!("duplicated column: {col}")));
            }
        }

        Ok(())
    }
}

/// One student record, feature fields only.
///
/// Field names keep the source dataset's column spelling through serde
/// renames so that JSON inference inputs match the stored schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "CGPA")]
    pub cgpa: f64,
    #[serde(rename = "Sleep_Duration")]
    pub sleep_duration: f64,
    #[serde(rename = "Study_Hours")]
    pub study_hours: f64,
    #[serde(rename = "Social_Media_Hours")]
    pub social_media_hours: f64,
    #[serde(rename = "Physical_Activity")]
    pub physical_activity: f64,
    #[serde(rename = "Stress_Level")]
    pub stress_level: f64,
}

impl StudentRecord {
    /// Numeric feature values in canonical schema order.
    pub fn numeric_values(&self) -> Vec<f64> {
        vec![
            self.age,
            self.cgpa,
            self.sleep_duration,
            self.study_hours,
            self.social_media_hours,
            self.physical_activity,
            self.stress_level,
        ]
    }

    /// Categorical feature values in canonical schema order.
    pub fn categorical_values(&self) -> Vec<String> {
        vec![self.gender.clone(), self.department.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_with_columns(columns: &[&str]) -> DataBatch {
        DataBatch {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn full_columns() -> Vec<&'static str> {
        vec![
            "Student_ID",
            "Age",
            "Gender",
            "Department",
            "CGPA",
            "Sleep_Duration",
            "Study_Hours",
            "Social_Media_Hours",
            "Physical_Activity",
            "Stress_Level",
            "Depression",
        ]
    }

    #[test]
    fn test_validate_batch_accepts_full_schema() {
        let schema = FeatureSchema::student_lifestyle();
        let batch = batch_with_columns(&full_columns());
        assert!(schema.validate_batch(&batch).is_ok());
    }

    #[test]
    fn test_validate_batch_missing_column() {
        let schema = FeatureSchema::student_lifestyle();
        let cols: Vec<&str> = full_columns()
            .into_iter()
            .filter(|c| *c != "CGPA")
            .collect();
        let err = schema.validate_batch(&batch_with_columns(&cols)).unwrap_err();
        assert!(err.to_string().contains("CGPA"));
    }

    #[test]
    fn test_validate_batch_extra_column() {
        let schema = FeatureSchema::student_lifestyle();
        let mut cols = full_columns();
        cols.push("Favorite_Color");
        let err = schema.validate_batch(&batch_with_columns(&cols)).unwrap_err();
        assert!(err.to_string().contains("Favorite_Color"));
    }

    #[test]
    fn test_validate_batch_duplicate_column() {
        let schema = FeatureSchema::student_lifestyle();
        let mut cols = full_columns();
        cols.push("Age");
        let err = schema.validate_batch(&batch_with_columns(&cols)).unwrap_err();
        assert!(err.to_string().contains("duplicated"));
    }

    #[test]
    fn test_student_record_value_order_matches_schema() {
        let schema = FeatureSchema::student_lifestyle();
        let record = StudentRecord {
            age: 20.0,
            gender: "Female".to_string(),
            department: "Science".to_string(),
            cgpa: 3.2,
            sleep_duration: 7.0,
            study_hours: 4.0,
            social_media_hours: 2.0,
            physical_activity: 80.0,
            stress_level: 3.0,
        };
        assert_eq!(record.numeric_values().len(), schema.numeric.len());
        assert_eq!(record.categorical_values().len(), schema.categorical.len());
        // Age is the first declared numeric column.
        assert_eq!(record.numeric_values()[0], 20.0);
    }

    #[test]
    fn test_student_record_serde_uses_source_column_names() {
        let json = serde_json::json!({
            "Age": 21,
            "Gender": "Male",
            "Department": "Engineering",
            "CGPA": 3.5,
            "Sleep_Duration": 6.5,
            "Study_Hours": 5.0,
            "Social_Media_Hours": 2.5,
            "Physical_Activity": 120,
            "Stress_Level": 4
        });
        let record: StudentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.department, "Engineering");
        assert_eq!(record.stress_level, 4.0);
    }
}
