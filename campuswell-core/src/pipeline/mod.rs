//! Feature preprocessing: one declarative transformation from raw columns
//! to a numeric design matrix, learned on the training partition and reused
//! verbatim at evaluation and inference time.

pub mod encoder;
pub mod scaler;

pub use encoder::OneHotEncoder;
pub use scaler::StandardScaler;

use crate::data::{Dataset, FeatureSchema, StudentRecord};
use crate::error::PipelineError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// The fitted column transformation: one scaler per numeric column, one
/// encoder per categorical column, in declared schema order.
///
/// Fitting reads statistics from the training partition only and never
/// mutates its input. The expanded output column order is fully determined
/// by the schema and the sorted training categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedColumnTransform {
    schema: FeatureSchema,
    scalers: Vec<StandardScaler>,
    encoders: Vec<OneHotEncoder>,
}

impl FittedColumnTransform {
    /// Learn the transformation from a training partition.
    pub fn fit(data: &Dataset) -> Self {
        let schema = data.schema().clone();
        let scalers = (0..schema.numeric.len())
            .map(|i| StandardScaler::fit(data.numeric_column(i)))
            .collect();
        let encoders = (0..schema.categorical.len())
            .map(|i| OneHotEncoder::fit(data.categorical_column(i)))
            .collect();
        Self {
            schema,
            scalers,
            encoders,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Width of the output matrix.
    pub fn output_width(&self) -> usize {
        self.scalers.len() + self.encoders.iter().map(OneHotEncoder::width).sum::<usize>()
    }

    /// Deterministic names of the expanded output columns.
    pub fn output_columns(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.output_width());
        for col in &self.schema.numeric {
            names.push(format!("num__{col}"));
        }
        for (col, encoder) in self.schema.categorical.iter().zip(&self.encoders) {
            for category in &encoder.categories {
                names.push(format!("cat__{col}__{category}"));
            }
        }
        names
    }

    /// Transform a dataset into the design matrix (rows x expanded columns).
    pub fn transform(&self, data: &Dataset) -> Result<Array2<f64>, PipelineError> {
        if data.schema() != &self.schema {
            return Err(PipelineError::schema(
                "dataset schema does not match the fitted transform",
            ));
        }
        let n_rows = data.len();
        let width = self.output_width();
        let mut matrix = Array2::zeros((n_rows, width));
        for row in 0..n_rows {
            let mut values = Vec::with_capacity(width);
            for (i, scaler) in self.scalers.iter().enumerate() {
                values.push(scaler.transform(data.numeric_column(i)[row]));
            }
            for (i, encoder) in self.encoders.iter().enumerate() {
                encoder.encode_into(&data.categorical_column(i)[row], &mut values);
            }
            for (col, v) in values.into_iter().enumerate() {
                matrix[[row, col]] = v;
            }
        }
        Ok(matrix)
    }

    /// Transform one inference record into a feature vector.
    pub fn transform_record(&self, record: &StudentRecord) -> Result<Vec<f64>, PipelineError> {
        let numeric = record.numeric_values();
        let categorical = record.categorical_values();
        if numeric.len() != self.scalers.len() || categorical.len() != self.encoders.len() {
            return Err(PipelineError::schema(
                "record shape does not match the fitted transform",
            ));
        }
        let mut values = Vec::with_capacity(self.output_width());
        for (scaler, v) in self.scalers.iter().zip(&numeric) {
            values.push(scaler.transform(*v));
        }
        for (encoder, v) in self.encoders.iter().zip(&categorical) {
            encoder.encode_into(v, &mut values);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataBatch;

    fn sample_dataset() -> Dataset {
        let schema = FeatureSchema::student_lifestyle();
        let batch = DataBatch {
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
            rows: vec![
                vec![
                    serde_json::json!(20),
                    serde_json::json!("Male"),
                    serde_json::json!("Science"),
                    serde_json::json!(3.0),
                    serde_json::json!(8.0),
                    serde_json::json!(4.0),
                    serde_json::json!(2.0),
                    serde_json::json!(100),
                    serde_json::json!(2),
                    serde_json::json!(false),
                ],
                vec![
                    serde_json::json!(24),
                    serde_json::json!("Female"),
                    serde_json::json!("Arts"),
                    serde_json::json!(2.5),
                    serde_json::json!(4.0),
                    serde_json::json!(7.0),
                    serde_json::json!(5.0),
                    serde_json::json!(20),
                    serde_json::json!(9),
                    serde_json::json!(true),
                ],
            ],
        };
        Dataset::from_batch(&schema, &batch).unwrap()
    }

    #[test]
    fn test_output_columns_are_deterministic() {
        let data = sample_dataset();
        let fitted = FittedColumnTransform::fit(&data);
        let columns = fitted.output_columns();
        assert_eq!(columns.len(), fitted.output_width());
        assert_eq!(columns[0], "num__Age");
        // Categories are sorted, so Arts precedes Science.
        let cat_cols: Vec<&String> =
            columns.iter().filter(|c| c.starts_with("cat__Department")).collect();
        assert_eq!(cat_cols, vec!["cat__Department__Arts", "cat__Department__Science"]);

        let refit = FittedColumnTransform::fit(&data);
        assert_eq!(refit.output_columns(), columns);
    }

    #[test]
    fn test_transform_shape_and_determinism() {
        let data = sample_dataset();
        let fitted = FittedColumnTransform::fit(&data);
        let first = fitted.transform(&data).unwrap();
        let second = fitted.transform(&data).unwrap();
        assert_eq!(first.nrows(), 2);
        assert_eq!(first.ncols(), fitted.output_width());
        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_standardizes_numeric_columns() {
        let data = sample_dataset();
        let fitted = FittedColumnTransform::fit(&data);
        let matrix = fitted.transform(&data).unwrap();
        // Two samples: standardized values are symmetric around zero.
        assert!((matrix[[0, 0]] + matrix[[1, 0]]).abs() < 1e-12);
    }

    #[test]
    fn test_transform_record_matches_dataset_transform() {
        let data = sample_dataset();
        let fitted = FittedColumnTransform::fit(&data);
        let matrix = fitted.transform(&data).unwrap();
        let record = StudentRecord {
            age: 20.0,
            gender: "Male".to_string(),
            department: "Science".to_string(),
            cgpa: 3.0,
            sleep_duration: 8.0,
            study_hours: 4.0,
            social_media_hours: 2.0,
            physical_activity: 100.0,
            stress_level: 2.0,
        };
        let vector = fitted.transform_record(&record).unwrap();
        for (col, v) in vector.iter().enumerate() {
            assert!((matrix[[0, col]] - v).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unseen_category_is_all_zero_block() {
        let data = sample_dataset();
        let fitted = FittedColumnTransform::fit(&data);
        let record = StudentRecord {
            age: 20.0,
            gender: "Nonbinary".to_string(),
            department: "Medicine".to_string(),
            cgpa: 3.0,
            sleep_duration: 8.0,
            study_hours: 4.0,
            social_media_hours: 2.0,
            physical_activity: 100.0,
            stress_level: 2.0,
        };
        let vector = fitted.transform_record(&record).unwrap();
        let n_numeric = data.schema().numeric.len();
        assert!(vector[n_numeric..].iter().all(|&v| v == 0.0));
    }
}
