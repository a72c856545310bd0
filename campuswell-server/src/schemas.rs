//! Request and response schemas for the prediction API.

use campuswell_core::Prediction;
use campuswell_core::data::StudentRecord;
use serde::{Deserialize, Serialize};

/// Input schema for a prediction request. Field names mirror the dataset's
/// column spelling. Range validation happens here — the serving layer owns
/// input validation, the core pipeline does not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentInput {
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

impl StudentInput {
    /// Validate field ranges, returning the first violation.
    pub fn validate(&self) -> Result<(), String> {
        let checks = [
            ("Age", self.age, 15.0, 30.0),
            ("CGPA", self.cgpa, 0.0, 4.0),
            ("Sleep_Duration", self.sleep_duration, 0.0, 15.0),
            ("Study_Hours", self.study_hours, 0.0, 15.0),
            ("Social_Media_Hours", self.social_media_hours, 0.0, 15.0),
            ("Physical_Activity", self.physical_activity, 0.0, 200.0),
            ("Stress_Level", self.stress_level, 0.0, 10.0),
        ];
        for (name, value, min, max) in checks {
            if !value.is_finite() || value < min || value > max {
                return Err(format!("{name} must be between {min} and {max}, got {value}"));
            }
        }
        if self.gender.trim().is_empty() {
            return Err("Gender must not be empty".to_string());
        }
        if self.department.trim().is_empty() {
            return Err("Department must not be empty".to_string());
        }
        Ok(())
    }

    pub fn into_record(self) -> StudentRecord {
        StudentRecord {
            age: self.age,
            gender: self.gender,
            department: self.department,
            cgpa: self.cgpa,
            sleep_duration: self.sleep_duration,
            study_hours: self.study_hours,
            social_media_hours: self.social_media_hours,
            physical_activity: self.physical_activity,
            stress_level: self.stress_level,
        }
    }
}

/// Response schema for prediction results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// 0 = No Depression, 1 = Depression
    pub prediction: u8,
    pub label: String,
    pub probability_no_depression: f64,
    pub probability_depression: f64,
    pub model_version: String,
}

impl PredictionResponse {
    pub fn from_prediction(prediction: Prediction, model_version: &str) -> Self {
        Self {
            prediction: u8::from(prediction.depression),
            label: prediction.label,
            probability_no_depression: round4(prediction.probability_no_depression),
            probability_depression: round4(prediction.probability_depression),
            model_version: model_version.to_string(),
        }
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Response schema for the liveness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub version: String,
}

/// Response schema for errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
