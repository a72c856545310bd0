//! End-to-end training pipeline tests on synthetic skewed data.
//!
//! Exercises the full path: flat-file fallback, schema validation,
//! stratified split, randomized search, held-out evaluation, artifact and
//! metrics export, and inference on the exported artifact.

use campuswell_core::artifact::TrainedPipeline;
use campuswell_core::config::AppConfig;
use campuswell_core::data::StudentRecord;
use campuswell_core::eval::Scoring;
use campuswell_core::model::MaxFeatures;
use campuswell_core::search::SearchSpace;
use campuswell_core::tracking::{LocalTracker, NoopTracker};
use campuswell_core::train::run_training;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt::Write as _;
use std::path::Path;

const DEPARTMENTS: [&str; 5] = ["Science", "Engineering", "Medical", "Arts", "Business"];

/// 1,000 synthetic student records with a 90/10 class skew. Depressed
/// records sleep less and report more stress, so there is real signal for
/// the classifier to find.
fn synthetic_csv(n: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut csv = String::from(
        "Student_ID,Age,Gender,Department,CGPA,Sleep_Duration,Study_Hours,\
         Social_Media_Hours,Physical_Activity,Stress_Level,Depression\n",
    );
    for i in 0..n {
        let positive = i % 10 == 0;
        let age = rng.gen_range(17..=29);
        let gender = if rng.gen_range(0..2) == 0 { "Male" } else { "Female" };
        let department = DEPARTMENTS[rng.gen_range(0..DEPARTMENTS.len())];
        let cgpa = 2.0 + rng.gen_range(0..=20) as f64 / 10.0;
        let (sleep, stress) = if positive {
            (
                2.5 + rng.gen_range(0..=20) as f64 / 10.0,
                7 + rng.gen_range(0..=3),
            )
        } else {
            (
                6.0 + rng.gen_range(0..=30) as f64 / 10.0,
                1 + rng.gen_range(0..=5),
            )
        };
        let study = 1.0 + rng.gen_range(0..=80) as f64 / 10.0;
        let social = rng.gen_range(0..=60) as f64 / 10.0;
        let activity = rng.gen_range(0..=180);
        writeln!(
            csv,
            "{id},{age},{gender},{department},{cgpa:.1},{sleep:.1},{study:.1},\
             {social:.1},{activity},{stress},{label}",
            id = i + 1,
            label = if positive { "True" } else { "False" },
        )
        .unwrap();
    }
    csv
}

/// Config pointing the relational source at a missing database so the CSV
/// fallback is exercised, with a compact search budget of 5 trials x 3 folds.
fn test_config(dir: &Path, csv_name: &str, model_subdir: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.data.db_path = dir.join("missing.db");
    config.data.csv_path = dir.join(csv_name);
    config.training.model_dir = dir.join(model_subdir);
    config.training.n_trials = 5;
    config.training.n_folds = 3;
    config.training.test_size = 0.2;
    config.training.seed = 42;
    config.training.scoring = Scoring::RocAuc;
    config.training.search = SearchSpace {
        n_estimators: vec![15, 30],
        max_depth: vec![Some(6), Some(10)],
        min_samples_split: vec![2, 5],
        min_samples_leaf: vec![1, 2],
        max_features: vec![MaxFeatures::Sqrt, MaxFeatures::Log2],
    };
    config
}

#[tokio::test]
async fn test_end_to_end_training_on_skewed_data() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("students.csv"), synthetic_csv(1000, 7)).unwrap();
    let config = test_config(dir.path(), "students.csv", "models");

    let report = run_training(&config, &NoopTracker).await.unwrap();

    assert_eq!(report.rows, 1000);
    assert!((report.positive_fraction - 0.1).abs() < 1e-9);
    assert_eq!(report.failed_trials, 0);

    // Both export files exist; no temp files are left behind.
    assert!(report.artifact_path.exists());
    assert!(report.metrics_path.exists());
    assert!(!report.artifact_path.with_extension("tmp").exists());

    // Class weighting must keep minority recall above zero on this skew.
    assert!(
        report.metrics.recall > 0.0,
        "minority recall collapsed to zero"
    );

    // Confusion counts sum exactly to the held-out partition size.
    assert_eq!(report.metrics.confusion.total(), 200);

    // The metrics file is a flat key-value mapping mirroring the summary.
    let metrics_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report.metrics_path).unwrap()).unwrap();
    assert_eq!(
        metrics_json["recall"].as_f64().unwrap(),
        report.metrics.recall
    );
    assert!(metrics_json["best_params.n_estimators"].is_number());
}

#[tokio::test]
async fn test_training_is_reproducible_for_a_fixed_seed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("students.csv"), synthetic_csv(600, 3)).unwrap();

    let config_a = test_config(dir.path(), "students.csv", "models-a");
    let config_b = test_config(dir.path(), "students.csv", "models-b");
    let report_a = run_training(&config_a, &NoopTracker).await.unwrap();
    let report_b = run_training(&config_b, &NoopTracker).await.unwrap();

    assert_eq!(report_a.best_config, report_b.best_config);
    assert!((report_a.best_cv_score - report_b.best_cv_score).abs() < 1e-9);
    assert!((report_a.metrics.roc_auc - report_b.metrics.roc_auc).abs() < 1e-9);
    assert_eq!(report_a.metrics.confusion, report_b.metrics.confusion);
}

#[tokio::test]
async fn test_exported_artifact_handles_extreme_inference_input() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("students.csv"), synthetic_csv(500, 11)).unwrap();
    let config = test_config(dir.path(), "students.csv", "models");
    let report = run_training(&config, &NoopTracker).await.unwrap();

    let pipeline = TrainedPipeline::load(&report.artifact_path).unwrap();
    let extreme = StudentRecord {
        age: 22.0,
        gender: "Female".to_string(),
        // A department never seen in training encodes to all-zero
        // indicators instead of erroring.
        department: "Astrology".to_string(),
        cgpa: 2.1,
        sleep_duration: 0.0,
        study_hours: 12.0,
        social_media_hours: 6.0,
        physical_activity: 0.0,
        stress_level: 10.0,
    };
    let prediction = pipeline.predict(&extreme).unwrap();
    let sum = prediction.probability_depression + prediction.probability_no_depression;
    assert!((sum - 1.0).abs() < 1e-9);
    assert!(["Depression", "No Depression"].contains(&prediction.label.as_str()));
}

#[tokio::test]
async fn test_local_tracker_receives_every_trial() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("students.csv"), synthetic_csv(400, 5)).unwrap();
    let config = test_config(dir.path(), "students.csv", "models");

    let tracker = LocalTracker::create(&dir.path().join("runs"), "e2e-run").unwrap();
    let report = run_training(&config, &tracker).await.unwrap();

    let trials = std::fs::read_to_string(tracker.run_dir().join("trials.jsonl")).unwrap();
    assert_eq!(trials.lines().count(), config.training.n_trials);
    assert!(tracker.run_dir().join("summary.json").exists());
    assert!(
        tracker
            .run_dir()
            .join(report.artifact_path.file_name().unwrap())
            .exists()
    );
}

#[tokio::test]
async fn test_training_aborts_without_any_data_source() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "missing.csv", "models");
    let err = run_training(&config, &NoopTracker).await.unwrap_err();
    assert!(matches!(err, campuswell_core::PipelineError::Config(_)));
    // All-or-nothing: no partial artifact was written.
    assert!(!config.training.artifact_path().exists());
}

#[tokio::test]
async fn test_training_rejects_schema_mismatch_before_fitting() {
    let dir = tempfile::tempdir().unwrap();
    // Dataset missing the Stress_Level column entirely.
    let mut csv = String::from("Student_ID,Age,Gender,Department,Depression\n");
    for i in 0..50 {
        writeln!(
            csv,
            "{},{},Male,Science,{}",
            i + 1,
            20 + i % 5,
            if i % 5 == 0 { "True" } else { "False" }
        )
        .unwrap();
    }
    std::fs::write(dir.path().join("students.csv"), csv).unwrap();
    let config = test_config(dir.path(), "students.csv", "models");

    let err = run_training(&config, &NoopTracker).await.unwrap_err();
    assert!(matches!(err, campuswell_core::PipelineError::Schema(_)));
    assert!(!config.training.artifact_path().exists());
}
