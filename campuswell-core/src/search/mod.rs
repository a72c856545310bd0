//! Randomized hyperparameter search with stratified cross-validation.

use crate::data::{Dataset, StratifiedKFold};
use crate::error::PipelineError;
use crate::eval::Scoring;
use crate::model::forest::derive_seed;
use crate::model::{ForestConfig, MaxFeatures, RandomForest};
use crate::pipeline::FittedColumnTransform;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Hyperparameter candidate lists.
///
/// The space is a struct with a fixed field order rather than a name->values
/// map: sampling draws one candidate per field in declaration order, which
/// keeps the drawn configurations reproducible for a given seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpace {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: Vec<usize>,
    #[serde(default = "default_max_depth")]
    pub max_depth: Vec<Option<usize>>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: Vec<usize>,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: Vec<usize>,
    #[serde(default = "default_max_features")]
    pub max_features: Vec<MaxFeatures>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: default_max_features(),
        }
    }
}

fn default_n_estimators() -> Vec<usize> {
    vec![50, 100, 200, 300, 500]
}

fn default_max_depth() -> Vec<Option<usize>> {
    vec![Some(5), Some(10), Some(15), Some(20), None]
}

fn default_min_samples_split() -> Vec<usize> {
    vec![2, 5, 10, 20]
}

fn default_min_samples_leaf() -> Vec<usize> {
    vec![1, 2, 4, 8]
}

fn default_max_features() -> Vec<MaxFeatures> {
    vec![MaxFeatures::Sqrt, MaxFeatures::Log2, MaxFeatures::All]
}

impl SearchSpace {
    /// A degenerate space (any empty candidate list) is a configuration
    /// error, reported before the first trial runs.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let empty = [
            ("n_estimators", self.n_estimators.is_empty()),
            ("max_depth", self.max_depth.is_empty()),
            ("min_samples_split", self.min_samples_split.is_empty()),
            ("min_samples_leaf", self.min_samples_leaf.is_empty()),
            ("max_features", self.max_features.is_empty()),
        ];
        for (name, is_empty) in empty {
            if is_empty {
                return Err(PipelineError::config(format!(
                    "search space has no candidates for {name}"
                )));
            }
        }
        Ok(())
    }

    /// Draw one configuration. Fields are sampled in declaration order.
    fn sample(&self, rng: &mut StdRng) -> ForestConfig {
        ForestConfig {
            n_estimators: self.n_estimators[rng.gen_range(0..self.n_estimators.len())],
            max_depth: self.max_depth[rng.gen_range(0..self.max_depth.len())],
            min_samples_split: self.min_samples_split
                [rng.gen_range(0..self.min_samples_split.len())],
            min_samples_leaf: self.min_samples_leaf
                [rng.gen_range(0..self.min_samples_leaf.len())],
            max_features: self.max_features[rng.gen_range(0..self.max_features.len())],
        }
    }
}

/// Lifecycle state of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    Scored,
    Failed,
}

/// One evaluated hyperparameter configuration. Immutable once scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub number: usize,
    pub config: ForestConfig,
    pub fold_scores: Vec<f64>,
    pub mean_score: Option<f64>,
    pub status: TrialStatus,
    pub error: Option<String>,
}

/// Search result: the winning configuration plus the full trial history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best_config: ForestConfig,
    pub best_score: f64,
    pub best_trial: usize,
    pub trials: Vec<Trial>,
}

/// Randomized search over [`SearchSpace`] scored by stratified K-fold
/// cross-validation.
#[derive(Debug, Clone)]
pub struct RandomizedSearch {
    pub space: SearchSpace,
    pub n_trials: usize,
    pub n_folds: usize,
    pub scoring: Scoring,
    pub seed: u64,
}

impl RandomizedSearch {
    /// Run the search on the training partition.
    ///
    /// Fold assignment happens once, up front; configuration errors (empty
    /// candidate lists, unsatisfiable fold counts) surface before the first
    /// trial. A failing trial is recorded and excluded from selection; the
    /// search only aborts when every trial fails.
    pub fn run(&self, train: &Dataset) -> Result<SearchOutcome, PipelineError> {
        self.space.validate()?;
        if self.n_trials == 0 {
            return Err(PipelineError::config("n_trials must be positive"));
        }
        let folds = StratifiedKFold::new(self.n_folds, self.seed).split(train.labels())?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trials = Vec::with_capacity(self.n_trials);

        for number in 0..self.n_trials {
            let config = self.space.sample(&mut rng);
            tracing::debug!(trial = number, config = ?config, "evaluating trial");

            let trial = match self.cross_validate(&config, train, &folds, number) {
                Ok(fold_scores) => {
                    let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
                    tracing::info!(
                        trial = number,
                        mean_score = mean,
                        metric = self.scoring.name(),
                        "trial scored"
                    );
                    Trial {
                        number,
                        config,
                        fold_scores,
                        mean_score: Some(mean),
                        status: TrialStatus::Scored,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(trial = number, error = %e, "trial failed");
                    Trial {
                        number,
                        config,
                        fold_scores: Vec::new(),
                        mean_score: None,
                        status: TrialStatus::Failed,
                        error: Some(e.to_string()),
                    }
                }
            };
            trials.push(trial);
        }

        // Strictly-greater comparison in draw order: the earliest trial
        // wins ties.
        let mut best: Option<(usize, f64)> = None;
        for trial in &trials {
            if let Some(score) = trial.mean_score {
                if best.is_none_or(|(_, s)| score > s) {
                    best = Some((trial.number, score));
                }
            }
        }

        match best {
            Some((best_trial, best_score)) => Ok(SearchOutcome {
                best_config: trials[best_trial].config.clone(),
                best_score,
                best_trial,
                trials,
            }),
            None => {
                let last_error = trials
                    .iter()
                    .rev()
                    .find_map(|t| t.error.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                Err(PipelineError::search(format!(
                    "every trial failed; last error: {last_error}"
                )))
            }
        }
    }

    /// Score one configuration: fit preprocessing + forest on each fold's
    /// training rows, score its validation rows. The transform is refit per
    /// fold so no statistic leaks across the fold boundary.
    fn cross_validate(
        &self,
        config: &ForestConfig,
        train: &Dataset,
        folds: &[crate::data::FoldIndices],
        trial: usize,
    ) -> Result<Vec<f64>, PipelineError> {
        folds
            .iter()
            .enumerate()
            .map(|(fold_no, fold)| {
                let fit_part = train.subset(&fold.train);
                let val_part = train.subset(&fold.validation);

                let transform = FittedColumnTransform::fit(&fit_part);
                let x_fit = transform.transform(&fit_part)?;
                let fit_seed = derive_seed(self.seed, (trial as u64) << 8 | fold_no as u64);
                let forest = RandomForest::fit(config, &x_fit, fit_part.labels(), fit_seed)?;

                let x_val = transform.transform(&val_part)?;
                let proba = forest.predict_proba(&x_val);
                let y_prob: Vec<f64> = proba.iter().map(|p| p[1]).collect();
                let y_pred: Vec<bool> = proba.iter().map(|p| p[1] > p[0]).collect();
                self.scoring.score(val_part.labels(), &y_pred, &y_prob)
            })
            .collect()
    }
}
