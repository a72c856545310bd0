//! The fixed classifier family: a random forest with balanced class
//! weighting.

pub mod forest;
pub mod tree;

pub use forest::{ForestConfig, MaxFeatures, RandomForest, balanced_sample_weights};
pub use tree::DecisionTree;
