//! Categorical-to-indicator expansion.

use serde::{Deserialize, Serialize};

/// One-hot encoder for a single categorical column.
///
/// Categories are the distinct values observed in the training partition,
/// sorted lexicographically so the expanded column order is reproducible
/// across process restarts. A value unseen during training encodes to the
/// all-zero vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit(values: &[String]) -> Self {
        let mut categories: Vec<String> = values.to_vec();
        categories.sort_unstable();
        categories.dedup();
        Self { categories }
    }

    /// Number of indicator columns this encoder produces.
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Append the indicator columns for `value` to `out`.
    pub fn encode_into(&self, value: &str, out: &mut Vec<f64>) {
        let hit = self.categories.binary_search_by(|c| c.as_str().cmp(value)).ok();
        for i in 0..self.categories.len() {
            out.push(if hit == Some(i) { 1.0 } else { 0.0 });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_sorts_and_dedups_categories() {
        let encoder = OneHotEncoder::fit(&strings(&["Male", "Female", "Male", "Other"]));
        assert_eq!(encoder.categories, strings(&["Female", "Male", "Other"]));
        assert_eq!(encoder.width(), 3);
    }

    #[test]
    fn test_encode_known_category() {
        let encoder = OneHotEncoder::fit(&strings(&["Male", "Female"]));
        let mut out = Vec::new();
        encoder.encode_into("Male", &mut out);
        assert_eq!(out, vec![0.0, 1.0]);
    }

    #[test]
    fn test_unseen_category_encodes_to_all_zero() {
        let encoder = OneHotEncoder::fit(&strings(&["Male", "Female"]));
        let mut out = Vec::new();
        encoder.encode_into("Nonbinary", &mut out);
        assert_eq!(out, vec![0.0, 0.0]);
    }
}
