//! Bagging ensemble of regression trees

use super::tree::Tree;
use super::Regressor;
use serde::{Deserialize, Serialize};

/// Averaged forest of independently grown trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaggingModel {
    pub version: u32,
    pub trees: Vec<Tree>,
    pub feature_count: usize,
    /// Normalized impurity decrease per feature (sums to 1 unless no split was made)
    pub feature_importances: Vec<f64>,
    /// Fingerprint of the preprocessor whose features this model was fitted on
    pub preprocessor_fingerprint: String,
}

impl BaggingModel {
    pub fn new(
        trees: Vec<Tree>,
        feature_count: usize,
        feature_importances: Vec<f64>,
        preprocessor_fingerprint: String,
    ) -> Self {
        Self {
            version: super::MODEL_FORMAT_VERSION,
            trees,
            feature_count,
            feature_importances,
            preprocessor_fingerprint,
        }
    }

    /// Number of trees in the forest
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for BaggingModel {
    const NAME: &'static str = "random_forest";

    fn predict(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .trees
            .iter()
            .map(|t| t.weight * t.evaluate(features))
            .sum();
        sum / self.trees.len() as f64
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn trees(&self) -> &[Tree] {
        &self.trees
    }

    fn version(&self) -> u32 {
        self.version
    }
}
