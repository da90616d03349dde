//! Gradient boosted regression trees

use super::tree::Tree;
use super::Regressor;
use serde::{Deserialize, Serialize};

/// Additive ensemble: `base_score + Σ weight · leaf`
///
/// Each tree's `weight` carries the learning rate it was shrunk by.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoostedModel {
    pub version: u32,
    pub base_score: f64,
    pub trees: Vec<Tree>,
    pub feature_count: usize,
    /// Normalized total split gain per feature
    pub feature_importances: Vec<f64>,
    /// Fingerprint of the preprocessor whose features this model was fitted on
    pub preprocessor_fingerprint: String,
}

impl BoostedModel {
    pub fn new(
        base_score: f64,
        trees: Vec<Tree>,
        feature_count: usize,
        feature_importances: Vec<f64>,
        preprocessor_fingerprint: String,
    ) -> Self {
        Self {
            version: super::MODEL_FORMAT_VERSION,
            base_score,
            trees,
            feature_count,
            feature_importances,
            preprocessor_fingerprint,
        }
    }

    /// Number of boosting rounds kept in the model
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for BoostedModel {
    const NAME: &'static str = "xgboost";

    fn predict(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, t| acc + t.weight * t.evaluate(features))
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
