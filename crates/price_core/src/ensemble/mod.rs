//! Tree ensembles used for price regression
//!
//! Two independent models are trained on the same scaled features:
//!
//! - [`BaggingModel`]: a random forest; the prediction is the mean leaf value
//!   over all trees
//! - [`BoostedModel`]: gradient boosted trees; the prediction is a base score
//!   plus the shrunk leaf value of every round
//!
//! Both share the flat-arena [`Tree`] representation. Traversal sends a row
//! left when `feature <= threshold`.

pub mod boosted;
pub mod forest;
pub mod tree;

pub use boosted::BoostedModel;
pub use forest::BaggingModel;
pub use tree::{Node, Tree};

/// Serialized model layout version
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Common surface of the fitted ensembles
pub trait Regressor {
    /// Stable short name used in reports
    const NAME: &'static str;

    /// Predict one (already scaled) feature row
    fn predict(&self, features: &[f64]) -> f64;

    fn feature_count(&self) -> usize;

    fn trees(&self) -> &[Tree];

    fn version(&self) -> u32;

    /// Predict many rows
    fn predict_rows<R: AsRef<[f64]>>(&self, rows: &[R]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r.as_ref())).collect()
    }

    /// Structural validation after deserialization
    fn validate(&self) -> Result<(), String> {
        if self.version() != MODEL_FORMAT_VERSION {
            return Err(format!("Unsupported model version: {}", self.version()));
        }
        if self.trees().is_empty() {
            return Err(format!("{} model has no trees", Self::NAME));
        }
        for (i, tree) in self.trees().iter().enumerate() {
            tree.validate(self.feature_count())
                .map_err(|e| format!("Tree {i} validation failed: {e}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn stump(feature: i32, threshold: f64, left: f64, right: f64, weight: f64) -> Tree {
        Tree::new(
            vec![
                Node::internal(0, feature, threshold, 1, 2),
                Node::leaf(1, left),
                Node::leaf(2, right),
            ],
            weight,
        )
    }

    #[test]
    fn test_models_disagree_on_aggregation() {
        let trees = vec![stump(0, 0.0, 1.0, 3.0, 1.0), stump(1, 0.0, 1.0, 3.0, 1.0)];
        let forest = BaggingModel::new(trees.clone(), 2, vec![0.5, 0.5], String::new());
        let boosted = BoostedModel::new(0.0, trees, 2, vec![0.5, 0.5], String::new());

        let row = [1.0, -1.0];
        assert_eq!(forest.predict(&row), 2.0);
        assert_eq!(boosted.predict(&row), 4.0);
    }

    #[test]
    fn test_predict_rows_matches_predict() {
        let forest = BaggingModel::new(
            vec![stump(0, 0.0, -1.0, 1.0, 1.0)],
            1,
            vec![1.0],
            String::new(),
        );
        let rows = vec![[-2.0], [2.0]];
        assert_eq!(forest.predict_rows(&rows), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_validate_rejects_out_of_range_feature() {
        let forest = BaggingModel::new(
            vec![stump(3, 0.0, -1.0, 1.0, 1.0)],
            2,
            vec![0.0, 0.0],
            String::new(),
        );
        assert!(forest.validate().is_err());
    }
}
