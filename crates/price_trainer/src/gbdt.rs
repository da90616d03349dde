//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Squared-error boosting: every round fits a regularized tree to the
//! gradients `pred - y` (hessian 1) of the current ensemble and adds it
//! with the learning rate as its weight.

use agri_price_core::{FeatureVector, Tree, FEATURE_COUNT};
use tracing::debug;

use crate::cart::{CartBuilder, FeatureSampler, TreeConfig};
use crate::config::BoostingConfig;
use crate::errors::{Result, TrainerError};

/// Output of a boosting run
#[derive(Debug, Clone)]
pub struct BoostFit {
    pub base_score: f64,
    pub trees: Vec<Tree>,
    /// Total split gain per feature, normalized to sum to 1
    pub importances: Vec<f64>,
}

/// GBDT trainer
pub struct GbdtTrainer {
    config: BoostingConfig,
}

impl GbdtTrainer {
    pub fn new(config: BoostingConfig) -> Self {
        Self { config }
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: Some(self.config.max_depth),
            min_samples_split: 2,
            min_child_weight: self.config.min_child_weight,
            alpha: self.config.alpha,
            lambda: self.config.lambda,
        }
    }

    /// Train on scaled rows
    pub fn fit(&self, rows: &[FeatureVector], targets: &[f64]) -> Result<BoostFit> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(TrainerError::Training(format!(
                "cannot boost on {} rows with {} targets",
                rows.len(),
                targets.len()
            )));
        }

        // Initial prediction is the mean target
        let base_score = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut predictions = vec![base_score; rows.len()];
        let hessians = vec![1.0; rows.len()];
        let indices: Vec<usize> = (0..rows.len()).collect();

        let mut trees = Vec::with_capacity(self.config.n_rounds);
        let mut gains = [0.0; FEATURE_COUNT];

        for round in 0..self.config.n_rounds {
            let gradients: Vec<f64> = predictions
                .iter()
                .zip(targets.iter())
                .map(|(p, y)| p - y)
                .collect();

            let builder = CartBuilder::new(rows, &gradients, &hessians, self.tree_config())?;
            let grown = builder.build(&indices, &mut FeatureSampler::All, self.config.learning_rate);

            for (pred, row) in predictions.iter_mut().zip(rows.iter()) {
                *pred += grown.tree.weight * grown.tree.evaluate(row);
            }
            for (total, g) in gains.iter_mut().zip(grown.gains.iter()) {
                *total += g;
            }

            if round % 10 == 9 || round + 1 == self.config.n_rounds {
                debug!(
                    round = round + 1,
                    train_rmse = rmse(&predictions, targets),
                    "boosting progress"
                );
            }
            trees.push(grown.tree);
        }

        let total: f64 = gains.iter().sum();
        let importances = gains
            .iter()
            .map(|g| if total > 0.0 { g / total } else { 0.0 })
            .collect();

        Ok(BoostFit {
            base_score,
            trees,
            importances,
        })
    }
}

fn rmse(predictions: &[f64], targets: &[f64]) -> f64 {
    let ss: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, y)| (p - y).powi(2))
        .sum();
    (ss / targets.len().max(1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_price_core::features::MIN_PRICE;

    fn dataset() -> (Vec<FeatureVector>, Vec<f64>) {
        let rows: Vec<FeatureVector> = (0..20)
            .map(|i| {
                let mut row = [0.0; FEATURE_COUNT];
                row[MIN_PRICE] = i as f64;
                row
            })
            .collect();
        let targets = (0..20).map(|i| if i < 10 { 1000.0 } else { 2000.0 }).collect();
        (rows, targets)
    }

    fn predict(fit: &BoostFit, row: &FeatureVector) -> f64 {
        fit.base_score + fit.trees.iter().map(|t| t.weight * t.evaluate(row)).sum::<f64>()
    }

    #[test]
    fn test_base_score_is_target_mean() {
        let (rows, targets) = dataset();
        let config = BoostingConfig {
            n_rounds: 3,
            ..BoostingConfig::default()
        };
        let fit = GbdtTrainer::new(config).fit(&rows, &targets).unwrap();
        assert_eq!(fit.base_score, 1500.0);
        assert_eq!(fit.trees.len(), 3);
        assert!(fit.trees.iter().all(|t| t.weight == 0.1));
    }

    #[test]
    fn test_boosting_reduces_training_error() {
        let (rows, targets) = dataset();
        let few = GbdtTrainer::new(BoostingConfig {
            n_rounds: 5,
            ..BoostingConfig::default()
        })
        .fit(&rows, &targets)
        .unwrap();
        let many = GbdtTrainer::new(BoostingConfig::default())
            .fit(&rows, &targets)
            .unwrap();

        let err = |fit: &BoostFit| {
            let preds: Vec<f64> = rows.iter().map(|r| predict(fit, r)).collect();
            rmse(&preds, &targets)
        };
        assert!(err(&many) < err(&few));
        assert!(err(&many) < 10.0);
        assert!((predict(&many, &rows[0]) - 1000.0).abs() < 10.0);
        assert!((predict(&many, &rows[19]) - 2000.0).abs() < 10.0);
    }

    #[test]
    fn test_importance_goes_to_informative_feature() {
        let (rows, targets) = dataset();
        let fit = GbdtTrainer::new(BoostingConfig {
            n_rounds: 10,
            ..BoostingConfig::default()
        })
        .fit(&rows, &targets)
        .unwrap();
        assert_eq!(fit.importances[MIN_PRICE], 1.0);
    }

    #[test]
    fn test_constant_target_gives_flat_model() {
        let (rows, _) = dataset();
        let targets = vec![750.0; rows.len()];
        let fit = GbdtTrainer::new(BoostingConfig {
            n_rounds: 4,
            ..BoostingConfig::default()
        })
        .fit(&rows, &targets)
        .unwrap();
        assert!(fit.trees.iter().all(|t| t.nodes.len() == 1));
        assert_eq!(predict(&fit, &rows[3]), 750.0);
        assert!(fit.importances.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mismatched_input_is_rejected() {
        let (rows, _) = dataset();
        assert!(GbdtTrainer::new(BoostingConfig::default())
            .fit(&rows, &[1.0])
            .is_err());
    }
}
