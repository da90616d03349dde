//! Random forest (bagging) trainer
//!
//! Trees are independent, so they are grown in parallel with rayon. Tree `i`
//! draws its bootstrap sample and feature subset from its own seeded stream,
//! which keeps the forest identical for any thread count.

use agri_price_core::{FeatureVector, Tree, FEATURE_COUNT};
use rayon::prelude::*;
use tracing::debug;

use crate::cart::{CartBuilder, FeatureSampler, GrownTree, TreeConfig};
use crate::config::ForestConfig;
use crate::deterministic::{self, TREE_STREAM_BASE};
use crate::errors::{Result, TrainerError};

/// Trees and normalized impurity importances of a fitted forest
#[derive(Debug, Clone)]
pub struct ForestFit {
    pub trees: Vec<Tree>,
    pub importances: Vec<f64>,
}

pub struct ForestTrainer {
    config: ForestConfig,
    seed: u64,
}

impl ForestTrainer {
    pub fn new(config: ForestConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    /// Features drawn per tree (or per split)
    pub fn max_features(&self) -> usize {
        self.config
            .max_features
            .unwrap_or_else(|| deterministic::default_max_features(FEATURE_COUNT))
            .clamp(1, FEATURE_COUNT)
    }

    /// Fit the forest on scaled rows
    pub fn fit(&self, rows: &[FeatureVector], targets: &[f64]) -> Result<ForestFit> {
        if rows.is_empty() {
            return Err(TrainerError::Training("cannot fit a forest on zero rows".into()));
        }

        let gradients: Vec<f64> = targets.iter().map(|y| -y).collect();
        let hessians = vec![1.0; targets.len()];
        let tree_config = TreeConfig::forest(self.config.max_depth, self.config.min_samples_split);
        let builder = CartBuilder::new(rows, &gradients, &hessians, tree_config)?;

        let k = self.max_features();
        let grown: Vec<GrownTree> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = deterministic::stream_rng(self.seed, TREE_STREAM_BASE + i as u64);
                let indices = if self.config.bootstrap {
                    deterministic::bootstrap_indices(&mut rng, rows.len())
                } else {
                    (0..rows.len()).collect()
                };
                let mut sampler = if k >= FEATURE_COUNT {
                    FeatureSampler::All
                } else if self.config.per_split_sampling {
                    FeatureSampler::PerSplit { rng, k }
                } else {
                    FeatureSampler::Fixed(deterministic::sample_features(
                        &mut rng,
                        FEATURE_COUNT,
                        k,
                    ))
                };
                builder.build(&indices, &mut sampler, 1.0)
            })
            .collect();

        let importances = mean_normalized_importance(grown.iter().map(|g| &g.gains));
        let trees: Vec<Tree> = grown.into_iter().map(|g| g.tree).collect();

        debug!(
            trees = trees.len(),
            max_features = k,
            per_split = self.config.per_split_sampling,
            mean_leaves = trees.iter().map(Tree::leaf_count).sum::<usize>() as f64
                / trees.len().max(1) as f64,
            "fitted random forest"
        );

        Ok(ForestFit { trees, importances })
    }
}

/// Normalize each tree's gains, average across trees, then renormalize
fn mean_normalized_importance<'a, I>(per_tree: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a [f64; FEATURE_COUNT]>,
{
    let mut total = vec![0.0; FEATURE_COUNT];
    let mut trees = 0usize;
    for gains in per_tree {
        trees += 1;
        let sum: f64 = gains.iter().sum();
        if sum > 0.0 {
            for (t, g) in total.iter_mut().zip(gains.iter()) {
                *t += g / sum;
            }
        }
    }
    if trees == 0 {
        return total;
    }
    let sum: f64 = total.iter().sum();
    if sum > 0.0 {
        for t in total.iter_mut() {
            *t /= sum;
        }
    }
    total
}
