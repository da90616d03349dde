//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy regression tree construction driven by per-row gradients
//! and hessians, shared by both ensembles:
//!
//! - forest trees use `g = -y`, `h = 1` and no regularization, which makes
//!   the gain the variance reduction of the split and every leaf the mean
//!   target of its rows
//! - boosting rounds use `g = pred - y`, `h = 1` with L1 (`alpha`) and L2
//!   (`lambda`) regularization on the leaf weights
//!
//! Gain of a split: `0.5 * (S(GL, HL) + S(GR, HR) - S(G, H))` with
//! `S(G, H) = T(G)^2 / (H + lambda)` and `T` soft-thresholding by `alpha`.
//! Leaf value: `-T(G) / (H + lambda)`.

use agri_price_core::{FeatureVector, Node, Tree, FEATURE_COUNT};
use rand_chacha::ChaCha8Rng;

use crate::deterministic;
use crate::errors::{Result, TrainerError};

/// Splits whose gain is below this share of the parent score are rounding noise
const GAIN_TOLERANCE: f64 = 1e-12;

/// Training parameters for a single tree
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
    /// `None` grows until no admissible split remains
    pub max_depth: Option<usize>,
    /// Nodes with fewer rows are not split
    pub min_samples_split: usize,
    /// Minimum hessian sum on each side of a split
    pub min_child_weight: f64,
    pub alpha: f64,
    pub lambda: f64,
}

impl TreeConfig {
    /// Unregularized variance-reduction tree, as grown inside a random forest
    pub fn forest(max_depth: Option<usize>, min_samples_split: usize) -> Self {
        Self {
            max_depth,
            min_samples_split,
            min_child_weight: 0.0,
            alpha: 0.0,
            lambda: 0.0,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::forest(None, 2)
    }
}

/// Which features a node may split on
#[derive(Debug, Clone)]
pub enum FeatureSampler {
    /// Every feature at every node
    All,
    /// The same subset at every node of the tree
    Fixed(Vec<usize>),
    /// A fresh subset of `k` features at every node
    PerSplit { rng: ChaCha8Rng, k: usize },
}

impl FeatureSampler {
    fn candidates(&mut self, feature_count: usize) -> Vec<usize> {
        match self {
            FeatureSampler::All => (0..feature_count).collect(),
            FeatureSampler::Fixed(features) => features.clone(),
            FeatureSampler::PerSplit { rng, k } => {
                deterministic::sample_features(rng, feature_count, *k)
            }
        }
    }
}

/// A fitted tree plus the total gain contributed by each feature
#[derive(Debug, Clone)]
pub struct GrownTree {
    pub tree: Tree,
    pub gains: [f64; FEATURE_COUNT],
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Build a regression tree using the exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    rows: &'a [FeatureVector],
    gradients: &'a [f64],
    hessians: &'a [f64],
    config: TreeConfig,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        rows: &'a [FeatureVector],
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
    ) -> Result<Self> {
        if rows.len() != gradients.len() || rows.len() != hessians.len() {
            return Err(TrainerError::Training(format!(
                "{} rows, {} gradients, {} hessians",
                rows.len(),
                gradients.len(),
                hessians.len()
            )));
        }
        Ok(Self {
            rows,
            gradients,
            hessians,
            config,
        })
    }

    /// Grow a tree over `indices` (duplicates count as repeated rows)
    pub fn build(&self, indices: &[usize], sampler: &mut FeatureSampler, weight: f64) -> GrownTree {
        let mut nodes = Vec::new();
        let mut gains = [0.0; FEATURE_COUNT];
        if indices.is_empty() {
            nodes.push(Node::leaf(0, 0.0));
        } else {
            self.grow(indices, 0, sampler, &mut nodes, &mut gains);
        }
        GrownTree {
            tree: Tree::new(nodes, weight),
            gains,
        }
    }

    /// Recursively build tree nodes; children are always pushed after their parent
    fn grow(
        &self,
        indices: &[usize],
        depth: usize,
        sampler: &mut FeatureSampler,
        nodes: &mut Vec<Node>,
        gains: &mut [f64; FEATURE_COUNT],
    ) -> i32 {
        let id = nodes.len() as i32;
        let (g, h) = self.sums(indices);
        nodes.push(Node::leaf(id, self.leaf_value(g, h)));

        if !self.can_split(indices, depth) {
            return id;
        }

        let features = sampler.candidates(FEATURE_COUNT);
        let Some(split) = self.find_best_split(indices, &features, g, h) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.rows[i][split.feature] <= split.threshold);

        gains[split.feature] += split.gain;
        let left_id = self.grow(&left, depth + 1, sampler, nodes, gains);
        let right_id = self.grow(&right, depth + 1, sampler, nodes, gains);

        nodes[id as usize] = Node::internal(
            id,
            split.feature as i32,
            split.threshold,
            left_id,
            right_id,
        );
        id
    }

    fn can_split(&self, indices: &[usize], depth: usize) -> bool {
        if indices.len() < self.config.min_samples_split.max(2) {
            return false;
        }
        if self.config.max_depth.is_some_and(|max| depth >= max) {
            return false;
        }
        // Identical gradients: nothing left to separate
        let first = self.gradients[indices[0]];
        indices.iter().any(|&i| self.gradients[i] != first)
    }

    /// Best split over `features`, scanning thresholds between distinct sorted values.
    ///
    /// Features and thresholds are visited in ascending order and only a
    /// strictly larger gain replaces the incumbent, so ties resolve to the
    /// lowest feature index and threshold.
    fn find_best_split(
        &self,
        indices: &[usize],
        features: &[usize],
        g_total: f64,
        h_total: f64,
    ) -> Option<Split> {
        let parent = self.score(g_total, h_total);
        let tolerance = GAIN_TOLERANCE * parent.abs().max(1.0);
        let min_child = self.config.min_child_weight;

        let mut best: Option<Split> = None;
        let mut order = indices.to_vec();

        for &feature in features {
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let (mut g_left, mut h_left) = (0.0, 0.0);
            for pos in 0..order.len() - 1 {
                let i = order[pos];
                g_left += self.gradients[i];
                h_left += self.hessians[i];

                let value = self.rows[i][feature];
                let next = self.rows[order[pos + 1]][feature];
                if value == next {
                    continue;
                }

                let g_right = g_total - g_left;
                let h_right = h_total - h_left;
                if h_left < min_child || h_right < min_child {
                    continue;
                }

                let gain =
                    0.5 * (self.score(g_left, h_left) + self.score(g_right, h_right) - parent);
                if gain > tolerance && best.map_or(true, |b| gain > b.gain) {
                    let mut threshold = 0.5 * (value + next);
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Sum gradients and hessians for a set of rows
    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter().fold((0.0, 0.0), |(g, h), &i| {
            (g + self.gradients[i], h + self.hessians[i])
        })
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        let denom = h + self.config.lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        let t = soft_threshold(g, self.config.alpha);
        t * t / denom
    }

    /// Optimal leaf weight: `-T(G) / (H + lambda)`
    fn leaf_value(&self, g: f64, h: f64) -> f64 {
        let denom = h + self.config.lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        -soft_threshold(g, self.config.alpha) / denom
    }
}

/// L1 shrinkage of a gradient sum towards zero
pub fn soft_threshold(g: f64, alpha: f64) -> f64 {
    if g > alpha {
        g - alpha
    } else if g < -alpha {
        g + alpha
    } else {
        0.0
    }
}
