//! Model trainer
//!
//! Splits a feature matrix into train and test rows, fits the scaler on the
//! train rows only, trains both ensembles and evaluates them on the held-out
//! rows.

use agri_price_core::{
    BaggingModel, BoostedModel, FeatureImportance, FeatureMatrix, FeatureVector, ModelMetrics,
    PriceArtifacts, Preprocessor, Regressor, StandardScaler, TrainingReport, FEATURE_COUNT,
    FEATURE_NAMES,
};
use tracing::info;

use crate::config::{BoostingConfig, ForestConfig, PipelineConfig, TrainingConfig};
use crate::deterministic;
use crate::errors::{Result, TrainerError};
use crate::forest::ForestTrainer;
use crate::gbdt::GbdtTrainer;

/// Fitted artifacts plus the scaled held-out rows they were evaluated on
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifacts: PriceArtifacts,
    pub test_rows: Vec<FeatureVector>,
    pub test_targets: Vec<f64>,
}

/// Row positions of a seeded train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitIndices {
    /// Shuffle `0..n` with `seed` and hold out `ceil(n * test_fraction)` rows,
    /// keeping at least one row on each side
    pub fn new(n: usize, test_fraction: f64, seed: u64) -> Self {
        let order = deterministic::shuffled_indices(n, seed);
        let n_test = if n < 2 {
            0
        } else {
            (((n as f64) * test_fraction).ceil() as usize).clamp(1, n - 1)
        };
        let (test, train) = order.split_at(n_test);
        Self {
            train: train.to_vec(),
            test: test.to_vec(),
        }
    }
}

pub struct ModelTrainer {
    training: TrainingConfig,
    forest: ForestConfig,
    boosting: BoostingConfig,
}

impl ModelTrainer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            training: config.training.clone(),
            forest: config.forest.clone(),
            boosting: config.boosting.clone(),
        }
    }

    /// Train both models on `matrix`
    pub fn train(&self, matrix: &FeatureMatrix) -> Result<TrainingOutcome> {
        matrix.validate()?;
        let n = matrix.len();
        if n < self.training.min_rows {
            return Err(TrainerError::InsufficientData {
                rows: n,
                required: self.training.min_rows,
            });
        }

        let seed = self.training.seed;
        let split = SplitIndices::new(n, self.training.test_fraction, seed);
        let pick_rows = |idx: &[usize]| idx.iter().map(|&i| matrix.rows[i]).collect::<Vec<_>>();
        let pick_targets = |idx: &[usize]| idx.iter().map(|&i| matrix.targets[i]).collect::<Vec<_>>();

        let scaler = StandardScaler::fit(&pick_rows(&split.train));
        let train_rows = scaler.transform_rows(&pick_rows(&split.train));
        let test_rows = scaler.transform_rows(&pick_rows(&split.test));
        let train_targets = pick_targets(&split.train);
        let test_targets = pick_targets(&split.test);

        info!(
            train = train_rows.len(),
            test = test_rows.len(),
            seed,
            "training bagging and boosted ensembles"
        );

        let forest = ForestTrainer::new(self.forest.clone(), seed);
        let gbdt = GbdtTrainer::new(self.boosting.clone());
        let (forest_fit, boost_fit) = rayon::join(
            || forest.fit(&train_rows, &train_targets),
            || gbdt.fit(&train_rows, &train_targets),
        );
        let (forest_fit, boost_fit) = (forest_fit?, boost_fit?);

        let preprocessor = Preprocessor::new(matrix.encoders.clone(), scaler);
        let fingerprint = preprocessor.fingerprint()?;

        let bagging = BaggingModel::new(
            forest_fit.trees,
            FEATURE_COUNT,
            forest_fit.importances,
            fingerprint.clone(),
        );
        let boosted = BoostedModel::new(
            boost_fit.base_score,
            boost_fit.trees,
            FEATURE_COUNT,
            boost_fit.importances,
            fingerprint,
        );

        let bagging_metrics = ModelMetrics::evaluate(&test_targets, &bagging.predict_rows(&test_rows));
        let boosted_metrics = ModelMetrics::evaluate(&test_targets, &boosted.predict_rows(&test_rows));
        log_metrics(BaggingModel::NAME, &bagging_metrics);
        log_metrics(BoostedModel::NAME, &boosted_metrics);

        let report = TrainingReport {
            trained_at: chrono::Utc::now().timestamp(),
            train_rows: train_rows.len(),
            test_rows: test_rows.len(),
            seed,
            bagging: bagging_metrics,
            boosted: boosted_metrics,
            importance: importance_table(
                &bagging.feature_importances,
                &boosted.feature_importances,
            ),
        };

        Ok(TrainingOutcome {
            artifacts: PriceArtifacts {
                bagging,
                boosted,
                preprocessor,
                report,
            },
            test_rows,
            test_targets,
        })
    }
}

/// Per-feature importances of both models, most important (bagging) first
pub fn importance_table(bagging: &[f64], boosted: &[f64]) -> Vec<FeatureImportance> {
    let mut table: Vec<FeatureImportance> = FEATURE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| FeatureImportance {
            feature: name.to_string(),
            bagging: bagging.get(i).copied().unwrap_or(0.0),
            boosted: boosted.get(i).copied().unwrap_or(0.0),
        })
        .collect();
    // stable: equal importances keep feature order
    table.sort_by(|a, b| b.bagging.total_cmp(&a.bagging));
    table
}

fn log_metrics(model: &str, metrics: &ModelMetrics) {
    info!(
        model,
        rmse = metrics.rmse,
        mae = metrics.mae,
        r2 = metrics.r2,
        "held-out evaluation"
    );
}
