//! Training-time evaluation results

use serde::{Deserialize, Serialize};

/// Held-out error metrics of one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl ModelMetrics {
    /// Compute RMSE, MAE and R² of `predicted` against `actual`.
    ///
    /// R² is reported as 0.0 when the actual values have no variance.
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self {
                rmse: 0.0,
                mae: 0.0,
                r2: 0.0,
            };
        }

        let (mut ss_res, mut abs_err) = (0.0, 0.0);
        for (a, p) in actual.iter().zip(predicted.iter()) {
            ss_res += (a - p).powi(2);
            abs_err += (a - p).abs();
        }
        let mean = actual[..n].iter().sum::<f64>() / n as f64;
        let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();

        Self {
            rmse: (ss_res / n as f64).sqrt(),
            mae: abs_err / n as f64,
            r2: if ss_tot == 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot },
        }
    }
}

/// Importance of one feature under both models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub bagging: f64,
    pub boosted: f64,
}

/// Everything reported at the end of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Unix timestamp (seconds) of the run
    pub trained_at: i64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub seed: u64,
    pub bagging: ModelMetrics,
    pub boosted: ModelMetrics,
    /// Sorted by bagging importance, most important first
    pub importance: Vec<FeatureImportance>,
}

impl TrainingReport {
    /// Top `n` features by bagging importance
    pub fn top_features(&self, n: usize) -> &[FeatureImportance] {
        &self.importance[..n.min(self.importance.len())]
    }
}
