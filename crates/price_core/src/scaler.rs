//! Per-column standardization (zero mean, unit variance)

use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::stats;
use serde::{Deserialize, Serialize};

/// Standard scaler fitted on the training split only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: [f64; FEATURE_COUNT],
    /// Population standard deviations; 1.0 for constant columns
    pub scales: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Fit column means and deviations
    pub fn fit(rows: &[FeatureVector]) -> Self {
        let mut means = [0.0; FEATURE_COUNT];
        let mut scales = [1.0; FEATURE_COUNT];

        if rows.is_empty() {
            return Self { means, scales };
        }

        for col in 0..FEATURE_COUNT {
            let column: Vec<f64> = rows.iter().map(|r| r[col]).collect();
            let mean = column.iter().sum::<f64>() / column.len() as f64;
            let std = stats::population_std(&column, mean);
            means[col] = mean;
            scales[col] = if std > f64::EPSILON * mean.abs().max(1.0) {
                std
            } else {
                1.0
            };
        }

        Self { means, scales }
    }

    /// Scale a single row
    pub fn transform(&self, row: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        for (col, value) in out.iter_mut().enumerate() {
            *value = (row[col] - self.means[col]) / self.scales[col];
        }
        out
    }

    /// Scale many rows
    pub fn transform_rows(&self, rows: &[FeatureVector]) -> Vec<FeatureVector> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
