//! Pipeline configuration
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields the standard pipeline: IQR 1.5 cleaning, a rolling window of 3,
//! an 80/20 split seeded with 42, 100 forest trees and 100 boosting rounds.

use agri_price_core::features::DEFAULT_ROLLING_WINDOW;
use agri_price_core::record::ARRIVAL_DATE_FORMAT;
use agri_price_core::UnseenCategoryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{Result, TrainerError};

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub cleaning: CleaningConfig,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub forest: ForestConfig,
    pub boosting: BoostingConfig,
    pub inference: InferenceConfig,
    pub registry: RegistryConfig,
}

/// Outlier suppression and date parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Fences sit this many IQRs outside Q1 and Q3
    pub iqr_multiplier: f64,
    /// chrono format of the Arrival_Date column
    pub date_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Trailing window (rows) of the per-commodity rolling statistics
    pub rolling_window: usize,
}

/// Split and reproducibility settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Share of rows held out for evaluation, in (0, 1)
    pub test_fraction: f64,
    pub seed: u64,
    /// Fewer usable rows than this is an error
    pub min_rows: usize,
}

/// Bagging ensemble settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub min_samples_split: usize,
    /// `None` grows every tree until its leaves are pure or too small
    pub max_depth: Option<usize>,
    /// Features considered per tree (or per split); `None` means floor(sqrt(n))
    pub max_features: Option<usize>,
    /// Draw a fresh feature subset at every split instead of once per tree
    pub per_split_sampling: bool,
    /// Fit each tree on a bootstrap sample of the training rows
    pub bootstrap: bool,
}

/// Boosted ensemble settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// L1 regularization on leaf weights
    pub alpha: f64,
    /// L2 regularization on leaf weights
    pub lambda: f64,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InferenceConfig {
    pub unseen_category: UnseenCategoryPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory holding the artifact blobs
    pub model_dir: PathBuf,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            date_format: ARRIVAL_DATE_FORMAT.to_string(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_ROLLING_WINDOW,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            min_rows: 5,
        }
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            min_samples_split: 5,
            max_depth: None,
            max_features: None,
            per_split_sampling: false,
            bootstrap: true,
        }
    }
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.1,
            max_depth: 6,
            alpha: 1.0,
            lambda: 1.0,
            min_child_weight: 1.0,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
        }
    }
}

impl PipelineConfig {
    /// Read and validate a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainerError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| TrainerError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML, e.g. to print the effective configuration
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TrainerError::Config(format!("failed to render config: {e}")))
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> Result<()> {
        let c = &self.cleaning;
        if !(c.iqr_multiplier.is_finite() && c.iqr_multiplier >= 0.0) {
            return invalid(format!(
                "cleaning.iqr_multiplier must be a non-negative number, got {}",
                c.iqr_multiplier
            ));
        }
        if c.date_format.trim().is_empty() {
            return invalid("cleaning.date_format must not be empty");
        }

        if self.features.rolling_window == 0 {
            return invalid("features.rolling_window must be at least 1");
        }

        let t = &self.training;
        if !(t.test_fraction > 0.0 && t.test_fraction < 1.0) {
            return invalid(format!(
                "training.test_fraction must lie in (0, 1), got {}",
                t.test_fraction
            ));
        }
        if t.min_rows < 2 {
            return invalid("training.min_rows must be at least 2");
        }

        let f = &self.forest;
        if f.n_estimators == 0 {
            return invalid("forest.n_estimators must be at least 1");
        }
        if f.min_samples_split < 2 {
            return invalid("forest.min_samples_split must be at least 2");
        }
        if f.max_depth == Some(0) {
            return invalid("forest.max_depth must be at least 1 when set");
        }
        if f.max_features == Some(0) {
            return invalid("forest.max_features must be at least 1 when set");
        }

        let b = &self.boosting;
        if b.n_rounds == 0 {
            return invalid("boosting.n_rounds must be at least 1");
        }
        if !(b.learning_rate.is_finite() && b.learning_rate > 0.0) {
            return invalid(format!(
                "boosting.learning_rate must be positive, got {}",
                b.learning_rate
            ));
        }
        if b.max_depth == 0 {
            return invalid("boosting.max_depth must be at least 1");
        }
        for (name, value) in [
            ("alpha", b.alpha),
            ("lambda", b.lambda),
            ("min_child_weight", b.min_child_weight),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(format!(
                    "boosting.{name} must be a non-negative number, got {value}"
                ));
            }
        }

        if self.registry.model_dir.as_os_str().is_empty() {
            return invalid("registry.model_dir must not be empty");
        }
        Ok(())
    }
}

fn invalid<T>(msg: impl Into<String>) -> Result<T> {
    Err(TrainerError::Config(msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.cleaning.iqr_multiplier, 1.5);
        assert_eq!(config.cleaning.date_format, "%d-%m-%Y");
        assert_eq!(config.features.rolling_window, 3);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.forest.n_estimators, 100);
        assert_eq!(config.forest.min_samples_split, 5);
        assert_eq!(config.boosting.max_depth, 6);
        assert_eq!(config.boosting.learning_rate, 0.1);
        assert_eq!(config.inference.unseen_category, UnseenCategoryPolicy::Reject);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [forest]
            n_estimators = 10
            per_split_sampling = true

            [inference]
            unseen_category = "fallback"
            "#,
        )
        .unwrap();
        assert_eq!(config.forest.n_estimators, 10);
        assert!(config.forest.per_split_sampling);
        assert_eq!(config.forest.min_samples_split, 5);
        assert_eq!(config.boosting, BoostingConfig::default());
        assert_eq!(config.inference.unseen_category, UnseenCategoryPolicy::Fallback);
    }

    #[test]
    fn test_rejects_impossible_values() {
        for toml in [
            "[training]\ntest_fraction = 1.0",
            "[training]\ntest_fraction = 0.0",
            "[forest]\nn_estimators = 0",
            "[boosting]\nlambda = -1.0",
            "[boosting]\nlearning_rate = 0.0",
            "[features]\nrolling_window = 0",
            "[cleaning]\niqr_multiplier = -0.5",
        ] {
            let err = PipelineConfig::from_toml_str(toml).unwrap_err();
            assert!(matches!(err, TrainerError::Config(_)), "{toml}: {err}");
        }
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = PipelineConfig::default();
        config.forest.max_depth = Some(12);
        config.training.seed = 7;
        let text = config.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load("/nonexistent/agri-price.toml").unwrap_err();
        assert!(matches!(err, TrainerError::Config(_)));
    }
}
