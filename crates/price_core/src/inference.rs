//! Single-row inference
//!
//! [`InferenceAdapter`] replays the training-time feature derivation for one
//! [`QueryRow`] using the persisted encoders and scaler, then scores the row
//! with both models.

use crate::artifacts::PriceArtifacts;
use crate::ensemble::Regressor;
use crate::errors::InferenceError;
use crate::features::{self, FeatureVector};
use crate::record::{Categorical, CategoricalField, QueryRow};
use crate::report::TrainingReport;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What to do with a categorical value the encoders have never seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnseenCategoryPolicy {
    /// Fail with [`InferenceError::UnseenCategory`]
    #[default]
    Reject,
    /// Substitute the code of the field's most frequent training value
    Fallback,
}

/// Estimates of both models for one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    pub bagging: f64,
    pub boosted: f64,
}

/// Scores raw rows against one set of fitted artifacts
#[derive(Debug, Clone)]
pub struct InferenceAdapter {
    artifacts: PriceArtifacts,
    policy: UnseenCategoryPolicy,
}

impl InferenceAdapter {
    /// Wrap a validated artifact bundle.
    ///
    /// Fails if the models were not trained against the bundled preprocessor.
    pub fn new(
        artifacts: PriceArtifacts,
        policy: UnseenCategoryPolicy,
    ) -> Result<Self, InferenceError> {
        artifacts
            .validate()
            .map_err(|e| InferenceError::PredictionFailed(e.to_string()))?;
        Ok(Self { artifacts, policy })
    }

    pub fn artifacts(&self) -> &PriceArtifacts {
        &self.artifacts
    }

    /// Metrics recorded when the models were trained
    pub fn report(&self) -> &TrainingReport {
        &self.artifacts.report
    }

    /// Unscaled feature vector for a query row, using the fitted encoders.
    ///
    /// Categories are checked before the date and prices, so a row that is
    /// wrong in both ways reports [`InferenceError::UnseenCategory`].
    pub fn feature_vector(&self, row: &QueryRow) -> Result<FeatureVector, InferenceError> {
        let encoders = &self.artifacts.preprocessor.encoders;
        let mut codes = [0i64; 6];
        for field in CategoricalField::ALL {
            let value = row.category(field);
            codes[field.index()] = match (encoders.encode(field, value), self.policy) {
                (Some(code), _) => code,
                (None, UnseenCategoryPolicy::Fallback) => {
                    let code = encoders.get(field).fallback_code();
                    warn!(%field, value, code, "unseen category, using fallback code");
                    code
                }
                (None, UnseenCategoryPolicy::Reject) => {
                    return Err(InferenceError::UnseenCategory {
                        field: field.column_name().to_string(),
                        value: value.to_string(),
                    })
                }
            };
        }

        let date = row.parse_arrival_date().ok_or_else(|| {
            InferenceError::PredictionFailed(format!(
                "invalid arrival date {:?}",
                row.arrival_date
            ))
        })?;
        if !row.min_price.is_finite() || !row.max_price.is_finite() {
            return Err(InferenceError::PredictionFailed(format!(
                "prices must be finite (min {}, max {})",
                row.min_price, row.max_price
            )));
        }

        let (rolling_mean, rolling_std) =
            features::approximate_rolling(row.min_price, row.max_price);

        Ok(features::assemble(
            codes,
            date,
            row.min_price,
            row.max_price,
            rolling_mean,
            rolling_std,
        ))
    }

    /// Scaled feature vector, exactly as the models consume it
    pub fn scaled_features(&self, row: &QueryRow) -> Result<FeatureVector, InferenceError> {
        let raw = self.feature_vector(row)?;
        Ok(self.artifacts.preprocessor.scaler.transform(&raw))
    }

    /// Estimate the modal price with both models
    pub fn predict(&self, row: &QueryRow) -> Result<PricePrediction, InferenceError> {
        let scaled = self.scaled_features(row)?;
        let prediction = PricePrediction {
            bagging: self.artifacts.bagging.predict(&scaled),
            boosted: self.artifacts.boosted.predict(&scaled),
        };

        if !prediction.bagging.is_finite() || !prediction.boosted.is_finite() {
            return Err(InferenceError::PredictionFailed(format!(
                "non-finite estimate {prediction:?}"
            )));
        }

        debug!(
            commodity = %row.commodity,
            bagging = prediction.bagging,
            boosted = prediction.boosted,
            "scored query row"
        );
        Ok(prediction)
    }

    /// Estimates plus the stored training metrics, for display
    pub fn predict_with_report(
        &self,
        row: &QueryRow,
    ) -> Result<(PricePrediction, &TrainingReport), InferenceError> {
        Ok((self.predict(row)?, self.report()))
    }
}
