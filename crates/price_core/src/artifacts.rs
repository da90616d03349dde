//! The bundle of fitted artifacts produced by one training run

use crate::ensemble::{BaggingModel, BoostedModel, Regressor};
use crate::errors::{CoreError, Result};
use crate::preprocessor::Preprocessor;
use crate::report::TrainingReport;
use serde::{Deserialize, Serialize};

/// Registry name of the bagging model
pub const BAGGING_ARTIFACT: &str = "random_forest_model";
/// Registry name of the boosted model
pub const BOOSTED_ARTIFACT: &str = "xgboost_model";
/// Registry name of the encoders + scaler
pub const PREPROCESSOR_ARTIFACT: &str = "preprocessor";
/// Registry name of the training metrics
pub const REPORT_ARTIFACT: &str = "training_report";

/// All artifact names
pub const ARTIFACT_NAMES: [&str; 4] = [
    BAGGING_ARTIFACT,
    BOOSTED_ARTIFACT,
    PREPROCESSOR_ARTIFACT,
    REPORT_ARTIFACT,
];

/// Models, preprocessing state and metrics that must travel together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceArtifacts {
    pub bagging: BaggingModel,
    pub boosted: BoostedModel,
    pub preprocessor: Preprocessor,
    pub report: TrainingReport,
}

impl PriceArtifacts {
    /// Validate every component and check both models were trained against
    /// this exact preprocessor.
    pub fn validate(&self) -> Result<()> {
        self.preprocessor.validate()?;
        self.bagging
            .validate()
            .map_err(CoreError::ValidationFailed)?;
        self.boosted
            .validate()
            .map_err(CoreError::ValidationFailed)?;

        let fingerprint = self.preprocessor.fingerprint()?;
        for (name, pinned) in [
            (BaggingModel::NAME, &self.bagging.preprocessor_fingerprint),
            (BoostedModel::NAME, &self.boosted.preprocessor_fingerprint),
        ] {
            if *pinned != fingerprint {
                return Err(CoreError::ValidationFailed(format!(
                    "{name} model was trained with preprocessor {pinned}, found {fingerprint}"
                )));
            }
        }
        Ok(())
    }
}
