//! Persisted preprocessing state: encoders, scaler and feature layout

use crate::encoder::CategoryEncoders;
use crate::errors::{CoreError, Result};
use crate::features::{FEATURE_COUNT, FEATURE_NAMES};
use crate::scaler::StandardScaler;
use crate::serde_canon;
use serde::{Deserialize, Serialize};

/// Everything needed to turn a raw row into a scaled model input.
///
/// Encoders and scaler are fitted on one dataset and are only valid for
/// models trained on features produced by that same fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub encoders: CategoryEncoders,
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
}

impl Preprocessor {
    pub fn new(encoders: CategoryEncoders, scaler: StandardScaler) -> Self {
        Self {
            encoders,
            scaler,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Blake3 digest of the canonical JSON form; models store it to pin the
    /// preprocessor they were trained against.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(serde_canon::fingerprint(self)?)
    }

    /// Check the persisted layout still matches the compiled feature layout
    pub fn validate(&self) -> Result<()> {
        if !self.encoders.is_well_formed() {
            return Err(CoreError::ValidationFailed(
                "category encoders are malformed or from another format version".into(),
            ));
        }
        if self.feature_names.len() != FEATURE_COUNT
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .any(|(a, b)| a != b)
        {
            return Err(CoreError::ValidationFailed(format!(
                "feature layout mismatch: {:?}",
                self.feature_names
            )));
        }
        if self.scaler.scales.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(CoreError::ValidationFailed(
                "scaler contains a zero or non-finite scale".into(),
            ));
        }
        Ok(())
    }
}
