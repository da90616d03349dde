//! Saving and loading the full artifact bundle

use crate::errors::{RegistryError, Result};
use crate::storage::ModelRegistry;
use agri_price_core::{
    BaggingModel, BoostedModel, PriceArtifacts, Preprocessor, TrainingReport, ARTIFACT_NAMES,
    BAGGING_ARTIFACT, BOOSTED_ARTIFACT, PREPROCESSOR_ARTIFACT, REPORT_ARTIFACT,
};
use tracing::info;

impl ModelRegistry {
    /// Persist every artifact of a training run under its stable name
    pub fn save_artifacts(&self, artifacts: &PriceArtifacts) -> Result<()> {
        self.save(PREPROCESSOR_ARTIFACT, &artifacts.preprocessor)?;
        self.save(BAGGING_ARTIFACT, &artifacts.bagging)?;
        self.save(BOOSTED_ARTIFACT, &artifacts.boosted)?;
        self.save(REPORT_ARTIFACT, &artifacts.report)?;
        info!(
            bagging_trees = artifacts.bagging.num_trees(),
            boosted_trees = artifacts.boosted.num_trees(),
            "saved price model artifacts"
        );
        Ok(())
    }

    /// Load and validate the artifact bundle.
    ///
    /// Fails with [`RegistryError::ArtifactNotFound`] naming the first missing
    /// artifact, which callers treat as "train first".
    pub fn load_artifacts(&self) -> Result<PriceArtifacts> {
        let preprocessor: Preprocessor = self.load(PREPROCESSOR_ARTIFACT)?;
        let bagging: BaggingModel = self.load(BAGGING_ARTIFACT)?;
        let boosted: BoostedModel = self.load(BOOSTED_ARTIFACT)?;
        let report: TrainingReport = self.load(REPORT_ARTIFACT)?;

        let artifacts = PriceArtifacts {
            bagging,
            boosted,
            preprocessor,
            report,
        };
        artifacts
            .validate()
            .map_err(|e| RegistryError::InvalidArtifact(e.to_string()))?;
        Ok(artifacts)
    }

    /// Whether a complete bundle is present
    pub fn has_artifacts(&self) -> bool {
        ARTIFACT_NAMES.iter().all(|name| self.exists(name))
    }
}
