//! End-to-end orchestration: clean, build features, train, persist

use agri_price_core::{FeatureBuilder, FeatureMatrix, PriceArtifacts, QueryRow, Record};
use agri_price_registry::ModelRegistry;
use std::path::Path;
use tracing::{info, warn};

use crate::cleaner::{CleaningReport, DataCleaner};
use crate::config::PipelineConfig;
use crate::dataset::{self, RawRecord};
use crate::errors::{Result, TrainerError};
use crate::trainer::{ModelTrainer, TrainingOutcome};

/// Human-readable copy of the training report written next to the blobs
pub const REPORT_JSON_FILE: &str = "training_report.json";

/// Everything produced by one training run
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub cleaning: CleaningReport,
    pub outcome: TrainingOutcome,
}

impl TrainingRun {
    pub fn artifacts(&self) -> &PriceArtifacts {
        &self.outcome.artifacts
    }
}

/// Feature matrix for cleaned records; `reference` rows only contribute
/// categorical values to the encoders
pub fn build_features(
    records: &[Record],
    reference: &[QueryRow],
    config: &PipelineConfig,
) -> FeatureMatrix {
    FeatureBuilder::new(config.features.rolling_window)
        .with_reference_rows(reference.to_vec())
        .build(records)
}

/// Clean `raw`, build features and train both models in memory
pub fn run_training(
    raw: &[RawRecord],
    reference: &[QueryRow],
    config: &PipelineConfig,
) -> Result<TrainingRun> {
    config.validate()?;

    let (records, cleaning) = DataCleaner::new(&config.cleaning).clean(raw);
    if records.len() < config.training.min_rows {
        return Err(TrainerError::InsufficientData {
            rows: records.len(),
            required: config.training.min_rows,
        });
    }

    let matrix = build_features(&records, reference, config);
    let outcome = ModelTrainer::new(config).train(&matrix)?;
    Ok(TrainingRun { cleaning, outcome })
}

/// Train and store every artifact in `registry`
pub fn train_and_save(
    raw: &[RawRecord],
    reference: &[QueryRow],
    config: &PipelineConfig,
    registry: &ModelRegistry,
) -> Result<TrainingRun> {
    let run = run_training(raw, reference, config)?;
    registry.save_artifacts(run.artifacts())?;

    if let Some(root) = registry.root() {
        let json = serde_json::to_string_pretty(&run.artifacts().report)
            .map_err(|e| TrainerError::Training(format!("failed to render report: {e}")))?;
        std::fs::write(root.join(REPORT_JSON_FILE), json)?;
    }
    Ok(run)
}

/// Load the stored artifacts, training first if any are missing, corrupted
/// or left from different runs.
///
/// Without `training_csv` the registry error is returned as is.
pub fn load_or_train(
    registry: &ModelRegistry,
    config: &PipelineConfig,
    training_csv: Option<&Path>,
    reference: &[QueryRow],
) -> Result<PriceArtifacts> {
    match registry.load_artifacts() {
        Ok(artifacts) => Ok(artifacts),
        Err(e) if e.is_recoverable() => {
            let Some(path) = training_csv else {
                return Err(e.into());
            };
            warn!("{e}; training from {}", path.display());
            let raw = dataset::load_csv(path)?;
            let run = train_and_save(&raw, reference, config, registry)?;
            info!(
                rows = run.cleaning.output_rows,
                "trained replacement artifacts"
            );
            Ok(run.outcome.artifacts)
        }
        Err(e) => Err(e.into()),
    }
}
