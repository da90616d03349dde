//! Core of the agricultural commodity price predictor
//!
//! Holds everything that training and inference must agree on, so that a
//! row scored at inference time goes through the same transformation as the
//! rows the models were fitted on.
//!
//! Modules:
//! - `record`: market observations and query rows
//! - `stats`: quantiles, medians and deviations over `f64` columns
//! - `encoder`: versioned label encoders for the categorical columns
//! - `features`: feature layout, calendar and rolling features, FeatureBuilder
//! - `scaler`: per-column standardization
//! - `ensemble`: regression trees, bagging and boosted ensembles
//! - `preprocessor`: persisted encoders + scaler with a fingerprint
//! - `report`: held-out metrics and feature importance
//! - `artifacts`: the bundle of fitted artifacts and their registry names
//! - `inference`: single-row scoring through the fitted artifacts

pub mod artifacts;
pub mod encoder;
pub mod ensemble;
pub mod errors;
pub mod features;
pub mod inference;
pub mod preprocessor;
pub mod record;
pub mod report;
pub mod scaler;
pub mod serde_canon;
pub mod stats;

pub use artifacts::{
    PriceArtifacts, ARTIFACT_NAMES, BAGGING_ARTIFACT, BOOSTED_ARTIFACT, PREPROCESSOR_ARTIFACT,
    REPORT_ARTIFACT,
};
pub use encoder::{CategoryEncoder, CategoryEncoders};
pub use ensemble::{BaggingModel, BoostedModel, Node, Regressor, Tree};
pub use errors::{CoreError, InferenceError};
pub use features::{FeatureBuilder, FeatureMatrix, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use inference::{InferenceAdapter, PricePrediction, UnseenCategoryPolicy};
pub use preprocessor::Preprocessor;
pub use record::{CategoricalField, QueryRow, Record};
pub use report::{FeatureImportance, ModelMetrics, TrainingReport};
pub use scaler::StandardScaler;
