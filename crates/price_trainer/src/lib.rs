//! Agri price trainer - cleaning, features and deterministic tree ensembles
//!
//! Turns a market price CSV into a fitted random forest and boosted-tree
//! model pair, evaluated on a seeded hold-out split and persisted through
//! the model registry.

pub mod cart;
pub mod cleaner;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod forest;
pub mod gbdt;
pub mod pipeline;
pub mod trainer;

pub use cleaner::{CleaningReport, DataCleaner};
pub use config::PipelineConfig;
pub use dataset::{load_csv, RawRecord, REQUIRED_COLUMNS};
pub use errors::{Result, TrainerError};
pub use forest::ForestTrainer;
pub use gbdt::GbdtTrainer;
pub use pipeline::{load_or_train, run_training, train_and_save, TrainingRun};
pub use trainer::{ModelTrainer, SplitIndices, TrainingOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
