use agri_price_core::CoreError;
use agri_price_registry::RegistryError;
use thiserror::Error;

/// Errors returned by the training pipeline.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("insufficient data: {rows} usable rows, at least {required} required")]
    InsufficientData { rows: usize, required: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("training error: {0}")]
    Training(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for TrainerError {
    fn from(err: csv::Error) -> Self {
        TrainerError::Dataset(err.to_string())
    }
}

/// Result type for trainer operations
pub type Result<T> = std::result::Result<T, TrainerError>;
