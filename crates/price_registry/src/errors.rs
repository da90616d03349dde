//! Error types for the model registry

use thiserror::Error;

/// Errors that can occur while storing or loading artifacts
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No artifact is stored under this name; callers should train first
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Stored bytes do not match their recorded digest
    #[error("Artifact corrupted: {name} (expected {expected}, found {actual})")]
    ArtifactCorrupted {
        name: String,
        expected: String,
        actual: String,
    },

    /// Artifact names are limited to ASCII letters, digits, `_` and `-`
    #[error("Invalid artifact name: {0:?}")]
    InvalidName(String),

    /// Loaded artifacts failed validation
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl RegistryError {
    /// True when the stored bundle is missing, damaged or inconsistent, so
    /// training a fresh one replaces it. A save interrupted halfway leaves
    /// blobs from two runs whose fingerprints disagree.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RegistryError::ArtifactNotFound(_)
                | RegistryError::ArtifactCorrupted { .. }
                | RegistryError::InvalidArtifact(_)
                | RegistryError::Serialization(_)
        )
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
