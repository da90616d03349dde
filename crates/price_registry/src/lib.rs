//! Model registry for the price predictor
//!
//! Stores trained artifacts as opaque bincode blobs keyed by name, either in
//! a directory (with blake3 integrity digests) or in memory.

pub mod errors;
pub mod registry;
pub mod storage;

pub use errors::{RegistryError, Result};
pub use storage::ModelRegistry;
