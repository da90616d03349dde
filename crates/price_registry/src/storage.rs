//! Blob storage backends for the model registry

use crate::errors::{RegistryError, Result};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BLOB_EXTENSION: &str = "bin";
const HASH_EXTENSION: &str = "hash";

/// Named, opaque artifact storage.
///
/// With a directory, each blob is written to `<dir>/<name>.bin` next to a
/// `<name>.hash` file holding its blake3 digest; the directory is created on
/// first save. Without one, blobs live in an in-memory map.
pub struct ModelRegistry {
    root: Option<PathBuf>,
    cache: RwLock<HashMap<String, Vec<u8>>>,
}

impl ModelRegistry {
    /// Registry backed by a directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            root: Some(dir.as_ref().to_path_buf()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Registry that keeps everything in memory
    pub fn in_memory() -> Self {
        Self {
            root: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Backing directory, if any
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Store raw bytes under `name`, replacing any previous blob
    pub fn save_blob(&self, name: &str, data: &[u8]) -> Result<()> {
        validate_name(name)?;
        let digest = digest_hex(data);

        if let Some(ref root) = self.root {
            fs::create_dir_all(root)?;
            fs::write(blob_path(root, name), data)?;
            fs::write(hash_path(root, name), &digest)?;
            info!(
                artifact = name,
                bytes = data.len(),
                digest = %digest,
                "saved artifact to {}",
                root.display()
            );
        } else {
            self.cache.write().insert(name.to_string(), data.to_vec());
            debug!(artifact = name, bytes = data.len(), "cached artifact in memory");
        }

        Ok(())
    }

    /// Load the raw bytes stored under `name`
    pub fn load_blob(&self, name: &str) -> Result<Vec<u8>> {
        validate_name(name)?;

        let Some(ref root) = self.root else {
            return self
                .cache
                .read()
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::ArtifactNotFound(name.to_string()));
        };

        let data = match fs::read(blob_path(root, name)) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RegistryError::ArtifactNotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        match fs::read_to_string(hash_path(root, name)) {
            Ok(expected) => {
                let expected = expected.trim().to_string();
                let actual = digest_hex(&data);
                if expected != actual {
                    return Err(RegistryError::ArtifactCorrupted {
                        name: name.to_string(),
                        expected,
                        actual,
                    });
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(artifact = name, "no digest recorded, skipping integrity check");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(data)
    }

    /// Whether a blob is stored under `name`
    pub fn exists(&self, name: &str) -> bool {
        if validate_name(name).is_err() {
            return false;
        }
        match self.root {
            Some(ref root) => blob_path(root, name).is_file(),
            None => self.cache.read().contains_key(name),
        }
    }

    /// Remove a blob and its digest; missing artifacts are not an error
    pub fn remove(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        match self.root {
            Some(ref root) => {
                for path in [blob_path(root, name), hash_path(root, name)] {
                    match fs::remove_file(path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            None => {
                self.cache.write().remove(name);
            }
        }
        Ok(())
    }

    /// Names of all stored blobs, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = match self.root {
            Some(ref root) => {
                let entries = match fs::read_dir(root) {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                    Err(e) => return Err(e.into()),
                };
                let mut names = Vec::new();
                for entry in entries {
                    let path = entry?.path();
                    if path.extension().is_some_and(|ext| ext == BLOB_EXTENSION) {
                        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                            names.push(stem.to_string());
                        }
                    }
                }
                names
            }
            None => self.cache.read().keys().cloned().collect(),
        };
        names.sort();
        Ok(names)
    }

    /// Serialize `value` with bincode and store it under `name`
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let data = bincode::serialize(value)?;
        self.save_blob(name, &data)
    }

    /// Load and deserialize the artifact stored under `name`
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let data = self.load_blob(name)?;
        Ok(bincode::deserialize(&data)?)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(name.to_string()))
    }
}

fn blob_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.{BLOB_EXTENSION}"))
}

fn hash_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.{HASH_EXTENSION}"))
}

fn digest_hex(data: &[u8]) -> String {
    hex::encode(blake3::hash(data).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_created_on_demand() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("models").join("nested");
        let registry = ModelRegistry::open(&dir);
        assert!(!dir.exists());

        registry.save_blob("blob", b"payload").unwrap();
        assert!(dir.join("blob.bin").is_file());
        assert!(dir.join("blob.hash").is_file());
        assert_eq!(registry.load_blob("blob").unwrap(), b"payload");
    }

    #[test]
    fn test_missing_artifact_is_not_found() {
        let temp = TempDir::new().unwrap();
        for registry in [ModelRegistry::open(temp.path()), ModelRegistry::in_memory()] {
            let err = registry.load_blob("absent").unwrap_err();
            assert!(matches!(err, RegistryError::ArtifactNotFound(_)));
            assert!(err.is_recoverable());
            assert!(!registry.exists("absent"));
        }
    }

    #[test]
    fn test_tampered_blob_is_detected() {
        let temp = TempDir::new().unwrap();
        let registry = ModelRegistry::open(temp.path());
        registry.save_blob("model", b"original").unwrap();
        fs::write(temp.path().join("model.bin"), b"tampered").unwrap();

        let err = registry.load_blob("model").unwrap_err();
        assert!(matches!(err, RegistryError::ArtifactCorrupted { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let registry = ModelRegistry::in_memory();
        for name in ["", "../escape", "a b", "dir/name"] {
            let err = registry.save_blob(name, b"x").unwrap_err();
            assert!(matches!(err, RegistryError::InvalidName(_)));
            assert!(!err.is_recoverable());
        }
    }

    #[test]
    fn test_list_and_remove() {
        let temp = TempDir::new().unwrap();
        let registry = ModelRegistry::open(temp.path());
        registry.save("b_model", &vec![1.5f64, 2.5]).unwrap();
        registry.save("a_model", &7u32).unwrap();
        assert_eq!(registry.list().unwrap(), vec!["a_model", "b_model"]);

        registry.remove("a_model").unwrap();
        registry.remove("a_model").unwrap();
        assert_eq!(registry.list().unwrap(), vec!["b_model"]);
        let values: Vec<f64> = registry.load("b_model").unwrap();
        assert_eq!(values, vec![1.5, 2.5]);
    }

    #[test]
    fn test_in_memory_roundtrip() {
        let registry = ModelRegistry::in_memory();
        registry.save("scaler", &(1.25f64, -3.0f64)).unwrap();
        let loaded: (f64, f64) = registry.load("scaler").unwrap();
        assert_eq!(loaded, (1.25, -3.0));
        assert!(registry.root().is_none());
    }
}
