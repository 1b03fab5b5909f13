use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::ngram::NGramType;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Model state not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// Directory of persisted classifier-unit states.
///
/// Every blob is written next to a `.sha256` file holding its digest, which is
/// checked again when the blob is read back.
#[derive(Debug, Clone)]
pub struct ModelStore {
    models_dir: PathBuf,
}

impl ModelStore {
    /// Creates a new ModelStore with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_store_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_store_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("TEXTCLASSIFIER_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("textclassifier").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("textclassifier").join("models");
        }

        env::temp_dir().join("textclassifier").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self { models_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.models_dir
    }

    /// File name of a unit's state: the characteristic name with path-hostile
    /// characters replaced, followed by the n-gram type.
    pub fn unit_file_name(characteristic: &str, ngram_type: NGramType) -> String {
        let name: String = characteristic
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}_{}.model", name, ngram_type)
    }

    pub fn unit_path(&self, characteristic: &str, ngram_type: NGramType) -> PathBuf {
        self.models_dir
            .join(Self::unit_file_name(characteristic, ngram_type))
    }

    fn checksum_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".sha256");
        PathBuf::from(name)
    }

    fn digest(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    pub fn write_blob(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        log::debug!("Writing {} bytes to {:?}", bytes.len(), path);
        fs::write(path, bytes)?;
        fs::write(Self::checksum_path(path), Self::digest(bytes))?;
        Ok(())
    }

    /// Reads a blob, verifying its digest when a checksum file exists.
    pub fn read_blob(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let checksum_path = Self::checksum_path(path);
        if checksum_path.exists() {
            let expected = fs::read_to_string(&checksum_path)?.trim().to_string();
            let actual = Self::digest(&bytes);
            if expected != actual {
                log::error!("Hash mismatch for {:?}: expected {}, got {}", path, expected, actual);
                return Err(StoreError::HashMismatch {
                    path: path.to_path_buf(),
                    expected,
                    actual,
                });
            }
        } else {
            log::warn!("No checksum for {:?}, loading unverified", path);
        }
        Ok(bytes)
    }

    /// True when the blob exists and matches its recorded digest.
    pub fn verify(&self, path: &Path) -> Result<bool, StoreError> {
        if !path.exists() || !Self::checksum_path(path).exists() {
            return Ok(false);
        }
        match self.read_blob(path) {
            Ok(_) => Ok(true),
            Err(StoreError::HashMismatch { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn remove(&self, path: &Path) -> Result<(), StoreError> {
        let checksum_path = Self::checksum_path(path);
        if path.exists() {
            fs::remove_file(path)?;
        }
        if checksum_path.exists() {
            fs::remove_file(checksum_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read_blob() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = ModelStore::new(dir.path())?;
        let path = store.unit_path("Result", NGramType::FilteredUnigram);

        store.write_blob(&path, b"state")?;
        assert!(store.verify(&path)?);
        assert_eq!(store.read_blob(&path)?, b"state");
        Ok(())
    }

    #[test]
    fn test_corrupted_blob_is_detected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = ModelStore::new(dir.path())?;
        let path = store.unit_path("Result", NGramType::Unigram);

        store.write_blob(&path, b"state")?;
        fs::write(&path, "corrupted data")?;
        assert!(!store.verify(&path)?);
        assert!(matches!(
            store.read_blob(&path),
            Err(StoreError::HashMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_missing_blob() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = ModelStore::new(dir.path())?;
        let path = store.unit_path("Missing", NGramType::Bigram);
        assert!(!store.verify(&path)?);
        assert!(matches!(store.read_blob(&path), Err(StoreError::NotFound(_))));

        store.write_blob(&path, b"x")?;
        store.remove(&path)?;
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_unit_file_name() {
        assert_eq!(
            ModelStore::unit_file_name("Result", NGramType::FilteredBigram),
            "Result_filtered_bigram.model"
        );
        assert_eq!(
            ModelStore::unit_file_name("a/b c", NGramType::Unigram),
            "a_b_c_unigram.model"
        );
        assert_eq!(
            ModelStore::unit_file_name("Результат", NGramType::Unigram),
            "Результат_unigram.model"
        );
    }

    #[test]
    fn test_default_store_dir() {
        env::set_var("TEXTCLASSIFIER_CACHE", "/tmp/test-textclassifier");
        let path = ModelStore::get_default_store_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-textclassifier/models"));
        env::remove_var("TEXTCLASSIFIER_CACHE");

        let path = ModelStore::get_default_store_dir();
        assert!(path.to_str().unwrap().contains("textclassifier"));
    }
}
