//! Dataset persistence
//!
//! The dataset is kept as a single pretty-printed JSON file. Writes go to a
//! temporary file next to the target and are renamed into place, so a reader
//! sees either the old file or the new one, never a mix.

use std::{
    io,
    path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::error::Error as CrateError;
use crate::servant::Dataset;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Location of the dataset file
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/servants.json"),
        }
    }
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid dataset path: {0}")]
    InvalidPath(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for CrateError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => CrateError::NotFound(path),
            other => CrateError::Storage(other.to_string()),
        }
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// Reads and writes the servant dataset file
#[derive(Debug, Clone)]
pub struct DatasetStore {
    config: StorageConfig,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStore {
    /// Create a new store with default configuration
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
        }
    }

    /// Create a new store with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Store backed by the file at `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::with_config(StorageConfig { path: path.into() })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .config
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StorageError::InvalidPath(self.config.path.display().to_string()))?;
        let temp_name = format!(".{}.tmp.{}", file_name, std::process::id());
        Ok(self.config.path.with_file_name(temp_name))
    }

    /// Replace the dataset file with `dataset`
    pub async fn save(&self, dataset: &Dataset) -> Result<()> {
        let path = &self.config.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut bytes = serde_json::to_vec_pretty(dataset)?;
        bytes.push(b'\n');

        let temp = self.temp_path()?;
        if let Err(e) = write_synced(&temp, &bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        info!("Saved {} servants to {}", dataset.len(), path.display());
        Ok(())
    }

    /// Read the dataset file, reporting why it could not be read
    pub async fn try_load(&self) -> Result<Dataset> {
        let path = &self.config.path;
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let dataset: Dataset = serde_json::from_str(&content)?;
        debug!("Loaded {} servants from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Read the dataset file; a missing or corrupt file reads as empty
    pub async fn load(&self) -> Dataset {
        match self.try_load().await {
            Ok(dataset) => dataset,
            Err(StorageError::NotFound(path)) => {
                warn!("Servant data file not found: {}", path);
                Dataset::default()
            }
            Err(e) => {
                error!(
                    "Error reading servant data file {}: {}",
                    self.config.path.display(),
                    e
                );
                Dataset::default()
            }
        }
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

/// Write `dataset` to `path`
pub async fn save(dataset: &Dataset, path: impl Into<PathBuf>) -> Result<()> {
    DatasetStore::at(path).save(dataset).await
}

/// Read the dataset at `path`, empty if missing or corrupt
pub async fn load(path: impl Into<PathBuf>) -> Dataset {
    DatasetStore::at(path).load().await
}
