//! On-disk key-value store for downloaded translation models.
//!
//! Each model lives under `models/` as a blob file plus a small JSON record;
//! side-channel values live in `metadata.json`. A single key write is made
//! atomic by writing a temporary sibling and renaming it into place. Nothing
//! spans more than one key.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const MODELS_DIR: &str = "models";
const METADATA_FILE: &str = "metadata.json";
const BLOB_EXT: &str = "bin";
const RECORD_EXT: &str = "json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt storage entry: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Storage quota exceeded: {needed} bytes needed, {available} bytes available")]
    QuotaExceeded { needed: u64, available: u64 },
    #[error("Invalid model name: {0:?}")]
    InvalidName(String),
    #[error("Storage unavailable at {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::QuotaExceeded { .. } => {
                "Not enough storage space for this model. Remove a cached model and try again."
            }
            Self::Unavailable(_) => {
                "The model storage folder is not available. Check the storage path in settings."
            }
            Self::InvalidName(_) => "That model name cannot be stored.",
            Self::Io(_) | Self::Corrupt(_) => {
                "The app could not read or write its model storage. Check disk space and permissions."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub name: String,
    pub model_id: String,
    pub size: u64,
    pub version: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

#[derive(Debug, Clone)]
pub struct StoredModel {
    pub record: ModelRecord,
    pub blob: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    pub used: u64,
    pub quota: u64,
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct ModelStorage {
    root: PathBuf,
    quota: Option<u64>,
    metadata_lock: Mutex<()>,
}

impl ModelStorage {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P, quota: Option<u64>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(MODELS_DIR)).map_err(|e| {
            log::error!("Failed to create model storage at {}: {e}", root.display());
            StorageError::Unavailable(root.display().to_string())
        })?;

        log::info!(
            "Model storage opened at {} (quota: {})",
            root.display(),
            quota.map_or_else(|| "none".to_string(), |q| format!("{q} bytes"))
        );

        Ok(Self {
            root,
            quota,
            metadata_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save(
        &self,
        name: &str,
        model_id: &str,
        blob: &[u8],
        version: &str,
    ) -> Result<ModelRecord, StorageError> {
        validate_name(name)?;
        let size = blob.len() as u64;
        self.check_quota(name, size)?;

        let record = ModelRecord {
            name: name.to_string(),
            model_id: model_id.to_string(),
            size,
            version: version.to_string(),
            created_at: now_millis(),
        };

        // Blob first: a record without its blob would read as present.
        write_atomic(&self.blob_path(name), blob)?;
        write_atomic(&self.record_path(name), &serde_json::to_vec_pretty(&record)?)?;

        log::info!("Stored model {name} ({model_id}, {size} bytes, version {version})");
        Ok(record)
    }

    pub fn get(&self, name: &str) -> Result<Option<StoredModel>, StorageError> {
        validate_name(name)?;
        let Some(record) = self.read_record(name)? else {
            return Ok(None);
        };

        match fs::read(self.blob_path(name)) {
            Ok(blob) => Ok(Some(StoredModel { record, blob })),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Model record {name} has no blob on disk; treating as absent");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record lookup without reading the blob.
    pub fn get_record(&self, name: &str) -> Result<Option<ModelRecord>, StorageError> {
        validate_name(name)?;
        if !self.blob_path(name).is_file() {
            return Ok(None);
        }
        self.read_record(name)
    }

    pub fn has(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.get_record(name)?.is_some())
    }

    pub fn delete(&self, name: &str) -> Result<(), StorageError> {
        validate_name(name)?;
        remove_if_exists(&self.record_path(name))?;
        remove_if_exists(&self.blob_path(name))?;
        log::info!("Deleted model {name}");
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<ModelRecord>, StorageError> {
        let mut records = Vec::new();
        for entry in fs::read_dir(self.root.join(MODELS_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }

            let parsed = fs::read(&path)
                .map_err(StorageError::from)
                .and_then(|bytes| Ok(serde_json::from_slice::<ModelRecord>(&bytes)?));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping unreadable model record {}: {e}", path.display()),
            }
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    pub fn set_meta(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self
            .metadata_lock
            .lock()
            .map_err(|_| StorageError::Unavailable(self.root.display().to_string()))?;
        let mut entries = self.read_metadata()?;
        entries.insert(key.to_string(), value);
        write_atomic(
            &self.root.join(METADATA_FILE),
            &serde_json::to_vec_pretty(&entries)?,
        )
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let _guard = self
            .metadata_lock
            .lock()
            .map_err(|_| StorageError::Unavailable(self.root.display().to_string()))?;
        Ok(self.read_metadata()?.remove(key))
    }

    pub fn clear_all(&self) -> Result<(), StorageError> {
        let _guard = self
            .metadata_lock
            .lock()
            .map_err(|_| StorageError::Unavailable(self.root.display().to_string()))?;

        let models = self.root.join(MODELS_DIR);
        match fs::remove_dir_all(&models) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&models)?;
        remove_if_exists(&self.root.join(METADATA_FILE))?;

        log::info!("Cleared all stored models and metadata");
        Ok(())
    }

    /// Best effort: zeros when the directory cannot be measured.
    pub fn usage(&self) -> StorageUsage {
        let used = match dir_size(&self.root) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Could not measure storage usage: {e}");
                0
            }
        };
        StorageUsage {
            used,
            quota: self.quota.unwrap_or(0),
        }
    }

    fn check_quota(&self, name: &str, incoming: u64) -> Result<(), StorageError> {
        let Some(quota) = self.quota else {
            return Ok(());
        };

        let replaced = fs::metadata(self.blob_path(name))
            .map(|m| m.len())
            .unwrap_or(0);
        let used = dir_size(&self.root)?.saturating_sub(replaced);
        let available = quota.saturating_sub(used);
        if incoming > available {
            log::warn!("Quota exceeded storing {name}: {incoming} > {available} available");
            return Err(StorageError::QuotaExceeded {
                needed: incoming,
                available,
            });
        }
        Ok(())
    }

    fn read_record(&self, name: &str) -> Result<Option<ModelRecord>, StorageError> {
        match fs::read(self.record_path(name)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_metadata(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        match fs::read(self.root.join(METADATA_FILE)) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.root
            .join(MODELS_DIR)
            .join(format!("{name}.{BLOB_EXT}"))
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.root
            .join(MODELS_DIR)
            .join(format!("{name}.{RECORD_EXT}"))
    }
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains("..");
    if invalid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::InvalidName(path.display().to_string()))?;
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn dir_size(dir: &Path) -> std::io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            total += dir_size(&entry.path())?;
        } else if file_type.is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}
