use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tauri::AppHandle;
use tauri_plugin_store::StoreExt;
use thiserror::Error;

use crate::cache::DEFAULT_MODEL_HOST;

pub const STORE_PATH: &str = "settings.json";
const APP_DIR: &str = "offline-translate";

const KEY_STORAGE_PATH: &str = "storage_path";
const KEY_MODEL_HOST: &str = "model_host";
const KEY_STORAGE_QUOTA_MB: &str = "storage_quota_mb";
const KEY_SOURCE_LANG: &str = "source_lang";
const KEY_TARGET_LANG: &str = "target_lang";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings store unavailable: {0}")]
    Store(String),
    #[error("Path does not exist or is not a directory: {0}")]
    InvalidPath(String),
    #[error("Invalid model host: {0}")]
    InvalidHost(String),
}

impl SettingsError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Store(_) => "Settings could not be saved. Check disk space and permissions.",
            Self::InvalidPath(_) => "That folder does not exist. Pick another storage folder.",
            Self::InvalidHost(_) => "The model host must be a full URL such as https://huggingface.co.",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub storage_path: Option<String>,
    pub model_host: String,
    pub storage_quota_mb: Option<u64>,
    pub source_lang: String,
    pub target_lang: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_path: None,
            model_host: DEFAULT_MODEL_HOST.to_string(),
            storage_quota_mb: None,
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
        }
    }
}

impl Settings {
    pub fn storage_root(&self) -> PathBuf {
        self.storage_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_root)
    }

    pub fn quota_bytes(&self) -> Option<u64> {
        self.storage_quota_mb
            .filter(|mb| *mb > 0)
            .map(|mb| mb.saturating_mul(1024 * 1024))
    }

    /// Bare host name of the model server, as matched by the offline cache.
    pub fn model_host_name(&self) -> Option<String> {
        reqwest::Url::parse(&self.model_host)
            .ok()?
            .host_str()
            .map(str::to_string)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(path) = self.storage_path.as_deref().filter(|p| !p.trim().is_empty()) {
            if !PathBuf::from(path).is_dir() {
                return Err(SettingsError::InvalidPath(path.to_string()));
            }
        }
        if self.model_host_name().is_none() {
            return Err(SettingsError::InvalidHost(self.model_host.clone()));
        }
        Ok(())
    }
}

pub fn default_storage_root() -> PathBuf {
    dirs_next::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

pub fn get_settings(app: &AppHandle) -> Settings {
    match app.store(STORE_PATH) {
        Ok(store) => {
            let defaults = Settings::default();
            let string = |key: &str| {
                store
                    .get(key)
                    .and_then(|v| v.as_str().map(|s| s.to_string()))
            };
            Settings {
                storage_path: string(KEY_STORAGE_PATH),
                model_host: string(KEY_MODEL_HOST).unwrap_or(defaults.model_host),
                storage_quota_mb: store.get(KEY_STORAGE_QUOTA_MB).and_then(|v| v.as_u64()),
                source_lang: string(KEY_SOURCE_LANG).unwrap_or(defaults.source_lang),
                target_lang: string(KEY_TARGET_LANG).unwrap_or(defaults.target_lang),
            }
        }
        Err(e) => {
            log::warn!("Failed to load settings store: {e}");
            Settings::default()
        }
    }
}

pub fn save_settings(app: &AppHandle, settings: &Settings) -> Result<(), SettingsError> {
    let store = app
        .store(STORE_PATH)
        .map_err(|e| SettingsError::Store(e.to_string()))?;

    match &settings.storage_path {
        Some(path) => store.set(KEY_STORAGE_PATH, json!(path)),
        None => {
            store.delete(KEY_STORAGE_PATH);
        }
    }
    match settings.storage_quota_mb {
        Some(mb) => store.set(KEY_STORAGE_QUOTA_MB, json!(mb)),
        None => {
            store.delete(KEY_STORAGE_QUOTA_MB);
        }
    }
    store.set(KEY_MODEL_HOST, json!(settings.model_host));
    store.set(KEY_SOURCE_LANG, json!(settings.source_lang));
    store.set(KEY_TARGET_LANG, json!(settings.target_lang));

    store.save().map_err(|e| SettingsError::Store(e.to_string()))
}

/// Persists only the language pair, leaving everything else untouched.
pub fn save_language_pair(
    app: &AppHandle,
    source_lang: &str,
    target_lang: &str,
) -> Result<(), SettingsError> {
    let store = app
        .store(STORE_PATH)
        .map_err(|e| SettingsError::Store(e.to_string()))?;
    store.set(KEY_SOURCE_LANG, json!(source_lang));
    store.set(KEY_TARGET_LANG, json!(target_lang));
    store.save().map_err(|e| SettingsError::Store(e.to_string()))
}
