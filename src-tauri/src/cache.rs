//! Decides whether a language pair's model is on disk and fetches it when not.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::catalog::{self, UnsupportedPair};
use crate::net::{stream_body, FetchError, Fetcher};
use crate::storage::{now_millis, ModelStorage, StorageError, StorageUsage};

pub const DEFAULT_MODEL_HOST: &str = "https://huggingface.co";
const MODEL_FILE: &str = "model.onnx";
const UNKNOWN_VERSION: &str = "unknown";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    UnsupportedPair(#[from] UnsupportedPair),
    #[error("Storage: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Model download failed: {0}")]
    Download(String),
}

impl CacheError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UnsupportedPair(_) => "This language pair is not supported yet.",
            Self::Storage(e) => e.user_message(),
            Self::Fetch(e) => e.user_message(),
            Self::Download(_) => {
                "Could not download the translation model. Check your internet connection and try again."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub is_cached: bool,
    pub size: u64,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedModel {
    pub model_key: String,
    pub model_id: String,
    pub size: u64,
    pub version: String,
    pub created_at: u64,
}

pub fn version_key(model_id: &str) -> String {
    format!("version-{model_id}")
}

pub fn etag_key(model_id: &str) -> String {
    format!("etag-{model_id}")
}

pub struct ModelCache<F> {
    storage: Arc<ModelStorage>,
    fetcher: F,
    model_host: String,
}

impl<F: Fetcher> ModelCache<F> {
    pub fn new(storage: Arc<ModelStorage>, fetcher: F, model_host: impl Into<String>) -> Self {
        Self {
            storage,
            fetcher,
            model_host: model_host.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn storage(&self) -> &Arc<ModelStorage> {
        &self.storage
    }

    pub fn model_url(&self, model_id: &str) -> String {
        format!("{}/{model_id}/resolve/main/{MODEL_FILE}", self.model_host)
    }

    pub fn is_cached(&self, source_lang: &str, target_lang: &str) -> Result<CacheStatus, CacheError> {
        let key = catalog::model_key(source_lang, target_lang);
        let model_id = catalog::get_model_id(source_lang, target_lang);

        let status = match self.storage.get_record(&key)? {
            Some(record) => {
                if record.model_id != model_id {
                    log::warn!(
                        "Cached {key} holds {} but {model_id} is configured",
                        record.model_id
                    );
                }
                CacheStatus {
                    is_cached: true,
                    size: record.size,
                    version: record.version,
                }
            }
            None => CacheStatus {
                is_cached: false,
                size: 0,
                version: UNKNOWN_VERSION.to_string(),
            },
        };
        Ok(status)
    }

    /// No-op when the pair is already stored. `on_progress` receives 0-100
    /// and is only called when the server reports a content length.
    pub fn download_and_cache<P>(
        &self,
        source_lang: &str,
        target_lang: &str,
        mut on_progress: P,
    ) -> Result<(), CacheError>
    where
        P: FnMut(f32),
    {
        let resolved = catalog::resolve_model(source_lang, target_lang)?;
        if self.storage.has(&resolved.key)? {
            log::debug!("Model {} already cached; skipping download", resolved.key);
            return Ok(());
        }

        let url = self.model_url(&resolved.model_id);
        log::info!("Downloading {} from {url}", resolved.key);

        let mut response = self.fetcher.get(&url)?;
        if !response.is_success() {
            return Err(CacheError::Download(format!(
                "{url}: unexpected status {}",
                response.status
            )));
        }

        let total = response.content_length.filter(|t| *t > 0);
        let mut blob = Vec::with_capacity(total.unwrap_or(0).min(1 << 30) as usize);
        let received = stream_body(&url, &mut *response.body, |chunk, received| {
            blob.extend_from_slice(chunk);
            if let Some(total) = total {
                on_progress((received as f64 / total as f64 * 100.0) as f32);
            }
            Ok(())
        })?;

        if let Some(total) = total.filter(|t| *t != received) {
            return Err(CacheError::Download(format!(
                "{url}: incomplete download, expected {total} bytes, got {received}"
            )));
        }

        let version = now_millis().to_string();
        self.storage
            .save(&resolved.key, &resolved.model_id, &blob, &version)?;
        self.storage
            .set_meta(&version_key(&resolved.model_id), json!(version))?;
        if let Some(etag) = response.etag {
            self.storage
                .set_meta(&etag_key(&resolved.model_id), json!(etag))?;
        }

        log::info!("Cached {} ({received} bytes)", resolved.key);
        Ok(())
    }

    pub fn remove(&self, source_lang: &str, target_lang: &str) -> Result<(), CacheError> {
        self.storage
            .delete(&catalog::model_key(source_lang, target_lang))?;
        Ok(())
    }

    pub fn list_cached(&self) -> Result<Vec<CachedModel>, CacheError> {
        Ok(self
            .storage
            .list_all()?
            .into_iter()
            .map(|r| CachedModel {
                model_key: r.name,
                model_id: r.model_id,
                size: r.size,
                version: r.version,
                created_at: r.created_at,
            })
            .collect())
    }

    pub fn clear_all(&self) -> Result<(), CacheError> {
        self.storage.clear_all()?;
        Ok(())
    }

    pub fn cached_size(&self, source_lang: &str, target_lang: &str) -> Result<u64, CacheError> {
        Ok(self.is_cached(source_lang, target_lang)?.size)
    }

    pub fn usage(&self) -> StorageUsage {
        self.storage.usage()
    }

    /// `true` when a cached model has no version marker or the host now
    /// serves a different ETag. An unreachable host reports no update.
    pub fn check_for_update(&self, source_lang: &str, target_lang: &str) -> Result<bool, CacheError> {
        let resolved = catalog::resolve_model(source_lang, target_lang)?;
        if !self.storage.has(&resolved.key)? {
            return Ok(false);
        }

        if self
            .storage
            .get_meta(&version_key(&resolved.model_id))?
            .is_none()
        {
            log::info!("{} has no version marker; update recommended", resolved.key);
            return Ok(true);
        }

        let Some(stored) = self
            .storage
            .get_meta(&etag_key(&resolved.model_id))?
            .and_then(|v| v.as_str().map(str::to_string))
        else {
            return Ok(false);
        };

        let url = self.model_url(&resolved.model_id);
        match self.fetcher.head(&url) {
            Ok(head) if (200..300).contains(&head.status) => {
                let changed = head.etag.is_some_and(|remote| remote != stored);
                if changed {
                    log::info!("Remote model for {} changed", resolved.key);
                }
                Ok(changed)
            }
            Ok(head) => {
                log::warn!("Update check for {url} returned status {}", head.status);
                Ok(false)
            }
            Err(e) => {
                log::warn!("Update check for {url} failed: {e}");
                Ok(false)
            }
        }
    }
}
