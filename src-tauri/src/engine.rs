//! High-level translation engine facade held in Tauri state.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::cache::{CacheStatus, CachedModel, ModelCache};
use crate::error::AppError;
use crate::net::{HttpFetcher, OfflineCache};
use crate::session::{Action, TranslationSession, TranslationState};
use crate::settings::Settings;
use crate::storage::{ModelStorage, StorageUsage};
use crate::worker::pipeline::{OnnxPipelineLoader, PipelineConfig};

const OFFLINE_DIR: &str = "offline";
/// Debug builds load the shell from the Trunk dev server; release builds
/// serve it from the bundle.
const APP_ORIGIN: &str = if cfg!(debug_assertions) {
    "http://localhost:1420"
} else {
    "tauri://localhost"
};

type Models = ModelCache<Arc<HttpFetcher>>;

pub struct TranslatorEngine {
    session: TranslationSession,
    models: RwLock<Arc<Models>>,
    offline: Arc<OfflineCache<Arc<HttpFetcher>>>,
    fetcher: Arc<HttpFetcher>,
}

impl TranslatorEngine {
    /// `on_state` receives every published view, on the session thread.
    pub fn new<S>(settings: &Settings, on_state: S) -> Result<Self, AppError>
    where
        S: Fn(&TranslationState) + Send + 'static,
    {
        let start = Instant::now();
        let fetcher = Arc::new(HttpFetcher::new()?);
        let models = Arc::new(Self::open_models(settings, &fetcher)?);

        let offline = Arc::new(OfflineCache::new(
            settings.storage_root().join(OFFLINE_DIR),
            APP_ORIGIN,
            settings.model_host_name().into_iter().collect(),
            Arc::clone(&fetcher),
        ));
        let loader = Arc::new(OnnxPipelineLoader::new(
            Arc::clone(&offline),
            settings.model_host.clone(),
            PipelineConfig::from_env(),
        ));

        let initial = TranslationState::with_pair(&settings.source_lang, &settings.target_lang);
        let session = TranslationSession::spawn(loader, initial, on_state)?;

        log::info!("Translation engine ready in {:?}", start.elapsed());
        Ok(Self {
            session,
            models: RwLock::new(models),
            offline,
            fetcher,
        })
    }

    fn open_models(settings: &Settings, fetcher: &Arc<HttpFetcher>) -> Result<Models, AppError> {
        let storage = ModelStorage::open(settings.storage_root(), settings.quota_bytes())?;
        Ok(ModelCache::new(
            Arc::new(storage),
            Arc::clone(fetcher),
            settings.model_host.clone(),
        ))
    }

    /// Reopens model storage after the storage path, quota or host changed.
    /// The pipeline's file cache keeps its location until restart.
    pub fn reconfigure(&self, settings: &Settings) -> Result<(), AppError> {
        let models = Arc::new(Self::open_models(settings, &self.fetcher)?);
        match self.models.write() {
            Ok(mut guard) => *guard = models,
            Err(poisoned) => *poisoned.into_inner() = models,
        }
        Ok(())
    }

    pub fn models(&self) -> Arc<Models> {
        match self.models.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn state(&self) -> TranslationState {
        self.session.state()
    }

    pub fn dispatch(&self, action: Action) -> Result<(), AppError> {
        log::debug!("Dispatching {action:?}");
        Ok(self.session.dispatch(action)?)
    }

    pub fn post_raw(&self, raw: serde_json::Value) -> Result<(), AppError> {
        Ok(self.session.post_raw(raw)?)
    }

    pub fn cache_status(&self, source_lang: &str, target_lang: &str) -> Result<CacheStatus, AppError> {
        Ok(self.models().is_cached(source_lang, target_lang)?)
    }

    pub fn list_cached(&self) -> Result<Vec<CachedModel>, AppError> {
        Ok(self.models().list_cached()?)
    }

    pub fn remove_model(&self, source_lang: &str, target_lang: &str) -> Result<(), AppError> {
        Ok(self.models().remove(source_lang, target_lang)?)
    }

    /// Empties model storage and the pipeline's file cache.
    pub fn clear_all(&self) -> Result<(), AppError> {
        self.models().clear_all()?;
        if let Err(e) = self.offline.clear() {
            log::warn!("Failed to clear offline file cache: {e}");
        }
        Ok(())
    }

    pub fn usage(&self) -> StorageUsage {
        self.models().usage()
    }

    pub fn check_for_update(&self, source_lang: &str, target_lang: &str) -> Result<bool, AppError> {
        Ok(self.models().check_for_update(source_lang, target_lang)?)
    }

    /// Pre-caches the app shell when it is served over HTTP, then drops
    /// cache generations left behind by older builds.
    pub fn prepare_offline_cache(&self) {
        if APP_ORIGIN.starts_with("http") {
            self.offline.install();
        } else {
            log::debug!("App shell is bundled, skipping pre-cache");
        }
        self.offline.activate();
    }

    pub fn shutdown(&self) {
        self.session.shutdown();
    }
}
