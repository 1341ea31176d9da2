use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager, State};

use crate::cache::{CacheStatus, CachedModel};
use crate::catalog::{self, Language, ModelConfig};
#[cfg(desktop)]
use crate::desktop;
use crate::engine::TranslatorEngine;
use crate::error::AppError;
use crate::session::{Action, TranslationState};
use crate::settings::{self, Settings};
use crate::storage::StorageUsage;

pub const DOWNLOAD_PROGRESS_EVENT: &str = "model_download_progress";

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadProgress {
    model_key: String,
    progress: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageCatalog {
    languages: &'static [Language],
    models: &'static [ModelConfig],
}

fn logged<T>(command: &str, result: Result<T, AppError>) -> Result<T, AppError> {
    if let Err(e) = &result {
        log::error!("Command {command} failed: {e}");
    }
    result
}

#[tauri::command]
pub fn get_state(engine: State<'_, TranslatorEngine>) -> TranslationState {
    engine.state()
}

#[tauri::command]
pub fn set_source_lang(engine: State<'_, TranslatorEngine>, lang: String) -> Result<(), AppError> {
    logged("set_source_lang", engine.dispatch(Action::SetSourceLang(lang)))
}

#[tauri::command]
pub fn set_target_lang(engine: State<'_, TranslatorEngine>, lang: String) -> Result<(), AppError> {
    logged("set_target_lang", engine.dispatch(Action::SetTargetLang(lang)))
}

#[tauri::command]
pub fn set_input_text(engine: State<'_, TranslatorEngine>, text: String) -> Result<(), AppError> {
    engine.dispatch(Action::SetInputText(text))
}

#[tauri::command]
pub fn translate(engine: State<'_, TranslatorEngine>) -> Result<(), AppError> {
    log::info!("Tauri command translate invoked");
    logged("translate", engine.dispatch(Action::Translate))
}

#[tauri::command]
pub fn clear(engine: State<'_, TranslatorEngine>) -> Result<(), AppError> {
    engine.dispatch(Action::Clear)
}

#[tauri::command]
pub fn swap_languages(engine: State<'_, TranslatorEngine>) -> Result<(), AppError> {
    logged("swap_languages", engine.dispatch(Action::SwapLanguages))
}

#[tauri::command]
pub fn load_model(engine: State<'_, TranslatorEngine>) -> Result<(), AppError> {
    logged("load_model", engine.dispatch(Action::LoadModel))
}

#[tauri::command]
pub fn unload_model(engine: State<'_, TranslatorEngine>) -> Result<(), AppError> {
    logged("unload_model", engine.dispatch(Action::UnloadModel))
}

#[tauri::command]
pub fn post_worker_message(
    engine: State<'_, TranslatorEngine>,
    message: serde_json::Value,
) -> Result<(), AppError> {
    logged("post_worker_message", engine.post_raw(message))
}

#[tauri::command]
pub fn supported_languages() -> LanguageCatalog {
    LanguageCatalog {
        languages: catalog::SUPPORTED_LANGUAGES,
        models: catalog::MODEL_CONFIGS,
    }
}

#[tauri::command]
pub fn model_cache_status(
    engine: State<'_, TranslatorEngine>,
    source_lang: String,
    target_lang: String,
) -> Result<CacheStatus, AppError> {
    logged(
        "model_cache_status",
        engine.cache_status(&source_lang, &target_lang),
    )
}

#[tauri::command]
pub async fn download_model(
    app: AppHandle,
    source_lang: String,
    target_lang: String,
) -> Result<(), AppError> {
    let models = app.state::<TranslatorEngine>().models();
    let model_key = catalog::model_key(&source_lang, &target_lang);
    log::info!("Tauri command download_model invoked for {model_key}");

    let emit_handle = app.clone();
    let result = tauri::async_runtime::spawn_blocking(move || {
        models.download_and_cache(&source_lang, &target_lang, |progress| {
            let payload = DownloadProgress {
                model_key: model_key.clone(),
                progress,
            };
            if let Err(e) = emit_handle.emit(DOWNLOAD_PROGRESS_EVENT, payload) {
                log::error!("Failed to emit {DOWNLOAD_PROGRESS_EVENT}: {e}");
            }
        })
    })
    .await;

    let outcome = result.map_err(|e| AppError::Task(e.to_string()))?;
    logged("download_model", outcome.map_err(AppError::from))
}

#[tauri::command]
pub fn remove_model(
    engine: State<'_, TranslatorEngine>,
    source_lang: String,
    target_lang: String,
) -> Result<(), AppError> {
    logged("remove_model", engine.remove_model(&source_lang, &target_lang))
}

#[tauri::command]
pub fn list_cached_models(engine: State<'_, TranslatorEngine>) -> Result<Vec<CachedModel>, AppError> {
    logged("list_cached_models", engine.list_cached())
}

#[tauri::command]
pub fn clear_cached_models(engine: State<'_, TranslatorEngine>) -> Result<(), AppError> {
    log::info!("Tauri command clear_cached_models invoked");
    logged("clear_cached_models", engine.clear_all())
}

#[tauri::command]
pub fn storage_usage(engine: State<'_, TranslatorEngine>) -> StorageUsage {
    engine.usage()
}

#[tauri::command]
pub async fn check_model_update(
    app: AppHandle,
    source_lang: String,
    target_lang: String,
) -> Result<bool, AppError> {
    tauri::async_runtime::spawn_blocking(move || {
        let engine = app.state::<TranslatorEngine>();
        logged(
            "check_model_update",
            engine.check_for_update(&source_lang, &target_lang),
        )
    })
    .await
    .map_err(|e| AppError::Task(e.to_string()))?
}

#[tauri::command]
pub fn get_settings(app: AppHandle) -> Settings {
    settings::get_settings(&app)
}

#[tauri::command]
pub fn update_settings(
    app: AppHandle,
    engine: State<'_, TranslatorEngine>,
    settings: Settings,
) -> Result<(), AppError> {
    log::info!("Tauri command update_settings invoked");
    logged("update_settings", apply_settings(&app, &engine, &settings))
}

fn apply_settings(
    app: &AppHandle,
    engine: &TranslatorEngine,
    settings: &Settings,
) -> Result<(), AppError> {
    settings.validate()?;
    settings::save_settings(app, settings)?;
    engine.reconfigure(settings)?;
    engine.dispatch(Action::SetSourceLang(settings.source_lang.clone()))?;
    engine.dispatch(Action::SetTargetLang(settings.target_lang.clone()))
}

#[tauri::command]
pub async fn pick_storage_folder(app: AppHandle) -> Result<Option<String>, String> {
    use tauri_plugin_dialog::DialogExt;

    let result =
        tauri::async_runtime::spawn_blocking(move || app.dialog().file().blocking_pick_folder())
            .await
            .map_err(|e| format!("Dialog task failed: {e}"))?;

    Ok(result.map(|p| p.to_string()))
}

#[cfg(desktop)]
#[tauri::command]
pub fn update_summon_shortcut(app: AppHandle, shortcut: String) -> Result<String, String> {
    desktop::update_summon_shortcut(app, shortcut)
}

#[cfg(desktop)]
#[tauri::command]
pub fn get_summon_shortcut(app: AppHandle) -> Option<String> {
    desktop::get_summon_shortcut(app)
}

#[cfg(desktop)]
#[tauri::command]
pub fn default_summon_shortcut() -> String {
    desktop::default_summon_shortcut()
}

#[tauri::command]
pub fn reset_settings(
    app: AppHandle,
    engine: State<'_, TranslatorEngine>,
) -> Result<(), AppError> {
    let settings = Settings::default();
    logged("reset_settings", apply_settings(&app, &engine, &settings))?;

    #[cfg(desktop)]
    {
        let default = desktop::default_summon_shortcut();
        if let Err(e) = desktop::update_summon_shortcut(app, default) {
            log::error!("Failed to restore default summon shortcut: {e}");
        }
    }

    Ok(())
}
