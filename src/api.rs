use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

pub const STATE_EVENT: &str = "translation_state";
pub const DOWNLOAD_PROGRESS_EVENT: &str = "model_download_progress";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], catch)]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "event"], catch)]
    pub async fn listen(
        event: &str,
        handler: &Closure<dyn FnMut(JsValue)>,
    ) -> Result<JsValue, JsValue>;
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TranslationStateDto {
    pub source_lang: String,
    pub target_lang: String,
    pub input_text: String,
    pub output_text: String,
    pub is_loading: bool,
    pub is_translating: bool,
    pub progress: f32,
    pub status: String,
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDto {
    pub code: String,
    pub name: String,
    pub native_name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfigDto {
    pub model_id: String,
    pub quantized: bool,
    pub size: u32,
    pub languages: [String; 2],
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CatalogDto {
    pub languages: Vec<LanguageDto>,
    pub models: Vec<ModelConfigDto>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusDto {
    pub is_cached: bool,
    pub size: u64,
    pub version: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedModelDto {
    pub model_key: String,
    pub model_id: String,
    pub size: u64,
    pub version: String,
    pub created_at: u64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct StorageUsageDto {
    pub used: u64,
    pub quota: u64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgressDto {
    pub model_key: String,
    pub progress: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDto {
    pub storage_path: Option<String>,
    pub model_host: String,
    pub storage_quota_mb: Option<u64>,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Serialize)]
struct LangArgs<'a> {
    lang: &'a str,
}

#[derive(Serialize)]
struct TextArgs<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PairArgs<'a> {
    source_lang: &'a str,
    target_lang: &'a str,
}

#[derive(Serialize)]
struct SettingsArgs<'a> {
    settings: &'a SettingsDto,
}

#[derive(Serialize)]
struct ShortcutArgs<'a> {
    shortcut: &'a str,
}

async fn invoke_no_args(cmd: &str) -> Result<JsValue, String> {
    invoke(cmd, JsValue::NULL).await.map_err(extract_error)
}

async fn invoke_with<A: Serialize>(cmd: &str, args: &A) -> Result<JsValue, String> {
    let args = serde_wasm_bindgen::to_value(args).map_err(|err| err.to_string())?;
    invoke(cmd, args).await.map_err(extract_error)
}

fn decode<T: DeserializeOwned>(value: JsValue) -> Result<T, String> {
    serde_wasm_bindgen::from_value(value).map_err(|err| err.to_string())
}

pub async fn fetch_state() -> Result<TranslationStateDto, String> {
    decode(invoke_no_args("get_state").await?)
}

pub async fn set_source_lang(lang: &str) -> Result<(), String> {
    invoke_with("set_source_lang", &LangArgs { lang }).await.map(|_| ())
}

pub async fn set_target_lang(lang: &str) -> Result<(), String> {
    invoke_with("set_target_lang", &LangArgs { lang }).await.map(|_| ())
}

pub async fn set_input_text(text: &str) -> Result<(), String> {
    invoke_with("set_input_text", &TextArgs { text }).await.map(|_| ())
}

pub async fn translate_cmd() -> Result<(), String> {
    invoke_no_args("translate").await.map(|_| ())
}

pub async fn clear_cmd() -> Result<(), String> {
    invoke_no_args("clear").await.map(|_| ())
}

pub async fn swap_languages_cmd() -> Result<(), String> {
    invoke_no_args("swap_languages").await.map(|_| ())
}

pub async fn load_model_cmd() -> Result<(), String> {
    invoke_no_args("load_model").await.map(|_| ())
}

pub async fn unload_model_cmd() -> Result<(), String> {
    invoke_no_args("unload_model").await.map(|_| ())
}

pub async fn fetch_catalog() -> Result<CatalogDto, String> {
    decode(invoke_no_args("supported_languages").await?)
}

pub async fn fetch_cache_status(source_lang: &str, target_lang: &str) -> Result<CacheStatusDto, String> {
    let args = PairArgs {
        source_lang,
        target_lang,
    };
    decode(invoke_with("model_cache_status", &args).await?)
}

pub async fn download_model_cmd(source_lang: &str, target_lang: &str) -> Result<(), String> {
    let args = PairArgs {
        source_lang,
        target_lang,
    };
    invoke_with("download_model", &args).await.map(|_| ())
}

pub async fn remove_model_cmd(source_lang: &str, target_lang: &str) -> Result<(), String> {
    let args = PairArgs {
        source_lang,
        target_lang,
    };
    invoke_with("remove_model", &args).await.map(|_| ())
}

pub async fn check_model_update_cmd(source_lang: &str, target_lang: &str) -> Result<bool, String> {
    let args = PairArgs {
        source_lang,
        target_lang,
    };
    let value = invoke_with("check_model_update", &args).await?;
    Ok(value.as_bool().unwrap_or(false))
}

pub async fn fetch_cached_models() -> Result<Vec<CachedModelDto>, String> {
    decode(invoke_no_args("list_cached_models").await?)
}

pub async fn clear_cached_models_cmd() -> Result<(), String> {
    invoke_no_args("clear_cached_models").await.map(|_| ())
}

pub async fn fetch_storage_usage() -> Result<StorageUsageDto, String> {
    decode(invoke_no_args("storage_usage").await?)
}

pub async fn fetch_settings() -> Result<SettingsDto, String> {
    decode(invoke_no_args("get_settings").await?)
}

pub async fn save_settings_cmd(settings: &SettingsDto) -> Result<(), String> {
    invoke_with("update_settings", &SettingsArgs { settings })
        .await
        .map(|_| ())
}

pub async fn reset_settings_cmd() -> Result<(), String> {
    invoke_no_args("reset_settings").await.map(|_| ())
}

pub async fn pick_storage_folder_cmd() -> Result<Option<String>, String> {
    let value = invoke_no_args("pick_storage_folder").await?;
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_string()
        .ok_or_else(|| "Invalid response".to_string())
        .map(Some)
}

pub async fn fetch_current_shortcut() -> Result<Option<String>, String> {
    let value = invoke_no_args("get_summon_shortcut").await?;
    Ok(value.as_string())
}

pub async fn fetch_default_shortcut() -> Result<Option<String>, String> {
    let value = invoke_no_args("default_summon_shortcut").await?;
    Ok(value.as_string())
}

pub async fn save_shortcut(shortcut: &str) -> Result<String, String> {
    let value = invoke_with("update_summon_shortcut", &ShortcutArgs { shortcut }).await?;

    value
        .as_string()
        .ok_or_else(|| "Shortcut saved, but response was empty".to_string())
}

/// Subscribes to a backend event, decoding each payload as `T`.
pub async fn listen_payload<T, F>(event: &'static str, mut on_payload: F)
where
    T: DeserializeOwned + 'static,
    F: FnMut(T) + 'static,
{
    let callback = Closure::wrap(Box::new(move |raw: JsValue| {
        match js_sys::Reflect::get(&raw, &"payload".into()) {
            Ok(payload) => match serde_wasm_bindgen::from_value::<T>(payload) {
                Ok(value) => on_payload(value),
                Err(e) => leptos::logging::error!("Failed to parse {event} payload: {:?}", e),
            },
            Err(_) => leptos::logging::warn!("Event {event} received without payload"),
        }
    }) as Box<dyn FnMut(JsValue)>);

    match listen(event, &callback).await {
        Ok(_) => leptos::logging::log!("Listening for {event}"),
        Err(e) => leptos::logging::error!("Failed to listen for {event}: {:?}", e),
    }
    callback.forget();
}

pub fn extract_error(err: JsValue) -> String {
    err.as_string()
        .or_else(|| {
            js_sys::Reflect::get(&err, &"message".into())
                .ok()
                .and_then(|v| v.as_string())
        })
        .unwrap_or_else(|| "Unknown error".to_string())
}
