//! Static language and model tables.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

pub const MODEL_ID_PREFIX: &str = "Xenova/opus-mt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub model_id: &'static str,
    pub quantized: bool,
    /// Approximate download size in MB.
    pub size: u32,
    pub languages: [&'static str; 2],
}

const fn lang(code: &'static str, name: &'static str, native_name: &'static str) -> Language {
    Language {
        code,
        name,
        native_name,
    }
}

const fn opus(
    model_id: &'static str,
    size: u32,
    source: &'static str,
    target: &'static str,
) -> ModelConfig {
    ModelConfig {
        model_id,
        quantized: true,
        size,
        languages: [source, target],
    }
}

pub const SUPPORTED_LANGUAGES: &[Language] = &[
    lang("en", "English", "English"),
    lang("es", "Spanish", "Español"),
    lang("fr", "French", "Français"),
    lang("de", "German", "Deutsch"),
    lang("zh", "Chinese", "中文"),
    lang("ja", "Japanese", "日本語"),
    lang("ko", "Korean", "한국어"),
    lang("pt", "Portuguese", "Português"),
    lang("ru", "Russian", "Русский"),
    lang("ar", "Arabic", "العربية"),
    lang("hi", "Hindi", "हिन्दी"),
    lang("it", "Italian", "Italiano"),
    lang("nl", "Dutch", "Nederlands"),
    lang("pl", "Polish", "Polski"),
    lang("tr", "Turkish", "Türkçe"),
    lang("vi", "Vietnamese", "Tiếng Việt"),
    lang("th", "Thai", "ไทย"),
    lang("uk", "Ukrainian", "Українська"),
];

pub const MODEL_CONFIGS: &[ModelConfig] = &[
    opus("Xenova/opus-mt-en-es", 50, "en", "es"),
    opus("Xenova/opus-mt-en-fr", 45, "en", "fr"),
    opus("Xenova/opus-mt-en-de", 48, "en", "de"),
    opus("Xenova/opus-mt-en-zh", 55, "en", "zh"),
    opus("Xenova/opus-mt-en-ja", 60, "en", "ja"),
    opus("Xenova/opus-mt-en-ko", 52, "en", "ko"),
    opus("Xenova/opus-mt-en-pt", 47, "en", "pt"),
    opus("Xenova/opus-mt-en-ru", 58, "en", "ru"),
    opus("Xenova/opus-mt-en-ar", 54, "en", "ar"),
    opus("Xenova/opus-mt-en-hi", 51, "en", "hi"),
    opus("Xenova/opus-mt-en-it", 46, "en", "it"),
    opus("Xenova/opus-mt-es-en", 49, "es", "en"),
    opus("Xenova/opus-mt-fr-en", 44, "fr", "en"),
    opus("Xenova/opus-mt-de-en", 47, "de", "en"),
    opus("Xenova/opus-mt-zh-en", 52, "zh", "en"),
    opus("Xenova/opus-mt-ja-en", 55, "ja", "en"),
    opus("Xenova/opus-mt-ko-en", 48, "ko", "en"),
    opus("Xenova/opus-mt-ru-en", 58, "ru", "en"),
    opus("Xenova/opus-mt-ar-en", 54, "ar", "en"),
    opus("Xenova/opus-mt-fr-de", 45, "fr", "de"),
    opus("Xenova/opus-mt-es-fr", 42, "es", "fr"),
    opus("Xenova/opus-mt-it-en", 46, "it", "en"),
    opus("Xenova/opus-mt-pt-en", 47, "pt", "en"),
];

static LANG_CODE_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}$"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No translation model available for {source_lang} -> {target_lang}")]
pub struct UnsupportedPair {
    pub source_lang: String,
    pub target_lang: String,
}

/// A language pair resolved to the model that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub key: String,
    pub model_id: String,
    pub config: Option<&'static ModelConfig>,
}

pub fn model_key(source_lang: &str, target_lang: &str) -> String {
    format!("{source_lang}-{target_lang}")
}

pub fn get_model_config(source_lang: &str, target_lang: &str) -> Option<&'static ModelConfig> {
    MODEL_CONFIGS
        .iter()
        .find(|c| c.languages[0] == source_lang && c.languages[1] == target_lang)
}

/// Configured id for the pair, or the synthesized `<prefix>-<src>-<tgt>`.
pub fn get_model_id(source_lang: &str, target_lang: &str) -> String {
    match get_model_config(source_lang, target_lang) {
        Some(config) => config.model_id.to_string(),
        None => format!("{MODEL_ID_PREFIX}-{source_lang}-{target_lang}"),
    }
}

pub fn is_pair_configured(source_lang: &str, target_lang: &str) -> bool {
    get_model_config(source_lang, target_lang).is_some()
}

pub fn supported_pairs() -> Vec<String> {
    MODEL_CONFIGS
        .iter()
        .map(|c| model_key(c.languages[0], c.languages[1]))
        .collect()
}

pub fn language_by_code(code: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES.iter().find(|l| l.code == code)
}

fn is_well_formed_code(code: &str) -> bool {
    match &*LANG_CODE_RE {
        Ok(re) => re.is_match(code),
        Err(_) => !code.is_empty() && code.chars().all(|c| c.is_ascii_lowercase()),
    }
}

fn is_synthesizable(source_lang: &str, target_lang: &str) -> bool {
    source_lang != target_lang
        && is_well_formed_code(source_lang)
        && is_well_formed_code(target_lang)
        && language_by_code(source_lang).is_some()
        && language_by_code(target_lang).is_some()
}

pub fn resolve_model(source_lang: &str, target_lang: &str) -> Result<ResolvedModel, UnsupportedPair> {
    let key = model_key(source_lang, target_lang);
    if let Some(config) = get_model_config(source_lang, target_lang) {
        return Ok(ResolvedModel {
            key,
            model_id: config.model_id.to_string(),
            config: Some(config),
        });
    }

    if is_synthesizable(source_lang, target_lang) {
        return Ok(ResolvedModel {
            key,
            model_id: get_model_id(source_lang, target_lang),
            config: None,
        });
    }

    Err(UnsupportedPair {
        source_lang: source_lang.to_string(),
        target_lang: target_lang.to_string(),
    })
}
