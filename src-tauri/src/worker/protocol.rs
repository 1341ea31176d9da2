//! Messages exchanged between the session and the inference worker.
//!
//! On the wire every message is `{"type": ..., "payload": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const REQUEST_TYPES: &[&str] = &["loadModel", "unloadModel", "translate"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    Translating,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadModelPayload {
    pub model_id: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnloadModelPayload {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatePayload {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WorkerRequest {
    LoadModel(LoadModelPayload),
    UnloadModel(UnloadModelPayload),
    Translate(TranslatePayload),
}

impl WorkerRequest {
    pub fn load_model(model_id: &str, source_lang: &str, target_lang: &str) -> Self {
        Self::LoadModel(LoadModelPayload {
            model_id: model_id.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        })
    }

    pub fn unload_model() -> Self {
        Self::UnloadModel(UnloadModelPayload::default())
    }

    pub fn translate(text: &str, source_lang: &str, target_lang: &str) -> Self {
        Self::Translate(TranslatePayload {
            text: text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoadModel(_) => "loadModel",
            Self::UnloadModel(_) => "unloadModel",
            Self::Translate(_) => "translate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPayload {
    /// 0-100.
    pub progress: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedPayload {
    pub model_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    pub translation: String,
    pub is_partial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub is_partial: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    LoadFailed,
    ModelNotLoaded,
    EmptyInput,
    TranslateFailed,
    WorkerPanic,
    UnknownMessage,
}

impl ErrorCode {
    /// Errors that terminate a `translate` request.
    pub fn ends_translation(self) -> bool {
        matches!(
            self,
            Self::ModelNotLoaded | Self::EmptyInput | Self::TranslateFailed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WorkerResponse {
    Status(StatusPayload),
    Progress(ProgressPayload),
    Loaded(LoadedPayload),
    Update(UpdatePayload),
    Result(ResultPayload),
    Error(ErrorPayload),
}

impl WorkerResponse {
    pub fn status(status: Status, message: &str) -> Self {
        Self::Status(StatusPayload {
            status,
            message: Some(message.to_string()),
        })
    }

    pub fn progress(progress: f32, status: Option<String>) -> Self {
        Self::Progress(ProgressPayload {
            progress: progress.clamp(0.0, 100.0),
            status,
        })
    }

    pub fn loaded(model_id: &str) -> Self {
        Self::Loaded(LoadedPayload {
            model_id: model_id.to_string(),
            status: "ready".to_string(),
        })
    }

    pub fn update(translation: &str) -> Self {
        Self::Update(UpdatePayload {
            translation: translation.to_string(),
            is_partial: true,
        })
    }

    pub fn result(translation: String, confidence: Option<f32>) -> Self {
        Self::Result(ResultPayload {
            translation,
            confidence,
            is_partial: false,
        })
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
            code: Some(code),
        })
    }
}

/// Decodes a raw envelope. Unknown `type`s are logged and yield `Ok(None)`;
/// a known type with a malformed payload is an error.
pub fn decode_request(raw: Value) -> Result<Option<WorkerRequest>, serde_json::Error> {
    let kind = raw
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if !REQUEST_TYPES.contains(&kind.as_str()) {
        log::warn!("Ignoring unknown worker message type {kind:?}");
        return Ok(None);
    }

    serde_json::from_value(raw).map(Some)
}
