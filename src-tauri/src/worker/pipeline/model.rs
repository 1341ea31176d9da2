use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use ort::{
    execution_providers::CPUExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
};
use serde_json::Value;
use tokenizers::Tokenizer;

use super::config::{LoadProgress, PipelineConfig, PipelineError};
use super::{Pipeline, PipelineLoader};
use crate::net::{AssetRequest, AssetResponse, Body, Destination, Fetcher, OfflineCache};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct SpecialTokens {
    pub decoder_start: i64,
    pub eos: i64,
    pub pad: i64,
}

impl SpecialTokens {
    fn from_config(config: &Value) -> Result<Self, PipelineError> {
        let eos = token_id(config, "eos_token_id")
            .ok_or_else(|| PipelineError::Config("missing eos_token_id".into()))?;
        let pad = token_id(config, "pad_token_id").unwrap_or(eos);
        let decoder_start = token_id(config, "decoder_start_token_id").unwrap_or(pad);
        Ok(Self {
            decoder_start,
            eos,
            pad,
        })
    }
}

/// Some configs list several ids; the first one wins.
fn token_id(config: &Value, key: &str) -> Option<i64> {
    match config.get(key)? {
        Value::Array(ids) => ids.first().and_then(Value::as_i64),
        value => value.as_i64(),
    }
}

/// Encoder-decoder translation model exported to ONNX.
pub struct MarianModel {
    pub(super) encoder: Session,
    pub(super) decoder: Session,
    pub(super) tokenizer: Tokenizer,
    pub(super) special: SpecialTokens,
    pub(super) max_length: usize,
}

impl Drop for MarianModel {
    fn drop(&mut self) {
        log::debug!("Dropping translation model");
    }
}

impl MarianModel {
    pub fn from_files(
        config_path: &Path,
        tokenizer_path: &Path,
        encoder_path: &Path,
        decoder_path: &Path,
        pipeline: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let start = Instant::now();

        let config: Value = serde_json::from_slice(&std::fs::read(config_path)?)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let special = SpecialTokens::from_config(&config)?;
        let max_length = config
            .get("max_length")
            .and_then(Value::as_u64)
            .map_or(pipeline.max_length, |n| (n as usize).min(pipeline.max_length));

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| PipelineError::Tokenizer(e.to_string()))?;
        let encoder = Self::init_session(encoder_path, pipeline.threads)?;
        let decoder = Self::init_session(decoder_path, pipeline.threads)?;

        log::info!(
            "Translation model initialized in {:?} (max length {max_length})",
            start.elapsed()
        );
        Ok(Self {
            encoder,
            decoder,
            tokenizer,
            special,
            max_length,
        })
    }

    fn init_session(path: &Path, threads: usize) -> Result<Session, PipelineError> {
        let opt = if cfg!(target_os = "windows") {
            GraphOptimizationLevel::Level1
        } else {
            GraphOptimizationLevel::Level3
        };
        Ok(Session::builder()?
            .with_optimization_level(opt)?
            .with_execution_providers(vec![CPUExecutionProvider::default().build()])?
            .with_intra_threads(threads)?
            .commit_from_file(path)?)
    }
}

/// Loads pair models from the model host through the offline cache, so a
/// second load of the same model never touches the network.
pub struct OnnxPipelineLoader<F> {
    cache: Arc<OfflineCache<F>>,
    model_host: String,
    config: PipelineConfig,
}

impl<F: Fetcher> OnnxPipelineLoader<F> {
    pub fn new(
        cache: Arc<OfflineCache<F>>,
        model_host: impl Into<String>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            cache,
            model_host: model_host.into().trim_end_matches('/').to_string(),
            config,
        }
    }

    pub fn file_url(&self, model_id: &str, file: &str) -> String {
        format!("{}/{model_id}/resolve/main/{file}", self.model_host)
    }

    pub fn model_files(&self) -> [String; 4] {
        let suffix = if self.config.quantized { "_quantized" } else { "" };
        [
            CONFIG_FILE.to_string(),
            TOKENIZER_FILE.to_string(),
            format!("onnx/encoder_model{suffix}.onnx"),
            format!("onnx/decoder_model{suffix}.onnx"),
        ]
    }

    fn fetch(
        &self,
        model_id: &str,
        file: &str,
        on_progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<PathBuf, PipelineError> {
        let url = self.file_url(model_id, file);
        let request = AssetRequest::asset(url.clone(), Destination::Other);

        let mut report = |received: u64, total: Option<u64>| {
            if let Some(total) = total.filter(|t| *t > 0) {
                on_progress(LoadProgress {
                    file: file.to_string(),
                    progress: (received as f64 / total as f64 * 100.0) as f32,
                });
            }
        };
        let response = self.cache.respond_with_progress(&request, &mut report)?;

        match response {
            AssetResponse {
                status: 200,
                body: Body::File(path),
                ..
            } => {
                on_progress(LoadProgress {
                    file: file.to_string(),
                    progress: 100.0,
                });
                Ok(path)
            }
            AssetResponse { status, .. } => {
                log::error!("Model file {url} unavailable (status {status})");
                Err(PipelineError::MissingFile(format!("{url} (status {status})")))
            }
        }
    }
}

impl<F: Fetcher> PipelineLoader for OnnxPipelineLoader<F> {
    fn load(
        &self,
        model_id: &str,
        on_progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<Box<dyn Pipeline>, PipelineError> {
        let start = Instant::now();
        let [config, tokenizer, encoder, decoder] = self.model_files();

        let config = self.fetch(model_id, &config, on_progress)?;
        let tokenizer = self.fetch(model_id, &tokenizer, on_progress)?;
        let encoder = self.fetch(model_id, &encoder, on_progress)?;
        let decoder = self.fetch(model_id, &decoder, on_progress)?;
        log::info!("Model files for {model_id} resolved in {:?}", start.elapsed());

        let model = MarianModel::from_files(&config, &tokenizer, &encoder, &decoder, &self.config)?;
        Ok(Box::new(model))
    }
}
