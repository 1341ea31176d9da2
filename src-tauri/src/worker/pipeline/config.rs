use ndarray::ShapeError;
use num_cpus::get_physical;

use crate::net::FetchError;

const THREAD_ENV: &str = "ORT_THREADS";
const MAX_LENGTH_ENV: &str = "TRANSLATE_MAX_LENGTH";
const QUANTIZED_ENV: &str = "TRANSLATE_QUANTIZED";
const DEFAULT_MAX_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    /// Geometric mean of the chosen tokens' probabilities.
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgress {
    pub file: String,
    /// 0-100 for the file currently being fetched.
    pub progress: f32,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ndarray shape error: {0}")]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Model output not found: {0}")]
    OutputNotFound(String),
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
    #[error("Invalid model config: {0}")]
    Config(String),
    #[error("Model file unavailable: {0}")]
    MissingFile(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub max_length: usize,
    pub quantized: bool,
    pub threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            quantized: true,
            threads: get_physical(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_length: env_parse(MAX_LENGTH_ENV)
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_length),
            quantized: env_parse(QUANTIZED_ENV).unwrap_or(defaults.quantized),
            threads: env_parse(THREAD_ENV)
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.threads),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
