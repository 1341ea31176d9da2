use thiserror::Error;

use crate::cache::CacheError;
use crate::net::FetchError;
use crate::session::SessionError;
use crate::settings::SettingsError;
use crate::storage::StorageError;

/// Unified app errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache: {0}")]
    Cache(#[from] CacheError),

    #[error("Network: {0}")]
    Fetch(#[from] FetchError),

    #[error("Session: {0}")]
    Session(#[from] SessionError),

    #[error("Settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(e) => e.user_message().to_string(),
            Self::Cache(CacheError::UnsupportedPair(e)) => e.to_string(),
            Self::Cache(e) => e.user_message().to_string(),
            Self::Fetch(e) => e.user_message().to_string(),
            Self::Session(_) => {
                "The translator stopped unexpectedly. Restart the app and try again.".to_string()
            }
            Self::Settings(e) => e.user_message().to_string(),
            Self::Task(_) => "The operation was interrupted. Please try again.".to_string(),
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.user_message())
    }
}
