//! HTTP fetch boundary shared by the model cache and the offline asset layer.

mod offline;

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, ETAG};
use thiserror::Error;

pub use offline::{
    AssetRequest, AssetResponse, Body, Destination, OfflineCache, ResponseSource, MODEL_CACHE,
    STATIC_CACHE,
};

const USER_AGENT: &str = concat!("offline-translate/", env!("CARGO_PKG_VERSION"));
const LINKED_ETAG: &str = "x-linked-etag";
const READ_BUFFER: usize = 8192;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{url}: request failed: {reason}")]
    Request { url: String, reason: String },
    #[error("{url}: read failed: {reason}")]
    Read { url: String, reason: String },
    #[error("{url}: write failed: {reason}")]
    Write { url: String, reason: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP client unavailable: {0}")]
    Client(String),
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Request { .. } | Self::Read { .. } => {
                "Could not reach the model server. Check your internet connection and try again."
            }
            Self::Write { .. } => {
                "The download could not be saved. Check disk space and permissions."
            }
            Self::InvalidUrl(_) | Self::Client(_) => {
                "The model server address is not valid. Check the model host in settings."
            }
        }
    }
}

pub struct FetchResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub etag: Option<String>,
    pub body: Box<dyn Read + Send>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchHead {
    pub status: u16,
    pub content_length: Option<u64>,
    pub etag: Option<String>,
}

/// Outbound HTTP. Implemented over `reqwest` in the app and faked in tests.
pub trait Fetcher: Send + Sync {
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;
    fn head(&self, url: &str) -> Result<FetchHead, FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        (**self).get(url)
    }

    fn head(&self, url: &str) -> Result<FetchHead, FetchError> {
        (**self).head(url)
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        // Model downloads are large; only connecting is bounded.
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self.client.get(url).send().map_err(|e| FetchError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        let etag = etag_from(response.headers());
        log::debug!("GET {url} -> {status} (content-length: {content_length:?})");

        Ok(FetchResponse {
            status,
            content_length,
            etag,
            body: Box::new(response),
        })
    }

    fn head(&self, url: &str) -> Result<FetchHead, FetchError> {
        let response = self.client.head(url).send().map_err(|e| FetchError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(FetchHead {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            etag: etag_from(response.headers()),
        })
    }
}

fn etag_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LINKED_ETAG)
        .or_else(|| headers.get(ETAG))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim_matches('"').to_string())
}

/// Pumps `body` into `sink` chunk by chunk, returning the byte count.
pub(crate) fn stream_body<S>(url: &str, body: &mut dyn Read, mut sink: S) -> Result<u64, FetchError>
where
    S: FnMut(&[u8], u64) -> Result<(), FetchError>,
{
    let mut buffer = [0; READ_BUFFER];
    let mut received: u64 = 0;

    loop {
        let bytes_read = body.read(&mut buffer).map_err(|e| FetchError::Read {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if bytes_read == 0 {
            break;
        }

        received += bytes_read as u64;
        sink(&buffer[..bytes_read], received)?;
    }

    Ok(received)
}
