use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{stream_body, FetchError, Fetcher};

pub const STATIC_CACHE: &str = "static-v1";
pub const MODEL_CACHE: &str = "models-v1";

const STATIC_ASSETS: &[&str] = &["/", "/index.html", "/manifest.json"];
const OFFLINE_INDEX: &str = "/index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Script,
    Style,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub url: String,
    pub destination: Destination,
    pub navigate: bool,
}

impl AssetRequest {
    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination: Destination::Document,
            navigate: true,
        }
    }

    pub fn asset(url: impl Into<String>, destination: Destination) -> Self {
        Self {
            url: url.into(),
            destination,
            navigate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl Body {
    pub fn read_all(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::File(path) => fs::read(path),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub source: ResponseSource,
    pub body: Body,
}

impl AssetResponse {
    fn offline(status: u16, text: &str) -> Self {
        Self {
            status,
            source: ResponseSource::Offline,
            body: Body::Bytes(text.as_bytes().to_vec()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
}

/// Offline layer in front of a [`Fetcher`].
///
/// Requests to a model host are answered cache-first and successful `200`
/// responses are written back. Everything else goes network-first; documents,
/// scripts and styles are remembered so they can be served when the network
/// fails, with a synthesized placeholder when nothing is cached.
pub struct OfflineCache<F> {
    root: PathBuf,
    origin: String,
    model_hosts: Vec<String>,
    fetcher: F,
}

impl<F: Fetcher> OfflineCache<F> {
    pub fn new<P: AsRef<Path>>(
        root: P,
        origin: impl Into<String>,
        model_hosts: Vec<String>,
        fetcher: F,
    ) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            origin: origin.into().trim_end_matches('/').to_string(),
            model_hosts,
            fetcher,
        }
    }

    /// Pre-caches the app shell. Failures are logged and skipped.
    pub fn install(&self) {
        for asset in STATIC_ASSETS {
            let url = format!("{}{asset}", self.origin);
            let fetched = self.fetcher.get(&url).and_then(|mut response| {
                if !response.is_success() {
                    return Err(FetchError::Request {
                        url: url.clone(),
                        reason: format!("unexpected status {}", response.status),
                    });
                }
                let bytes = read_to_vec(&url, &mut *response.body)?;
                self.store(STATIC_CACHE, &url, response.status, &bytes)
            });

            if let Err(e) = fetched {
                log::warn!("Failed to pre-cache {url}: {e}");
            }
        }
    }

    /// Removes cache generations other than the current ones.
    pub fn activate(&self) {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return;
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == STATIC_CACHE || name == MODEL_CACHE {
                continue;
            }
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                log::info!("Removing stale cache generation {name}");
                if let Err(e) = fs::remove_dir_all(entry.path()) {
                    log::warn!("Failed to remove stale cache {name}: {e}");
                }
            }
        }
    }

    pub fn clear(&self) -> std::io::Result<()> {
        for cache in [STATIC_CACHE, MODEL_CACHE] {
            match fs::remove_dir_all(self.root.join(cache)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        log::info!("Offline caches cleared");
        Ok(())
    }

    pub fn is_model_request(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        host.contains("cdn") || self.model_hosts.iter().any(|h| h == host)
    }

    pub fn respond(&self, request: &AssetRequest) -> Result<AssetResponse, FetchError> {
        self.respond_with_progress(request, &mut |_, _| {})
    }

    /// `on_progress` receives `(received, total)` while a model file streams in.
    pub fn respond_with_progress(
        &self,
        request: &AssetRequest,
        on_progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<AssetResponse, FetchError> {
        if self.is_model_request(&request.url) {
            self.cache_first(&request.url, on_progress)
        } else {
            Ok(self.network_first(request))
        }
    }

    fn cache_first(
        &self,
        url: &str,
        on_progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<AssetResponse, FetchError> {
        let path = self.entry_path(MODEL_CACHE, url);
        if path.is_file() {
            log::debug!("Model cache hit for {url}");
            return Ok(AssetResponse {
                status: 200,
                source: ResponseSource::Cache,
                body: Body::File(path),
            });
        }

        let mut response = self.fetcher.get(url)?;
        if response.status != 200 {
            let bytes = read_to_vec(url, &mut *response.body)?;
            return Ok(AssetResponse {
                status: response.status,
                source: ResponseSource::Network,
                body: Body::Bytes(bytes),
            });
        }

        let dir = self.root.join(MODEL_CACHE);
        fs::create_dir_all(&dir).map_err(|e| write_error(url, e))?;
        let tmp = path.with_extension("download");
        let mut file = fs::File::create(&tmp).map_err(|e| write_error(url, e))?;
        let total = response.content_length;

        let streamed = stream_body(url, &mut *response.body, |chunk, received| {
            file.write_all(chunk).map_err(|e| write_error(url, e))?;
            on_progress(received, total);
            Ok(())
        });

        let received = match streamed {
            Ok(received) => received,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
        };

        if let Some(expected) = total.filter(|t| *t > 0 && *t != received) {
            let _ = fs::remove_file(&tmp);
            return Err(FetchError::Read {
                url: url.to_string(),
                reason: format!("incomplete body: expected {expected} bytes, got {received}"),
            });
        }

        drop(file);
        fs::rename(&tmp, &path).map_err(|e| write_error(url, e))?;
        self.write_meta(MODEL_CACHE, url, 200)
            .map_err(|e| write_error(url, e))?;

        Ok(AssetResponse {
            status: 200,
            source: ResponseSource::Network,
            body: Body::File(path),
        })
    }

    fn network_first(&self, request: &AssetRequest) -> AssetResponse {
        let url = request.url.as_str();
        let network = self.fetcher.get(url).and_then(|mut response| {
            let bytes = read_to_vec(url, &mut *response.body)?;
            Ok((response.status, bytes))
        });

        match network {
            Ok((status, bytes)) => {
                let cacheable = matches!(
                    request.destination,
                    Destination::Document | Destination::Script | Destination::Style
                );
                if (200..300).contains(&status) && cacheable {
                    if let Err(e) = self.store(STATIC_CACHE, url, status, &bytes) {
                        log::warn!("Failed to cache {url}: {e}");
                    }
                }
                AssetResponse {
                    status,
                    source: ResponseSource::Network,
                    body: Body::Bytes(bytes),
                }
            }
            Err(e) => {
                log::debug!("Network unavailable for {url} ({e}); trying cache");
                if let Some(cached) = self.lookup(url) {
                    return cached;
                }
                if request.navigate {
                    let index = format!("{}{OFFLINE_INDEX}", self.origin);
                    return self
                        .lookup(&index)
                        .unwrap_or_else(|| AssetResponse::offline(503, "Offline"));
                }
                AssetResponse::offline(408, "Network error")
            }
        }
    }

    fn lookup(&self, url: &str) -> Option<AssetResponse> {
        [STATIC_CACHE, MODEL_CACHE].iter().find_map(|cache| {
            let path = self.entry_path(cache, url);
            path.is_file().then(|| AssetResponse {
                status: self.read_meta(cache, url).map_or(200, |m| m.status),
                source: ResponseSource::Cache,
                body: Body::File(path),
            })
        })
    }

    fn store(&self, cache: &str, url: &str, status: u16, bytes: &[u8]) -> Result<(), FetchError> {
        let dir = self.root.join(cache);
        fs::create_dir_all(&dir).map_err(|e| write_error(url, e))?;
        crate::storage::write_atomic(&self.entry_path(cache, url), bytes).map_err(|e| {
            FetchError::Write {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.write_meta(cache, url, status)
            .map_err(|e| write_error(url, e))
    }

    fn write_meta(&self, cache: &str, url: &str, status: u16) -> std::io::Result<()> {
        let meta = EntryMeta {
            url: url.to_string(),
            status,
        };
        let bytes = serde_json::to_vec(&meta).map_err(std::io::Error::other)?;
        fs::write(self.entry_path(cache, url).with_extension("meta"), bytes)
    }

    fn read_meta(&self, cache: &str, url: &str) -> Option<EntryMeta> {
        let bytes = fs::read(self.entry_path(cache, url).with_extension("meta")).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn entry_path(&self, cache: &str, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.root.join(cache).join(format!("{digest:x}"))
    }
}

fn read_to_vec(url: &str, body: &mut dyn std::io::Read) -> Result<Vec<u8>, FetchError> {
    let mut bytes = Vec::new();
    stream_body(url, body, |chunk, _| {
        bytes.extend_from_slice(chunk);
        Ok(())
    })?;
    Ok(bytes)
}

fn write_error(url: &str, e: std::io::Error) -> FetchError {
    FetchError::Write {
        url: url.to_string(),
        reason: e.to_string(),
    }
}
