#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use offline_translate_lib::net::{FetchError, FetchHead, FetchResponse, Fetcher};
use offline_translate_lib::worker::pipeline::{
    LoadProgress, Pipeline, PipelineError, PipelineLoader, Translation,
};

pub const HOST: &str = "https://models.test";

pub fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "offline_translate_{label}_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[derive(Clone, Debug)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    pub etag: Option<String>,
    /// Overrides the advertised length; defaults to the body length.
    pub content_length: Option<u64>,
}

impl Route {
    pub fn ok(body: &[u8]) -> Self {
        Self {
            status: 200,
            body: body.to_vec(),
            etag: None,
            content_length: Some(body.len() as u64),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: b"error".to_vec(),
            etag: None,
            content_length: None,
        }
    }

    pub fn with_etag(mut self, etag: &str) -> Self {
        self.etag = Some(etag.to_string());
        self
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }
}

/// In-memory stand-in for the network. Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, Route>>,
    gets: Mutex<Vec<String>>,
    heads: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, route: Route) {
        self.routes.lock().unwrap().insert(url.to_string(), route);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn get_count(&self, url: &str) -> usize {
        self.gets.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_gets(&self) -> usize {
        self.gets.lock().unwrap().len()
    }

    pub fn head_count(&self) -> usize {
        self.heads.lock().unwrap().len()
    }

    fn lookup(&self, url: &str) -> Result<Route, FetchError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Request {
                url: url.to_string(),
                reason: "network unreachable".to_string(),
            });
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Route::status(404)))
    }
}

impl Fetcher for FakeFetcher {
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.gets.lock().unwrap().push(url.to_string());
        let route = self.lookup(url)?;
        Ok(FetchResponse {
            status: route.status,
            content_length: route.content_length,
            etag: route.etag,
            body: Box::new(Cursor::new(route.body)),
        })
    }

    fn head(&self, url: &str) -> Result<FetchHead, FetchError> {
        self.heads.lock().unwrap().push(url.to_string());
        let route = self.lookup(url)?;
        Ok(FetchHead {
            status: route.status,
            content_length: route.content_length,
            etag: route.etag,
        })
    }
}

/// Echoes its input prefixed with the model id, word by word.
pub struct EchoPipeline {
    model_id: String,
    resident: Arc<AtomicUsize>,
}

impl Drop for EchoPipeline {
    fn drop(&mut self) {
        self.resident.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Pipeline for EchoPipeline {
    fn translate(
        &mut self,
        text: &str,
        _source_lang: &str,
        _target_lang: &str,
        on_partial: &mut dyn FnMut(&str),
    ) -> Result<Translation, PipelineError> {
        match text {
            "boom" => panic!("decoder exploded"),
            "fail" => return Err(PipelineError::Tokenizer("cannot tokenize".into())),
            _ => {}
        }

        let mut partial = format!("[{}]", self.model_id);
        for word in text.split_whitespace() {
            partial.push(' ');
            partial.push_str(word);
            on_partial(&partial);
        }
        Ok(Translation {
            text: partial,
            confidence: Some(0.9),
        })
    }
}

/// Loads [`EchoPipeline`]s; ids containing `broken` fail to load.
#[derive(Default)]
pub struct EchoLoader {
    pub loads: Mutex<Vec<String>>,
    /// Pipelines alive at the moment each load started.
    pub resident_at_load: Mutex<Vec<usize>>,
    resident: Arc<AtomicUsize>,
}

impl EchoLoader {
    pub fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }
}

impl PipelineLoader for EchoLoader {
    fn load(
        &self,
        model_id: &str,
        on_progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<Box<dyn Pipeline>, PipelineError> {
        self.loads.lock().unwrap().push(model_id.to_string());
        self.resident_at_load
            .lock()
            .unwrap()
            .push(self.resident.load(Ordering::SeqCst));

        on_progress(LoadProgress {
            file: "config.json".into(),
            progress: 50.0,
        });
        if model_id.contains("broken") {
            return Err(PipelineError::MissingFile(format!("{model_id}/config.json")));
        }
        on_progress(LoadProgress {
            file: "config.json".into(),
            progress: 100.0,
        });

        self.resident.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(EchoPipeline {
            model_id: model_id.to_string(),
            resident: Arc::clone(&self.resident),
        }))
    }
}
