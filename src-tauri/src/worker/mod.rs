//! Background inference worker.
//!
//! The worker owns at most one loaded pipeline and handles one request at a
//! time on its own thread. Every outcome, including failures, is reported
//! back through the emitter as a [`WorkerResponse`]; nothing escapes the
//! thread as a panic.

pub mod pipeline;
pub mod protocol;

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;

use pipeline::{Pipeline, PipelineError, PipelineLoader};
use protocol::{
    decode_request, ErrorCode, LoadModelPayload, Status, TranslatePayload, WorkerRequest,
    WorkerResponse,
};

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to load model {model_id}: {source}")]
    Load {
        model_id: String,
        source: PipelineError,
    },
    #[error("Model not loaded")]
    ModelNotLoaded,
    #[error("Empty text to translate")]
    EmptyInput,
    #[error("Translation failed: {0}")]
    Translate(PipelineError),
    #[error("Inference worker is not running")]
    Disconnected,
    #[error("Failed to start inference worker: {0}")]
    Spawn(#[from] std::io::Error),
}

impl WorkerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Load { .. } | Self::Spawn(_) => ErrorCode::LoadFailed,
            Self::ModelNotLoaded => ErrorCode::ModelNotLoaded,
            Self::EmptyInput => ErrorCode::EmptyInput,
            Self::Translate(_) | Self::Disconnected => ErrorCode::TranslateFailed,
        }
    }
}

enum Inbox {
    Request(WorkerRequest),
    Raw(Value),
}

struct ActivePipeline {
    model_id: String,
    pipeline: Box<dyn Pipeline>,
}

struct InferenceWorker<E> {
    loader: Arc<dyn PipelineLoader>,
    active: Option<ActivePipeline>,
    emit: E,
}

impl<E: Fn(WorkerResponse)> InferenceWorker<E> {
    fn run(mut self, inbox: Receiver<Inbox>) {
        log::info!("Inference worker started");
        for message in inbox {
            match message {
                Inbox::Request(request) => self.dispatch(request),
                Inbox::Raw(raw) => match decode_request(raw) {
                    Ok(Some(request)) => self.dispatch(request),
                    Ok(None) => {}
                    Err(e) => {
                        log::warn!("Malformed worker message: {e}");
                        (self.emit)(WorkerResponse::error(
                            ErrorCode::UnknownMessage,
                            format!("Malformed message: {e}"),
                        ));
                    }
                },
            }
        }
        log::info!("Inference worker stopped");
    }

    fn dispatch(&mut self, request: WorkerRequest) {
        let kind = request.kind();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.handle(request)));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("Worker {kind} failed: {e}");
                (self.emit)(WorkerResponse::error(e.code(), e.to_string()));
            }
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!("Worker {kind} panicked: {reason}");
                (self.emit)(WorkerResponse::error(
                    ErrorCode::WorkerPanic,
                    format!("Worker crashed while handling {kind}: {reason}"),
                ));
            }
        }
    }

    fn handle(&mut self, request: WorkerRequest) -> Result<(), WorkerError> {
        match request {
            WorkerRequest::LoadModel(payload) => self.load_model(payload),
            WorkerRequest::UnloadModel(_) => {
                if let Some(active) = self.active.take() {
                    log::info!("Unloading model {}", active.model_id);
                }
                (self.emit)(WorkerResponse::status(Status::Idle, "Model unloaded"));
                Ok(())
            }
            WorkerRequest::Translate(payload) => self.translate(payload),
        }
    }

    fn load_model(&mut self, payload: LoadModelPayload) -> Result<(), WorkerError> {
        let model_id = payload.model_id;
        if self.active.as_ref().is_some_and(|a| a.model_id == model_id) {
            log::debug!("Model {model_id} already loaded");
            (self.emit)(WorkerResponse::loaded(&model_id));
            return Ok(());
        }

        // Release the previous pair first so two models are never resident.
        if let Some(previous) = self.active.take() {
            log::info!("Releasing model {}", previous.model_id);
        }

        let start = Instant::now();
        log::info!(
            "Loading model {model_id} ({} -> {})",
            payload.source_lang,
            payload.target_lang
        );
        (self.emit)(WorkerResponse::status(Status::Loading, "Loading model..."));

        let emit = &self.emit;
        let pipeline = self
            .loader
            .load(&model_id, &mut |p| {
                emit(WorkerResponse::progress(
                    p.progress,
                    Some(format!("Downloading {}...", p.file)),
                ))
            })
            .map_err(|source| WorkerError::Load {
                model_id: model_id.clone(),
                source,
            })?;

        log::info!("Model {model_id} loaded in {:?}", start.elapsed());
        self.active = Some(ActivePipeline {
            model_id: model_id.clone(),
            pipeline,
        });
        (self.emit)(WorkerResponse::loaded(&model_id));
        (self.emit)(WorkerResponse::status(Status::Ready, "Model loaded"));
        Ok(())
    }

    fn translate(&mut self, payload: TranslatePayload) -> Result<(), WorkerError> {
        let active = self.active.as_mut().ok_or(WorkerError::ModelNotLoaded)?;
        if payload.text.trim().is_empty() {
            return Err(WorkerError::EmptyInput);
        }

        let emit = &self.emit;
        emit(WorkerResponse::status(Status::Translating, "Translating..."));

        let translation = active
            .pipeline
            .translate(
                &payload.text,
                &payload.source_lang,
                &payload.target_lang,
                &mut |partial| emit(WorkerResponse::update(partial)),
            )
            .map_err(WorkerError::Translate)?;

        emit(WorkerResponse::result(translation.text, translation.confidence));
        emit(WorkerResponse::status(Status::Complete, "Translation complete"));
        Ok(())
    }
}

/// Owning handle to a running worker. Dropping it stops the worker after the
/// request in flight finishes.
pub struct WorkerHandle {
    inbox: Option<Sender<Inbox>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn spawn<E>(loader: Arc<dyn PipelineLoader>, emit: E) -> Result<Self, WorkerError>
    where
        E: Fn(WorkerResponse) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker = InferenceWorker {
            loader,
            active: None,
            emit,
        };
        let thread = thread::Builder::new()
            .name("inference-worker".into())
            .spawn(move || worker.run(rx))?;

        Ok(Self {
            inbox: Some(tx),
            thread: Some(thread),
        })
    }

    pub fn post(&self, request: WorkerRequest) -> Result<(), WorkerError> {
        log::debug!("Posting {} to worker", request.kind());
        self.send(Inbox::Request(request))
    }

    /// Posts an undecoded `{type, payload}` envelope. Unknown types are
    /// ignored by the worker; malformed known types are answered with an
    /// `unknown_message` error.
    pub fn post_raw(&self, raw: Value) -> Result<(), WorkerError> {
        self.send(Inbox::Raw(raw))
    }

    pub fn terminate(mut self) {
        self.shutdown();
    }

    fn send(&self, message: Inbox) -> Result<(), WorkerError> {
        self.inbox
            .as_ref()
            .ok_or(WorkerError::Disconnected)?
            .send(message)
            .map_err(|_| WorkerError::Disconnected)
    }

    fn shutdown(&mut self) {
        self.inbox.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Inference worker thread panicked during shutdown");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
