//! Translation session: a single-threaded loop that folds user actions and
//! worker responses through [`reduce`] and publishes the resulting view.

mod reducer;

pub use reducer::{reduce, Action, SessionEvent, SessionState, TranslationState};

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};

use serde_json::Value;
use thiserror::Error;

use crate::worker::pipeline::PipelineLoader;
use crate::worker::{WorkerError, WorkerHandle};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Translation session has stopped")]
    Closed,
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error("Failed to start translation session: {0}")]
    Spawn(#[from] std::io::Error),
}

enum LoopMessage {
    Event(SessionEvent),
    Raw(Value),
    Shutdown,
}

pub struct TranslationSession {
    tx: Sender<LoopMessage>,
    snapshot: Arc<RwLock<TranslationState>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl TranslationSession {
    /// Starts the worker and the session loop. `on_state` runs on the loop
    /// thread after every change to the view.
    pub fn spawn<S>(
        loader: Arc<dyn PipelineLoader>,
        initial: TranslationState,
        on_state: S,
    ) -> Result<Self, SessionError>
    where
        S: Fn(&TranslationState) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let worker_tx = tx.clone();
        let worker = WorkerHandle::spawn(loader, move |response| {
            let _ = worker_tx.send(LoopMessage::Event(SessionEvent::Worker(response)));
        })?;

        let state = SessionState::new(initial);
        let snapshot = Arc::new(RwLock::new(state.view.clone()));
        let loop_snapshot = Arc::clone(&snapshot);
        let thread = thread::Builder::new()
            .name("translation-session".into())
            .spawn(move || run_loop(state, worker, rx, loop_snapshot, on_state))?;

        Ok(Self {
            tx,
            snapshot,
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn dispatch(&self, action: Action) -> Result<(), SessionError> {
        self.tx
            .send(LoopMessage::Event(SessionEvent::Action(action)))
            .map_err(|_| SessionError::Closed)
    }

    /// Forwards a raw `{type, payload}` envelope straight to the worker.
    pub fn post_raw(&self, raw: Value) -> Result<(), SessionError> {
        self.tx
            .send(LoopMessage::Raw(raw))
            .map_err(|_| SessionError::Closed)
    }

    pub fn state(&self) -> TranslationState {
        match self.snapshot.read() {
            Ok(view) => view.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Stops the loop and the worker. Safe to call more than once.
    pub fn shutdown(&self) {
        let _ = self.tx.send(LoopMessage::Shutdown);
        let handle = self.thread.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("Translation session thread panicked");
            }
        }
    }
}

impl Drop for TranslationSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop<S>(
    mut state: SessionState,
    worker: WorkerHandle,
    rx: Receiver<LoopMessage>,
    snapshot: Arc<RwLock<TranslationState>>,
    on_state: S,
) where
    S: Fn(&TranslationState),
{
    on_state(&state.view);

    for message in rx {
        let event = match message {
            LoopMessage::Event(event) => event,
            LoopMessage::Raw(raw) => {
                if let Err(e) = worker.post_raw(raw) {
                    log::error!("Failed to forward message to worker: {e}");
                }
                continue;
            }
            LoopMessage::Shutdown => break,
        };

        let previous = state.view.clone();
        let (next, requests) = reduce(state, event);
        state = next;

        for request in requests {
            if let Err(e) = worker.post(request) {
                log::error!("Failed to post to worker: {e}");
            }
        }

        if state.view != previous {
            if let Ok(mut view) = snapshot.write() {
                *view = state.view.clone();
            }
            on_state(&state.view);
        }
    }

    worker.terminate();
    log::info!("Translation session stopped");
}
