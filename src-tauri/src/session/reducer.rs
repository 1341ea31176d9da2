use serde::Serialize;

use crate::catalog;
use crate::worker::protocol::{ErrorCode, Status, WorkerRequest, WorkerResponse};

/// What the UI renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationState {
    pub source_lang: String,
    pub target_lang: String,
    pub input_text: String,
    pub output_text: String,
    pub is_loading: bool,
    pub is_translating: bool,
    pub progress: f32,
    pub status: Status,
    pub error: Option<String>,
}

impl Default for TranslationState {
    fn default() -> Self {
        Self::with_pair("en", "es")
    }
}

impl TranslationState {
    pub fn with_pair(source_lang: &str, target_lang: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            input_text: String::new(),
            output_text: String::new(),
            is_loading: false,
            is_translating: false,
            progress: 0.0,
            status: Status::Idle,
            error: None,
        }
    }

    fn pair_selected(&self) -> bool {
        !self.source_lang.is_empty()
            && !self.target_lang.is_empty()
            && self.source_lang != self.target_lang
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetSourceLang(String),
    SetTargetLang(String),
    SetInputText(String),
    Translate,
    Clear,
    SwapLanguages,
    LoadModel,
    UnloadModel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Action(Action),
    Worker(WorkerResponse),
}

impl From<Action> for SessionEvent {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl From<WorkerResponse> for SessionEvent {
    fn from(response: WorkerResponse) -> Self {
        Self::Worker(response)
    }
}

/// Reducer state: the rendered view plus bookkeeping for in-flight work.
///
/// `outstanding` counts translate requests the worker has not finished.
/// The oldest `superseded` of them were replaced by a newer request or by a
/// language change; their results are dropped, last request wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub view: TranslationState,
    outstanding: usize,
    superseded: usize,
    stale_completions: usize,
    requested_model: Option<String>,
}

impl SessionState {
    pub fn new(view: TranslationState) -> Self {
        let mut state = Self {
            view,
            ..Self::default()
        };
        state.select_pair();
        state
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn requested_model(&self) -> Option<&str> {
        self.requested_model.as_deref()
    }

    fn live_translation(&self) -> bool {
        self.outstanding > self.superseded
    }

    fn supersede_all(&mut self) {
        self.superseded = self.outstanding;
        if self.view.is_translating {
            self.view.is_translating = false;
        }
    }

    fn select_pair(&mut self) {
        self.view.output_text.clear();
        self.view.status = if self.view.pair_selected() {
            Status::Ready
        } else {
            Status::Idle
        };
    }
}

pub fn reduce(state: SessionState, event: SessionEvent) -> (SessionState, Vec<WorkerRequest>) {
    match event {
        SessionEvent::Action(action) => apply_action(state, action),
        SessionEvent::Worker(response) => (apply_response(state, response), Vec::new()),
    }
}

fn apply_action(mut state: SessionState, action: Action) -> (SessionState, Vec<WorkerRequest>) {
    let mut requests = Vec::new();

    match action {
        Action::SetSourceLang(lang) => {
            if lang != state.view.source_lang {
                state.view.source_lang = lang;
                state.supersede_all();
                state.select_pair();
            }
        }
        Action::SetTargetLang(lang) => {
            if lang != state.view.target_lang {
                state.view.target_lang = lang;
                state.supersede_all();
                state.select_pair();
            }
        }
        Action::SetInputText(text) => state.view.input_text = text,
        Action::Translate => {
            if state.view.input_text.trim().is_empty() {
                log::debug!("Ignoring translate with empty input");
                return (state, requests);
            }

            let view = &state.view;
            let resolved = match catalog::resolve_model(&view.source_lang, &view.target_lang) {
                Ok(resolved) => resolved,
                Err(e) => {
                    log::warn!("{e}");
                    state.view.status = Status::Error;
                    state.view.error = Some(e.to_string());
                    return (state, requests);
                }
            };

            if state.requested_model.as_deref() != Some(resolved.model_id.as_str()) {
                requests.push(WorkerRequest::load_model(
                    &resolved.model_id,
                    &view.source_lang,
                    &view.target_lang,
                ));
                state.requested_model = Some(resolved.model_id);
            }
            requests.push(WorkerRequest::translate(
                &state.view.input_text,
                &state.view.source_lang,
                &state.view.target_lang,
            ));

            state.superseded = state.outstanding;
            state.outstanding += 1;
            state.view.is_translating = true;
            state.view.status = Status::Translating;
            state.view.output_text.clear();
            state.view.error = None;
        }
        Action::Clear => {
            state.supersede_all();
            state.view.input_text.clear();
            state.view.output_text.clear();
            state.view.error = None;
            if matches!(state.view.status, Status::Translating | Status::Error) {
                state.select_pair();
            }
        }
        Action::SwapLanguages => {
            let view = &mut state.view;
            std::mem::swap(&mut view.source_lang, &mut view.target_lang);
            view.input_text = std::mem::take(&mut view.output_text);
            state.supersede_all();
            state.select_pair();
        }
        Action::LoadModel => {
            let view = &state.view;
            match catalog::resolve_model(&view.source_lang, &view.target_lang) {
                Ok(resolved) => {
                    requests.push(WorkerRequest::load_model(
                        &resolved.model_id,
                        &view.source_lang,
                        &view.target_lang,
                    ));
                    state.requested_model = Some(resolved.model_id);
                    state.view.status = Status::Loading;
                    state.view.is_loading = true;
                    state.view.progress = 0.0;
                    state.view.error = None;
                }
                Err(e) => {
                    log::warn!("{e}");
                    state.view.status = Status::Error;
                    state.view.error = Some(e.to_string());
                }
            }
        }
        Action::UnloadModel => {
            requests.push(WorkerRequest::unload_model());
            state.requested_model = None;
        }
    }

    (state, requests)
}

fn apply_response(mut state: SessionState, response: WorkerResponse) -> SessionState {
    match response {
        WorkerResponse::Status(payload) => apply_status(&mut state, payload.status, payload.message),
        WorkerResponse::Progress(payload) => {
            state.view.progress = payload.progress.clamp(0.0, 100.0);
            state.view.is_loading = true;
            if state.outstanding == 0 {
                state.view.status = Status::Loading;
            }
        }
        WorkerResponse::Loaded(payload) => {
            log::info!("Model {} ready", payload.model_id);
            // Raw envelopes can switch models behind the reducer's back.
            state.requested_model = Some(payload.model_id);
            state.view.is_loading = false;
            state.view.progress = 100.0;
            if state.outstanding == 0 {
                state.view.status = Status::Ready;
            }
        }
        WorkerResponse::Update(payload) => {
            if state.superseded == 0 {
                state.view.output_text = payload.translation;
            }
        }
        WorkerResponse::Result(payload) => {
            if finish_translation(&mut state) {
                state.stale_completions += 1;
                return state;
            }
            state.view.output_text = payload.translation;
            state.view.is_translating = state.live_translation();
            state.view.is_loading = false;
            state.view.error = None;
            if !state.view.is_translating {
                state.view.status = Status::Complete;
            }
        }
        WorkerResponse::Error(payload) => {
            let code = payload.code;
            if code.is_some_and(ErrorCode::ends_translation) && finish_translation(&mut state) {
                log::debug!("Dropping error for superseded translation: {}", payload.message);
                return state;
            }
            if code == Some(ErrorCode::LoadFailed) {
                state.requested_model = None;
            }

            // Keep the load failure visible rather than the follow-up complaint.
            let keep_previous = code == Some(ErrorCode::ModelNotLoaded)
                && state.view.status == Status::Error
                && state.view.error.is_some();
            if !keep_previous {
                state.view.error = Some(payload.message);
            }
            state.view.status = Status::Error;
            state.view.is_loading = false;
            state.view.is_translating = state.live_translation();
        }
    }
    state
}

/// Accounts for one finished translate request. Returns `true` when it was
/// superseded and its outcome must be dropped.
fn finish_translation(state: &mut SessionState) -> bool {
    if state.outstanding == 0 {
        return false;
    }
    state.outstanding -= 1;
    if state.superseded > 0 {
        state.superseded -= 1;
        return true;
    }
    false
}

fn apply_status(state: &mut SessionState, status: Status, message: Option<String>) {
    if status == Status::Idle {
        // The worker only goes idle after an unload.
        state.requested_model = None;
    }
    if status == Status::Complete && state.stale_completions > 0 {
        state.stale_completions -= 1;
        return;
    }

    if state.outstanding > 0 {
        match status {
            Status::Loading => state.view.is_loading = true,
            Status::Ready => state.view.is_loading = false,
            Status::Translating if state.live_translation() => {
                state.view.status = Status::Translating;
                state.view.is_translating = true;
            }
            _ => {}
        }
        return;
    }

    match status {
        Status::Loading => state.view.is_loading = true,
        Status::Ready | Status::Idle => state.view.is_loading = false,
        Status::Translating => state.view.is_translating = true,
        Status::Complete => state.view.is_translating = false,
        Status::Error => {
            if let Some(message) = message {
                state.view.error = Some(message);
            }
        }
    }
    state.view.status = status;
}
