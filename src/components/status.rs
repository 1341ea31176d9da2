use crate::api::TranslationStateDto;
use leptos::prelude::*;

fn status_text(state: &TranslationStateDto) -> Option<String> {
    if let Some(error) = &state.error {
        return Some(error.clone());
    }
    match state.status.as_str() {
        "loading" => Some(format!("Loading model... {:.0}%", state.progress)),
        "translating" => Some("Translating...".to_string()),
        _ => None,
    }
}

#[component]
pub fn StatusIndicator(state: ReadSignal<TranslationStateDto>) -> impl IntoView {
    view! {
        {move || {
            let current = state.get();
            status_text(&current).map(|text| {
                let is_error = current.error.is_some();
                let show_bar = !is_error && current.is_loading;
                let width = format!("width: {:.0}%", current.progress.clamp(0.0, 100.0));
                view! {
                    <div class="status" class:status-error=is_error>
                        <span class="status-text">{text}</span>
                        <Show when=move || show_bar>
                            <div class="progress-track">
                                <div class="progress-fill" style=width.clone()></div>
                            </div>
                        </Show>
                    </div>
                }
            })
        }}
    }
}

#[component]
pub fn OfflineIndicator(online: ReadSignal<bool>) -> impl IntoView {
    view! {
        <span class="network-pill" class:offline=move || !online.get()>
            {move || if online.get() { "Online" } else { "Offline" }}
        </span>
    }
}
