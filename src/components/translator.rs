use crate::api::*;
use crate::components::speech::{CopyButton, SpeakButton, VoiceInputButton};
use crate::utils::{target_value, truncate_chars, MAX_INPUT_CHARS};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Input edits that were sent to the backend but not yet echoed back in a
/// state event. Echoes of these must not overwrite what the user typed since.
#[derive(Clone, Default)]
pub struct PendingInput(Vec<String>);

impl PendingInput {
    pub fn push(&mut self, text: String) {
        self.0.push(text);
    }

    /// Returns true when `echoed` is one of our own edits coming back.
    pub fn acknowledge(&mut self, echoed: &str) -> bool {
        match self.0.iter().position(|t| t == echoed) {
            Some(idx) => {
                self.0.drain(..=idx);
                true
            }
            None => {
                self.0.clear();
                false
            }
        }
    }
}

#[component]
pub fn TranslatorPanel(
    state: ReadSignal<TranslationStateDto>,
    draft: ReadSignal<String>,
    set_draft: WriteSignal<String>,
    pending: StoredValue<PendingInput>,
    set_notice: WriteSignal<Option<String>>,
) -> impl IntoView {
    let (interim, set_interim) = signal(String::new());

    let busy = Signal::derive(move || state.get().is_translating);
    let source_lang = Signal::derive(move || state.get().source_lang);
    let target_lang = Signal::derive(move || state.get().target_lang);
    let output = Signal::derive(move || state.get().output_text);

    let commit_input = move |text: String| {
        let text = truncate_chars(&text, MAX_INPUT_CHARS);
        set_draft.set(text.clone());
        pending.update_value(|p| p.push(text.clone()));
        spawn_local(async move {
            if let Err(e) = set_input_text(&text).await {
                set_notice.set(Some(e));
            }
        });
    };

    let on_final = Callback::new(move |spoken: String| {
        set_interim.set(String::new());
        let current = draft.get_untracked();
        let joined = if current.trim().is_empty() {
            spoken.trim().to_string()
        } else {
            format!("{} {}", current.trim_end(), spoken.trim())
        };
        commit_input(joined);
    });
    let on_interim = Callback::new(move |spoken: String| set_interim.set(spoken));

    let translate_action = move |_| {
        spawn_local(async move {
            if let Err(e) = translate_cmd().await {
                set_notice.set(Some(e));
            }
        });
    };

    let clear_action = move |_| {
        set_interim.set(String::new());
        spawn_local(async move {
            if let Err(e) = clear_cmd().await {
                set_notice.set(Some(e));
            }
        });
    };

    view! {
        <section class="grid">
            <div class="card">
                <div class="card-header">
                    <p class="eyebrow">"Source"</p>
                    <div class="card-actions">
                        <VoiceInputButton
                            lang=source_lang
                            disabled=busy
                            on_final
                            on_interim
                            set_notice
                        />
                        <Show when=move || !draft.get().is_empty()>
                            <button class="ghost compact" title="Clear" on:click=clear_action>
                                "✕"
                            </button>
                        </Show>
                    </div>
                </div>
                <textarea
                    class="translate-input"
                    placeholder=move || {
                        let hint = interim.get();
                        if hint.is_empty() { "Enter text to translate...".to_string() } else { hint }
                    }
                    maxlength=MAX_INPUT_CHARS
                    prop:value=move || draft.get()
                    disabled=move || busy.get()
                    on:input=move |ev| commit_input(target_value(&ev))
                ></textarea>
                <p class="char-count" class:at-limit={move || draft.get().chars().count() >= MAX_INPUT_CHARS}>
                    {move || format!("{}/{}", draft.get().chars().count(), MAX_INPUT_CHARS)}
                </p>
            </div>

            <div class="card">
                <div class="card-header">
                    <p class="eyebrow">"Translation"</p>
                    <div class="card-actions">
                        <SpeakButton text=output lang=target_lang set_notice />
                        <CopyButton text=output set_notice />
                    </div>
                </div>
                <div class="result-body">
                    <p class="result-text">
                        {move || {
                            let text = output.get();
                            if text.is_empty() { "Your translation will appear here.".to_string() } else { text }
                        }}
                    </p>
                </div>
            </div>
        </section>

        <div class="actions">
            <button
                class="primary"
                disabled=move || busy.get() || draft.get().trim().is_empty()
                on:click=translate_action
            >
                {move || if busy.get() { "Translating..." } else { "Translate" }}
            </button>
        </div>
    }
}
