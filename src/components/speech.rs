use crate::speech::{self, Recognizer};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn VoiceInputButton(
    lang: Signal<String>,
    disabled: Signal<bool>,
    on_final: Callback<String>,
    on_interim: Callback<String>,
    set_notice: WriteSignal<Option<String>>,
) -> impl IntoView {
    let supported = speech::recognition_supported();
    let (listening, set_listening) = signal(false);
    let recognizer = StoredValue::new_local(None::<Recognizer>);

    let toggle = move |_| {
        if listening.get_untracked() {
            recognizer.update_value(|r| {
                if let Some(active) = r.take() {
                    active.stop();
                }
            });
            set_listening.set(false);
            return;
        }

        let started = Recognizer::start(
            &lang.get_untracked(),
            move |text, is_final| {
                if is_final {
                    on_final.run(text);
                } else {
                    on_interim.run(text);
                }
            },
            move |message| set_notice.set(Some(message)),
            move || set_listening.set(false),
        );
        match started {
            Ok(active) => {
                recognizer.set_value(Some(active));
                set_listening.set(true);
            }
            Err(e) => set_notice.set(Some(e)),
        }
    };

    view! {
        <Show when=move || supported>
            <button
                class="ghost compact"
                class:active=move || listening.get()
                title=move || if listening.get() { "Stop listening" } else { "Voice input" }
                disabled=move || disabled.get()
                on:click=toggle
            >
                {move || if listening.get() { "Stop" } else { "Speak" }}
            </button>
        </Show>
    }
}

#[component]
pub fn SpeakButton(text: Signal<String>, lang: Signal<String>, set_notice: WriteSignal<Option<String>>) -> impl IntoView {
    let supported = speech::synthesis_supported();

    let speak_action = move |_| {
        let current = text.get_untracked();
        if current.trim().is_empty() {
            return;
        }
        if let Err(e) = speech::speak(&current, &lang.get_untracked()) {
            set_notice.set(Some(e));
        }
    };

    on_cleanup(speech::stop_speaking);

    view! {
        <Show when=move || supported>
            <button
                class="ghost compact"
                title="Listen"
                disabled=move || text.get().trim().is_empty()
                on:click=speak_action
            >
                "Listen"
            </button>
        </Show>
    }
}

#[component]
pub fn CopyButton(text: Signal<String>, set_notice: WriteSignal<Option<String>>) -> impl IntoView {
    let (copied, set_copied) = signal(false);

    let copy_action = move |_| {
        let current = text.get_untracked();
        spawn_local(async move {
            match speech::copy_to_clipboard(&current).await {
                Ok(()) => set_copied.set(true),
                Err(e) => set_notice.set(Some(format!("Copy failed: {e}"))),
            }
        });
    };

    Effect::new(move |_| {
        text.track();
        set_copied.set(false);
    });

    view! {
        <button
            class="ghost compact"
            title="Copy translation"
            disabled=move || text.get().is_empty()
            on:click=copy_action
        >
            {move || if copied.get() { "Copied" } else { "Copy" }}
        </button>
    }
}
