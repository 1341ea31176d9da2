use crate::api::*;
use crate::components::language::LanguageBar;
use crate::components::models::ModelManager;
use crate::components::settings::SettingsSection;
use crate::components::status::{OfflineIndicator, StatusIndicator};
use crate::components::translator::{PendingInput, TranslatorPanel};
use crate::utils::is_online;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn App() -> impl IntoView {
    let (state, set_state) = signal(TranslationStateDto::default());
    let (draft, set_draft) = signal(String::new());
    let pending = StoredValue::new(PendingInput::default());
    let (languages, set_languages) = signal(Vec::<LanguageDto>::new());
    let (download_progress, set_download_progress) = signal::<Option<DownloadProgressDto>>(None);
    let (online, set_online) = signal(is_online());
    let (notice, set_notice) = signal::<Option<String>>(None);
    let (settings, set_settings) = signal(SettingsDto::default());
    let (shortcut, set_shortcut) = signal(String::new());

    let apply_state = move |next: TranslationStateDto| {
        let mut echoed = false;
        pending.update_value(|p| echoed = p.acknowledge(&next.input_text));
        if !echoed {
            set_draft.set(next.input_text.clone());
        }
        set_state.set(next);
    };

    spawn_local(async move {
        listen_payload(STATE_EVENT, apply_state).await;
    });

    spawn_local(async move {
        listen_payload(DOWNLOAD_PROGRESS_EVENT, move |p: DownloadProgressDto| {
            set_download_progress.set(Some(p));
        })
        .await;
    });

    let _ = window_event_listener_untyped("online", move |_| set_online.set(true));
    let _ = window_event_listener_untyped("offline", move |_| set_online.set(false));

    spawn_local(async move {
        match fetch_state().await {
            Ok(current) => {
                set_draft.set(current.input_text.clone());
                set_state.set(current);
            }
            Err(e) => set_notice.set(Some(e)),
        }

        match fetch_catalog().await {
            Ok(catalog) => set_languages.set(catalog.languages),
            Err(e) => set_notice.set(Some(e)),
        }

        if let Ok(s) = fetch_settings().await {
            set_settings.set(s);
        }

        let current = fetch_current_shortcut().await.ok().flatten();
        if let Some(s) = current {
            set_shortcut.set(s);
        } else if let Ok(Some(s)) = fetch_default_shortcut().await {
            set_shortcut.set(s);
        }
    });

    view! {
        <main class="shell">
            <header class="hero">
                <p class="eyebrow">"Private, on-device translation"</p>
                <h1>"Offline Translate"</h1>
                <OfflineIndicator online />
            </header>

            <LanguageBar languages state set_notice />
            <StatusIndicator state />
            <Show when=move || notice.get().is_some()>
                <div class="notice" on:click=move |_| set_notice.set(None)>
                    {move || notice.get().unwrap_or_default()}
                </div>
            </Show>

            <TranslatorPanel state draft set_draft pending set_notice />

            <section class="grid">
                <div class="card settings-card">
                    <div class="card-header"><p class="eyebrow">"Models"</p></div>
                    <ModelManager state download_progress set_download_progress online set_notice />
                </div>

                <div class="card settings-card">
                    <div class="card-header"><p class="eyebrow">"Settings"</p></div>
                    <SettingsSection settings set_settings shortcut set_shortcut set_notice />
                </div>
            </section>
        </main>
    }
}
