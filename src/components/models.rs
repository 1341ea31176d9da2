use crate::api::*;
use crate::utils::format_bytes;
use leptos::prelude::*;
use leptos::task::spawn_local;

fn split_key(model_key: &str) -> Option<(String, String)> {
    model_key
        .split_once('-')
        .map(|(src, tgt)| (src.to_string(), tgt.to_string()))
}

#[component]
pub fn ModelManager(
    state: ReadSignal<TranslationStateDto>,
    download_progress: ReadSignal<Option<DownloadProgressDto>>,
    set_download_progress: WriteSignal<Option<DownloadProgressDto>>,
    online: ReadSignal<bool>,
    set_notice: WriteSignal<Option<String>>,
) -> impl IntoView {
    let (cached, set_cached) = signal(Vec::<CachedModelDto>::new());
    let (usage, set_usage) = signal(StorageUsageDto::default());
    let (current, set_current) = signal::<Option<CacheStatusDto>>(None);
    let (update_note, set_update_note) = signal(String::new());

    let pair = Memo::new(move |_| {
        let s = state.get();
        (s.source_lang, s.target_lang)
    });

    let refresh = move || {
        let (src, tgt) = pair.get_untracked();
        spawn_local(async move {
            match fetch_cached_models().await {
                Ok(models) => set_cached.set(models),
                Err(e) => set_notice.set(Some(e)),
            }
            if let Ok(u) = fetch_storage_usage().await {
                set_usage.set(u);
            }
            set_current.set(fetch_cache_status(&src, &tgt).await.ok());
        });
    };

    Effect::new(move |_| {
        pair.track();
        set_update_note.set(String::new());
        refresh();
    });

    let download_action = move |_| {
        let (src, tgt) = pair.get_untracked();
        set_download_progress.set(Some(DownloadProgressDto {
            model_key: format!("{src}-{tgt}"),
            progress: 0.0,
        }));
        spawn_local(async move {
            if let Err(e) = download_model_cmd(&src, &tgt).await {
                set_notice.set(Some(e));
            }
            set_download_progress.set(None);
            refresh();
        });
    };

    let check_update_action = move |_| {
        let (src, tgt) = pair.get_untracked();
        set_update_note.set("Checking...".to_string());
        spawn_local(async move {
            match check_model_update_cmd(&src, &tgt).await {
                Ok(true) => set_update_note.set("Update available".to_string()),
                Ok(false) => set_update_note.set("Up to date".to_string()),
                Err(e) => set_update_note.set(e),
            }
        });
    };

    let unload_action = move |_| {
        spawn_local(async move {
            if let Err(e) = unload_model_cmd().await {
                set_notice.set(Some(e));
            }
        });
    };

    let clear_all_action = move |_| {
        spawn_local(async move {
            if let Err(e) = clear_cached_models_cmd().await {
                set_notice.set(Some(e));
            }
            refresh();
        });
    };

    let remove = move |model_key: String| {
        let Some((src, tgt)) = split_key(&model_key) else {
            return;
        };
        spawn_local(async move {
            if let Err(e) = remove_model_cmd(&src, &tgt).await {
                set_notice.set(Some(e));
            }
            refresh();
        });
    };

    let downloading = move || download_progress.get().is_some();

    view! {
        <div class="settings-section">
            <div class="settings-row">
                <div class="settings-label">
                    <span class="settings-title">
                        {move || {
                            let (src, tgt) = pair.get();
                            format!("Current pair {src} → {tgt}")
                        }}
                    </span>
                    <span class="settings-hint">
                        {move || match current.get() {
                            Some(status) if status.is_cached => format!(
                                "Cached, {} (version {})",
                                format_bytes(status.size),
                                status.version
                            ),
                            Some(_) => "Not downloaded".to_string(),
                            None => "No model for this pair".to_string(),
                        }}
                    </span>
                    <span class="settings-hint">{move || update_note.get()}</span>
                </div>
                <div class="settings-input-group">
                    <button
                        class="ghost compact"
                        disabled=move || downloading() || !online.get() || current.get().is_none()
                        on:click=download_action
                    >
                        "Download"
                    </button>
                    <button
                        class="ghost compact"
                        disabled=move || !online.get() || current.get().is_none()
                        on:click=check_update_action
                    >
                        "Check update"
                    </button>
                    <button class="ghost compact" on:click=unload_action>"Unload"</button>
                </div>
            </div>

            <Show when=downloading>
                <div class="progress-track">
                    <div
                        class="progress-fill"
                        style=move || {
                            let pct = download_progress.get().map(|p| p.progress).unwrap_or(0.0);
                            format!("width: {:.0}%", pct.clamp(0.0, 100.0))
                        }
                    ></div>
                </div>
            </Show>

            <div class="settings-divider"></div>

            <ul class="model-list">
                <For
                    each=move || cached.get()
                    key=|m| m.model_key.clone()
                    children=move |model| {
                        let key = model.model_key.clone();
                        view! {
                            <li class="model-row">
                                <div class="settings-label">
                                    <span class="settings-title">{model.model_key.clone()}</span>
                                    <code class="path-code">{model.model_id.clone()}</code>
                                </div>
                                <span class="settings-hint">{format_bytes(model.size)}</span>
                                <button
                                    class="ghost compact"
                                    on:click=move |_| remove(key.clone())
                                >
                                    "Delete"
                                </button>
                            </li>
                        }
                    }
                />
            </ul>
            <Show when=move || cached.get().is_empty()>
                <p class="settings-hint">"No models cached yet."</p>
            </Show>

            <div class="settings-footer">
                <span class="settings-hint">
                    {move || {
                        let u = usage.get();
                        if u.quota > 0 {
                            format!("{} of {} used", format_bytes(u.used), format_bytes(u.quota))
                        } else {
                            format!("{} used", format_bytes(u.used))
                        }
                    }}
                </span>
                <button
                    class="danger compact"
                    disabled=move || cached.get().is_empty()
                    on:click=clear_all_action
                >
                    "Clear All"
                </button>
            </div>
        </div>
    }
}
