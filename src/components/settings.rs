use crate::api::*;
use crate::utils::input_value;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Applies `edit` on top of the stored settings, since the language pair
/// changes behind this panel's back.
async fn update_latest(edit: Box<dyn FnOnce(&mut SettingsDto)>) -> Result<SettingsDto, String> {
    let mut next = fetch_settings().await?;
    edit(&mut next);
    save_settings_cmd(&next).await?;
    Ok(next)
}

#[component]
pub fn SettingsSection(
    settings: ReadSignal<SettingsDto>,
    set_settings: WriteSignal<SettingsDto>,
    shortcut: ReadSignal<String>,
    set_shortcut: WriteSignal<String>,
    set_notice: WriteSignal<Option<String>>,
) -> impl IntoView {
    let (shortcut_status, set_shortcut_status) = signal(String::new());
    let (settings_status, set_settings_status) = signal(String::new());

    let persist = move |edit: Box<dyn FnOnce(&mut SettingsDto)>| {
        spawn_local(async move {
            match update_latest(edit).await {
                Ok(next) => {
                    set_settings.set(next);
                    set_settings_status.set("Settings saved.".to_string());
                }
                Err(e) => set_settings_status.set(format!("Failed to save settings: {e}")),
            }
        });
    };

    let change_path_action = move |_| {
        spawn_local(async move {
            match pick_storage_folder_cmd().await {
                Ok(Some(path)) => persist(Box::new(move |s| s.storage_path = Some(path))),
                Ok(None) => {}
                Err(e) => set_notice.set(Some(format!("Failed to pick folder: {e}"))),
            }
        });
    };

    let (host_draft, set_host_draft) = signal(String::new());
    Effect::new(move |_| set_host_draft.set(settings.get().model_host));

    let save_host_action = move |_| {
        let host = host_draft.get_untracked().trim().to_string();
        persist(Box::new(move |s| s.model_host = host));
    };

    let save_shortcut_action = move |_| {
        let val = shortcut.get();
        set_shortcut_status.set("Saving shortcut...".to_string());
        spawn_local(async move {
            match save_shortcut(&val).await {
                Ok(saved) => set_shortcut_status.set(format!("Shortcut saved: {saved}")),
                Err(err) => set_shortcut_status.set(format!("Failed to save shortcut: {err}")),
            }
        });
    };

    let reset_settings_action = move |_| {
        spawn_local(async move {
            match reset_settings_cmd().await {
                Ok(_) => {
                    if let Ok(s) = fetch_settings().await {
                        set_settings.set(s);
                    }
                    if let Ok(Some(s)) = fetch_default_shortcut().await {
                        set_shortcut.set(s);
                    }
                    set_settings_status.set("Settings reset.".to_string());
                }
                Err(e) => set_settings_status.set(format!("Reset failed: {e}")),
            }
        });
    };

    view! {
        <div class="settings-section">
            <p class="settings-status">{move || settings_status.get()}</p>
            <div class="settings-row">
                <div class="settings-label">
                    <span class="settings-title">"Model Host"</span>
                    <span class="settings-hint">"Where translation models are downloaded from"</span>
                </div>
                <div class="settings-input-group">
                    <input
                        type="text"
                        class="settings-input"
                        prop:value=move || host_draft.get()
                        on:input=move |ev| set_host_draft.set(input_value(&ev))
                    />
                    <button class="ghost compact" on:click=save_host_action>"Save"</button>
                </div>
            </div>
            <div class="settings-row">
                <div class="settings-label">
                    <span class="settings-title">"Shortcut"</span>
                    <p class="settings-status">{move || shortcut_status.get()}</p>
                </div>
                <div class="settings-input-group">
                    <input
                        type="text"
                        class="settings-input"
                        value=move || shortcut.get()
                        on:input=move |ev| set_shortcut.set(input_value(&ev))
                    />
                    <button class="ghost compact" on:click=save_shortcut_action>"Save"</button>
                </div>
            </div>
            <div class="settings-row">
                <div class="settings-label">
                    <span class="settings-title">"Model Storage"</span>
                    <code class="path-code">
                        {move || settings.get().storage_path.unwrap_or_else(|| "Default location".to_string())}
                    </code>
                </div>
                <button class="ghost compact" on:click=change_path_action>"Change"</button>
            </div>
            <div class="settings-divider"></div>
            <div class="settings-footer">
                <button class="danger compact" on:click=reset_settings_action>"Reset All Settings"</button>
            </div>
        </div>
    }
}
