use std::sync::{Mutex, OnceLock};

use tauri::AppHandle;
use tauri_plugin_global_shortcut::{
    Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutEvent, ShortcutState,
};

use crate::settings::STORE_PATH;

const SHORTCUT_STORE_KEY: &str = "summon_shortcut";

static ACTIVE_SHORTCUT: OnceLock<Mutex<Option<Shortcut>>> = OnceLock::new();

fn active_shortcut() -> &'static Mutex<Option<Shortcut>> {
    ACTIVE_SHORTCUT.get_or_init(|| Mutex::new(None))
}

#[doc(hidden)]
pub fn default_shortcut() -> Shortcut {
    Shortcut::new(Some(Modifiers::ALT), Code::KeyT)
}

#[doc(hidden)]
pub fn parse_shortcut_str(s: &str) -> Result<Shortcut, String> {
    s.parse::<Shortcut>()
        .map_err(|e| format!("Invalid shortcut: {e}"))
}

fn persist_shortcut(app: &AppHandle, shortcut: &Shortcut) -> Result<(), String> {
    use tauri_plugin_store::StoreExt;
    let store = app
        .store(STORE_PATH)
        .map_err(|e| format!("Could not open settings store: {e}"))?;
    store.set(
        SHORTCUT_STORE_KEY.to_string(),
        serde_json::json!(shortcut.into_string()),
    );
    store
        .save()
        .map_err(|e| format!("Could not persist shortcut: {e}"))
}

fn load_persisted_shortcut(app: &AppHandle) -> Option<String> {
    use tauri_plugin_store::StoreExt;
    app.store(STORE_PATH)
        .ok()
        .and_then(|store| store.get(SHORTCUT_STORE_KEY))
        .and_then(|value| value.as_str().map(ToString::to_string))
}

fn make_handler() -> impl Fn(&AppHandle, &Shortcut, ShortcutEvent) + Send + Sync {
    move |app: &AppHandle, _, event| {
        if event.state() == ShortcutState::Pressed {
            log::debug!("Summon shortcut pressed");
            super::show_main_window(app);
        }
    }
}

fn register_summon_shortcut(app: &AppHandle, shortcut: Shortcut) -> Result<String, String> {
    let mut active = active_shortcut().lock().map_err(|e| e.to_string())?;
    if let Some(prev) = *active {
        let _ = app.global_shortcut().unregister(prev);
    }
    app.global_shortcut()
        .on_shortcut(shortcut, make_handler())
        .map_err(|e| e.to_string())?;
    persist_shortcut(app, &shortcut)?;
    let s = shortcut.into_string();
    *active = Some(shortcut);
    Ok(s)
}

pub fn update_summon_shortcut(app: AppHandle, s: String) -> Result<String, String> {
    register_summon_shortcut(&app, parse_shortcut_str(&s)?)
}

pub fn get_summon_shortcut(app: AppHandle) -> Option<String> {
    active_shortcut()
        .lock()
        .ok()
        .and_then(|a| a.as_ref().map(|s| s.into_string()))
        .or_else(|| load_persisted_shortcut(&app))
}

pub fn default_summon_shortcut() -> String {
    default_shortcut().into_string()
}

fn resolve_shortcut(app: &AppHandle) -> Shortcut {
    load_persisted_shortcut(app)
        .and_then(|s| parse_shortcut_str(&s).ok())
        .unwrap_or_else(default_shortcut)
}

#[cfg(desktop)]
pub(super) fn init_shortcuts(app: &AppHandle) -> tauri::Result<()> {
    app.plugin(tauri_plugin_global_shortcut::Builder::new().build())?;
    match register_summon_shortcut(app, resolve_shortcut(app)) {
        Ok(s) => log::info!("Global shortcut ready: {s}"),
        Err(e) => log::warn!("Global shortcut failed: {e}"),
    }
    Ok(())
}
