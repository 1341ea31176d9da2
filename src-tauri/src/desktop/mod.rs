mod shortcuts;
mod tray;

pub use shortcuts::{
    default_shortcut, default_summon_shortcut, get_summon_shortcut, parse_shortcut_str,
    update_summon_shortcut,
};

#[cfg(desktop)]
pub fn setup_desktop(app: &mut tauri::App) -> tauri::Result<()> {
    let handle = app.handle();
    tray::init_tray(handle)?;
    shortcuts::init_shortcuts(handle)?;
    Ok(())
}

/// Brings the main window to the front.
pub(crate) fn show_main_window(app: &tauri::AppHandle) {
    use tauri::Manager;

    match app.get_webview_window("main") {
        Some(window) => {
            if let Err(e) = window.show().and_then(|_| window.set_focus()) {
                log::warn!("Failed to show main window: {e}");
            }
        }
        None => log::warn!("Main window not found"),
    }
}
