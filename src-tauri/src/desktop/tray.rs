use std::path::Path;

use tauri::menu::{Menu, MenuItem};
use tauri::tray::TrayIconBuilder;
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

use crate::engine::TranslatorEngine;

const MENU_ITEM_QUIT: &str = "quit";
const MENU_ITEM_SHOW: &str = "show";
const MENU_ITEM_VIEW_LOGS: &str = "view_logs";
const MENU_ITEM_CLEAR_CACHE: &str = "clear_cache";

pub(super) fn init_tray(app: &AppHandle) -> tauri::Result<()> {
    let show = MenuItem::with_id(app, MENU_ITEM_SHOW, "Show Translator", true, None::<&str>)?;
    let clear_cache = MenuItem::with_id(
        app,
        MENU_ITEM_CLEAR_CACHE,
        "Clear Model Cache",
        true,
        None::<&str>,
    )?;
    let view_logs = MenuItem::with_id(
        app,
        MENU_ITEM_VIEW_LOGS,
        "View Log File",
        true,
        None::<&str>,
    )?;
    let quit = MenuItem::with_id(app, MENU_ITEM_QUIT, "Quit", true, None::<&str>)?;
    let menu = Menu::with_items(app, &[&show, &clear_cache, &view_logs, &quit])?;

    let mut tray = TrayIconBuilder::new()
        .menu(&menu)
        .show_menu_on_left_click(true)
        .on_menu_event(|app, event| match event.id.as_ref() {
            MENU_ITEM_QUIT => {
                log::info!("Quit menu item clicked");
                app.exit(0);
            }
            MENU_ITEM_SHOW => super::show_main_window(app),
            MENU_ITEM_CLEAR_CACHE => {
                log::info!("Clear Model Cache menu item clicked");
                let result = app.state::<TranslatorEngine>().clear_all();
                if let Err(e) = result {
                    log::error!("Failed to clear model cache: {e}");
                    warn(app, e.user_message());
                }
            }
            MENU_ITEM_VIEW_LOGS => {
                log::info!("View Log File menu item clicked");
                if let Err(e) = open_log_file(app) {
                    log::error!("Failed to open log file: {e}");
                    warn(app, format!("Failed to open log file: {e}"));
                }
            }
            _ => log::debug!("Unhandled menu item: {:?}", event.id),
        });

    if let Some(icon) = app.default_window_icon() {
        tray = tray.icon(icon.clone());
    } else {
        log::warn!("Default window icon missing; using system tray default.");
    }

    tray.build(app)?;
    Ok(())
}

fn warn(app: &AppHandle, message: String) {
    let _ = app
        .dialog()
        .message(message)
        .kind(MessageDialogKind::Error)
        .title("Warning")
        .blocking_show();
}

fn open_log_file(app: &AppHandle) -> Result<(), String> {
    let log_dir = app.path().app_log_dir().map_err(|e| e.to_string())?;
    if !log_dir.exists() {
        return Err("Log directory does not exist".to_string());
    }

    let log_file = newest_log_file(&log_dir).unwrap_or(log_dir);

    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(target_os = "windows")]
    let cmd = "explorer";
    #[cfg(target_os = "linux")]
    let cmd = "xdg-open";

    std::process::Command::new(cmd)
        .arg(log_file)
        .spawn()
        .map_err(|e| e.to_string())?;

    Ok(())
}

fn newest_log_file(log_dir: &Path) -> Option<std::path::PathBuf> {
    let mut logs: Vec<_> = std::fs::read_dir(log_dir)
        .ok()?
        .flatten()
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("log"))
                .unwrap_or(false)
        })
        .collect();

    logs.sort_by_key(|entry| {
        entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });

    logs.last().map(|entry| entry.path())
}
