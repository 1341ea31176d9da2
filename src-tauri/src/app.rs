use std::sync::Mutex;

use tauri::{App, AppHandle, Builder, Emitter, Manager, RunEvent, WindowEvent};

use crate::commands;
#[cfg(desktop)]
use crate::desktop;
use crate::engine::TranslatorEngine;
use crate::session::TranslationState;
use crate::settings;

pub const STATE_EVENT: &str = "translation_state";

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let context = tauri::generate_context!();

    let app = Builder::default()
        .plugin(tauri_plugin_single_instance::init(on_second_instance))
        .plugin(
            tauri_plugin_log::Builder::new()
                .targets([
                    tauri_plugin_log::Target::new(tauri_plugin_log::TargetKind::Stdout),
                    tauri_plugin_log::Target::new(tauri_plugin_log::TargetKind::LogDir {
                        file_name: None,
                    }),
                ])
                .rotation_strategy(tauri_plugin_log::RotationStrategy::KeepAll)
                .max_file_size(2_000_000)
                .timezone_strategy(tauri_plugin_log::TimezoneStrategy::UseLocal)
                .level(log::LevelFilter::Info)
                .build(),
        )
        .plugin(tauri_plugin_store::Builder::default().build())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let engine = init_engine(app.handle())?;
            app.manage(engine);
            setup(app)
        })
        .on_window_event(handle_window_event)
        .invoke_handler(tauri::generate_handler![
            commands::get_state,
            commands::set_source_lang,
            commands::set_target_lang,
            commands::set_input_text,
            commands::translate,
            commands::clear,
            commands::swap_languages,
            commands::load_model,
            commands::unload_model,
            commands::post_worker_message,
            commands::supported_languages,
            commands::model_cache_status,
            commands::download_model,
            commands::remove_model,
            commands::list_cached_models,
            commands::clear_cached_models,
            commands::storage_usage,
            commands::check_model_update,
            commands::get_settings,
            commands::update_settings,
            commands::reset_settings,
            commands::pick_storage_folder,
            commands::update_summon_shortcut,
            commands::get_summon_shortcut,
            commands::default_summon_shortcut
        ])
        .build(context)
        .expect("error while running tauri application");

    app.run(handle_run_event);
}

fn init_engine(app: &AppHandle) -> Result<TranslatorEngine, Box<dyn std::error::Error>> {
    let settings = settings::get_settings(app);
    let emit_handle = app.clone();
    let last_pair = Mutex::new((settings.source_lang.clone(), settings.target_lang.clone()));

    let on_state = move |state: &TranslationState| {
        if let Err(e) = emit_handle.emit(STATE_EVENT, state) {
            log::error!("Failed to emit {STATE_EVENT}: {e}");
        }
        remember_pair(&emit_handle, &last_pair, state);
    };

    Ok(TranslatorEngine::new(&settings, on_state)?)
}

/// Persists the language pair whenever it changes.
fn remember_pair(app: &AppHandle, last_pair: &Mutex<(String, String)>, state: &TranslationState) {
    let Ok(mut last) = last_pair.lock() else {
        return;
    };
    if last.0 == state.source_lang && last.1 == state.target_lang {
        return;
    }
    *last = (state.source_lang.clone(), state.target_lang.clone());
    if let Err(e) = settings::save_language_pair(app, &state.source_lang, &state.target_lang) {
        log::warn!("Failed to persist language pair: {e}");
    }
}

fn handle_window_event(window: &tauri::Window, event: &WindowEvent) {
    if let WindowEvent::CloseRequested { api, .. } = event {
        if let Err(err) = window.hide() {
            log::warn!("Failed to hide window on close request: {err}");
        }
        api.prevent_close();
    }
}

fn handle_run_event(app_handle: &AppHandle, event: RunEvent) {
    match event {
        RunEvent::Exit => {
            if let Some(engine) = app_handle.try_state::<TranslatorEngine>() {
                engine.shutdown();
            }
        }
        #[cfg(target_os = "macos")]
        RunEvent::Reopen {
            has_visible_windows,
            ..
        } => {
            if !has_visible_windows {
                desktop::show_main_window(app_handle);
            }
        }
        _ => {}
    }
}

fn on_second_instance(app: &AppHandle, argv: Vec<String>, cwd: String) {
    log::info!("{}, {argv:?}, {cwd}", app.package_info().name);
    #[cfg(desktop)]
    desktop::show_main_window(app);
    if let Err(err) = app.emit("single-instance", ()) {
        log::error!("Failed to emit single-instance event: {err}");
    }
}

fn setup(app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(desktop)]
    desktop::setup_desktop(app)?;

    prepare_offline_cache(app.handle().clone());
    Ok(())
}

fn prepare_offline_cache(app_handle: AppHandle) {
    std::thread::spawn(move || {
        let engine = app_handle.state::<TranslatorEngine>();
        engine.prepare_offline_cache();
    });
}
