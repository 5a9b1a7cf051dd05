pub mod display;
pub mod poller;
pub mod render;
pub mod session;
pub mod settings;
mod tray;
pub mod usage;

use tauri::{Manager, RunEvent};
use tokio_util::sync::CancellationToken;

use poller::Poller;
use tray::{TrayState, TraySurface};
use usage::{OrgCache, WebUsageClient, ORG_CACHE_FILE_NAME};

fn load_org_cache(app: &tauri::App) -> OrgCache {
    match app.path().app_data_dir() {
        Ok(dir) => OrgCache::load(dir.join(ORG_CACHE_FILE_NAME)),
        Err(e) => {
            log::warn!("OrgCache: could not determine data directory, using memory only: {}", e);
            OrgCache::in_memory()
        }
    }
}

// ============================================================================
// Application entry point
// ============================================================================

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let app = tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::default()
                .level(if cfg!(debug_assertions) {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                })
                .build(),
        )
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            // Tray-only: no dock icon
            #[cfg(target_os = "macos")]
            app.set_activation_policy(tauri::ActivationPolicy::Accessory);

            let settings = settings::load_settings(app.handle());

            match session::get_session_key() {
                Some(key) => log::info!(
                    "Session: key configured ({})",
                    session::mask_session_key(&key)
                ),
                None => log::warn!("Session: no session key configured"),
            }

            let tray = tray::build_tray(app)?;

            let (tx, rx) = poller::create_command_channel();
            let cancel = CancellationToken::new();
            app.manage(TrayState {
                commands: tx,
                usage_url: settings.usage_page_url(),
                cancel: cancel.clone(),
            });

            let api = WebUsageClient::new(
                settings.base_url(),
                session::get_session_key,
                settings.http_timeout(),
            );
            let poller = Poller::new(api, load_org_cache(app), TraySurface::new(tray), &settings);

            tauri::async_runtime::spawn(async move {
                poller.run(rx, cancel).await;
            });

            log::info!("Usage Tray started");
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app, event| {
        if let RunEvent::ExitRequested { code, api, .. } = event {
            // No windows: stay alive in the tray unless exit was explicit
            if code.is_none() {
                api.prevent_exit();
            } else if let Some(state) = app.try_state::<TrayState>() {
                state.cancel.cancel();
            }
        }
    });
}
