//! System tray: the status surface plus its menu and click handling.

use tauri::{
    image::Image,
    menu::{Menu, MenuItem, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent},
    App, AppHandle, Manager,
};
use tauri_plugin_opener::OpenerExt;
use tokio_util::sync::CancellationToken;

use crate::display::StatusSurface;
use crate::poller::{PollCommand, PollCommandSender};
use crate::render::{Bitmap, IconSet};
use crate::session;

/// Pixel size requested from the icon set for the tray
const TRAY_ICON_SIZE: u32 = 32;

const TRAY_ID: &str = "main";

/// Handles the tray callbacks need, stored as Tauri managed state.
pub struct TrayState {
    pub commands: PollCommandSender,
    pub usage_url: String,
    pub cancel: CancellationToken,
}

fn to_image(bitmap: &Bitmap) -> Image<'static> {
    Image::new_owned(bitmap.rgba().to_vec(), bitmap.size(), bitmap.size())
}

/// `StatusSurface` backed by the tray icon: icon, title (badge) and tooltip.
pub struct TraySurface {
    tray: TrayIcon,
}

impl TraySurface {
    pub fn new(tray: TrayIcon) -> Self {
        Self { tray }
    }
}

impl StatusSurface for TraySurface {
    fn set_icon(&self, icons: &IconSet) -> Result<(), String> {
        let bitmap = icons
            .best_for(TRAY_ICON_SIZE)
            .ok_or_else(|| "Icon set is empty".to_string())?;
        self.tray
            .set_icon(Some(to_image(bitmap)))
            .map_err(|e| e.to_string())
    }

    fn set_badge(&self, text: &str) -> Result<(), String> {
        let title = (!text.is_empty()).then_some(text);
        self.tray.set_title(title).map_err(|e| e.to_string())
    }

    fn set_tooltip(&self, text: &str) -> Result<(), String> {
        self.tray.set_tooltip(Some(text)).map_err(|e| e.to_string())
    }
}

fn send_command(app: &AppHandle, command: PollCommand) {
    if let Some(state) = app.try_state::<TrayState>() {
        if let Err(e) = state.commands.try_send(command) {
            log::error!("Tray: failed to send {:?}: {}", command, e);
        }
    } else {
        log::warn!("Tray: TrayState not available for {:?}", command);
    }
}

fn open_usage_page(app: &AppHandle) {
    let Some(state) = app.try_state::<TrayState>() else {
        log::warn!("Tray: TrayState not available to open usage page");
        return;
    };
    log::info!("Tray: opening {}", state.usage_url);
    if let Err(e) = app.opener().open_url(state.usage_url.as_str(), None::<&str>) {
        log::error!("Tray: failed to open usage page: {}", e);
    }
}

fn handle_menu_event(app: &AppHandle, id: &str) {
    match id {
        "refresh" => {
            log::info!("Refresh clicked");
            send_command(app, PollCommand::Refresh);
        }
        "open_usage" => open_usage_page(app),
        "set_session" => {
            log::info!("Set session key clicked");
            match session::import_session_key_from_clipboard() {
                Ok(()) => send_command(app, PollCommand::SessionChanged),
                Err(e) => log::error!("Tray: {}", e),
            }
        }
        "forget_org" => {
            log::info!("Forget organization clicked");
            send_command(app, PollCommand::ForgetOrganization);
        }
        "sign_out" => {
            log::info!("Sign out clicked");
            if let Err(e) = session::set_session_key(None) {
                log::error!("Tray: {}", e);
            }
            if std::env::var_os(session::SESSION_KEY_ENV).is_some() {
                log::warn!(
                    "Tray: {} is set in the environment and still takes effect",
                    session::SESSION_KEY_ENV
                );
            }
            send_command(app, PollCommand::SessionChanged);
        }
        "quit" => {
            log::info!("Quit clicked");
            if let Some(state) = app.try_state::<TrayState>() {
                state.cancel.cancel();
            }
            app.exit(0);
        }
        _ => {}
    }
}

/// Build the tray with its menu. Starts with the gray glyph until the first cycle lands.
pub fn build_tray(app: &App) -> tauri::Result<TrayIcon> {
    let refresh_item = MenuItem::with_id(app, "refresh", "Refresh Now", true, None::<&str>)?;
    let open_item = MenuItem::with_id(app, "open_usage", "Open Usage Page", true, None::<&str>)?;
    let session_item = MenuItem::with_id(
        app,
        "set_session",
        "Set Session Key from Clipboard",
        true,
        None::<&str>,
    )?;
    let forget_item =
        MenuItem::with_id(app, "forget_org", "Forget Organization", true, None::<&str>)?;
    let sign_out_item = MenuItem::with_id(app, "sign_out", "Sign Out", true, None::<&str>)?;
    let quit_item = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;

    let separator1 = PredefinedMenuItem::separator(app)?;
    let separator2 = PredefinedMenuItem::separator(app)?;

    let menu = Menu::with_items(
        app,
        &[
            &refresh_item,
            &open_item,
            &separator1,
            &session_item,
            &forget_item,
            &sign_out_item,
            &separator2,
            &quit_item,
        ],
    )?;

    let mut builder = TrayIconBuilder::with_id(TRAY_ID)
        .tooltip("Fetching usage...")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(|app, event| handle_menu_event(app, event.id.as_ref()))
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                open_usage_page(tray.app_handle());
            }
        });

    if let Some(bitmap) = IconSet::error().best_for(TRAY_ICON_SIZE) {
        builder = builder.icon(to_image(bitmap));
    }

    builder.build(app)
}
