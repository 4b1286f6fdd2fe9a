use tauri::{AppHandle, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::config;
use crate::shared::error::AppResult;

pub const SETTINGS_WINDOW_LABEL: &str = "settings";

/// Create the settings window (note list and management grid). A normal
/// decorated window, unlike the overlays.
pub fn create_settings_window(app: &AppHandle) -> AppResult<WebviewWindow> {
    let window_config = config::get_window_config("settings");

    let window = WebviewWindowBuilder::new(
        app,
        SETTINGS_WINDOW_LABEL,
        WebviewUrl::App("index.html?window=settings".into()),
    )
    .title(&window_config.title)
    .inner_size(window_config.width, window_config.height)
    .resizable(window_config.resizable)
    .decorations(window_config.decorations)
    .build()?;

    Ok(window)
}
