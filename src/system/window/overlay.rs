//! Overlay surface construction and the Tauri-backed `Surface` implementation.
//!
//! Overlays are frameless, transparent, always-on-top windows with no native
//! resize capability at rest; all geometry flows through the controller.

use std::sync::Arc;

use tauri::{
    AppHandle, Manager, PhysicalPosition, PhysicalSize, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder, WindowEvent,
};
use tracing::{debug, info};

use crate::config;
use crate::core::overlay::controller::SurfaceController;
use crate::core::overlay::registry::OverlayRegistry;
use crate::core::overlay::surface::Surface;
use crate::core::overlay::SharedController;
use crate::shared::error::AppResult;
use crate::shared::types::{Note, WindowPosition, WindowSize};

/// The registry of live overlays, as managed app state.
pub type LiveOverlayRegistry = OverlayRegistry<OverlayHandle>;

/// Cloneable handle to one overlay webview window.
#[derive(Clone)]
pub struct OverlayHandle {
    window: WebviewWindow,
}

impl OverlayHandle {
    pub fn new(window: WebviewWindow) -> Self {
        Self { window }
    }
}

impl Surface for OverlayHandle {
    fn is_alive(&self) -> bool {
        // The handle outlives the window; a destroyed window disappears from
        // the app's window map.
        self.window.get_webview_window(self.window.label()).is_some()
    }

    fn position(&self) -> AppResult<WindowPosition> {
        let position = self.window.outer_position()?;
        Ok(WindowPosition {
            x: position.x,
            y: position.y,
        })
    }

    fn size(&self) -> AppResult<WindowSize> {
        let size = self.window.inner_size()?;
        Ok(WindowSize::new(size.width, size.height))
    }

    fn set_position(&self, position: WindowPosition) -> AppResult<()> {
        self.window
            .set_position(PhysicalPosition::new(position.x, position.y))?;
        Ok(())
    }

    fn set_bounds(&self, position: WindowPosition, size: WindowSize) -> AppResult<()> {
        self.window
            .set_size(PhysicalSize::new(size.width, size.height))?;
        self.window
            .set_position(PhysicalPosition::new(position.x, position.y))?;
        Ok(())
    }

    fn set_resizable(&self, resizable: bool) -> AppResult<()> {
        self.window.set_resizable(resizable)?;
        Ok(())
    }

    fn set_min_size(&self, size: Option<WindowSize>) -> AppResult<()> {
        self.window
            .set_min_size(size.map(|s| PhysicalSize::new(s.width, s.height)))?;
        Ok(())
    }

    fn set_max_size(&self, size: Option<WindowSize>) -> AppResult<()> {
        self.window
            .set_max_size(size.map(|s| PhysicalSize::new(s.width, s.height)))?;
        Ok(())
    }

    fn close(&self) -> AppResult<()> {
        self.window.close()?;
        Ok(())
    }
}

/// Build the overlay window for a note and register its controller.
///
/// Not idempotent by design: opening twice for one note creates two surfaces
/// and the registry keeps the most recent one. The serial suffix keeps
/// window labels unique across re-opens of the same id.
pub fn open_overlay(
    app: &AppHandle,
    note: &Note,
    registry: &LiveOverlayRegistry,
) -> AppResult<()> {
    let serial = registry.next_open_serial();
    let label = format!("overlay-{}-{}", note.id, serial);
    let window_config = config::get_window_config("overlay");
    let size = WindowSize::new(note.width, note.height).clamped();

    let url = format!("index.html?window=overlay&noteId={}", note.id);
    let window = WebviewWindowBuilder::new(app, &label, WebviewUrl::App(url.into()))
        .title(&window_config.title)
        .inner_size(size.width as f64, size.height as f64)
        .position(note.position_x as f64, note.position_y as f64)
        .min_inner_size(
            config::MIN_NOTE_DIMENSION as f64,
            config::MIN_NOTE_DIMENSION as f64,
        )
        .resizable(window_config.resizable)
        .decorations(window_config.decorations)
        .transparent(window_config.transparent)
        .always_on_top(window_config.always_on_top)
        .skip_taskbar(window_config.skip_taskbar)
        .shadow(false)
        .build()?;

    let controller = SharedController::new(SurfaceController::new(
        note.id,
        OverlayHandle::new(window.clone()),
        size,
    ));
    registry.insert(note.id, controller.clone());

    // Registered once per window. Weak: the closure must not keep the
    // controller alive after the registry lets go of it.
    let app_handle = app.clone();
    let note_id = note.id;
    let hook = Arc::downgrade(&controller);
    window.on_window_event(move |event| match event {
        // Any resize not mediated by the controller is drift; snap back.
        // This runs on the main thread and must not block on the controller
        // mutex (a command can hold it while waiting on the main thread), so
        // a contended enforcement is deferred to the holder, never dropped.
        WindowEvent::Resized(_) => {
            if let Some(controller) = hook.upgrade() {
                controller.enforce_or_defer();
            }
        }
        // Keep registry membership mirroring live surfaces even when the
        // window dies without going through close_overlay.
        WindowEvent::Destroyed => {
            if let Some(controller) = hook.upgrade() {
                if let Some(registry) = app_handle.try_state::<LiveOverlayRegistry>() {
                    registry.remove_entry_if(note_id, &controller);
                    debug!("[Overlay {}] surface destroyed, registry entry dropped", note_id);
                }
            }
        }
        _ => {}
    });

    info!("[Overlay {}] opened as '{}' at ({},{}) {}x{}",
        note.id, label, note.position_x, note.position_y, size.width, size.height);
    Ok(())
}
