//! Overlay lifecycle and geometry commands
//!
//! The boundary the overlay webviews and the settings window call into. Every
//! geometry mutation is fire-and-forget from the caller's perspective; the
//! returned `Delivery` only tells it whether the surface was still there.

use tauri::{AppHandle, State};

use crate::core::input::PointerSessions;
use crate::core::store::NoteStore;
use crate::shared::error::AppResult;
use crate::shared::types::{Delivery, Note, WindowPosition, WindowSize};
use crate::system::window::overlay::{open_overlay, LiveOverlayRegistry};

/// Open an overlay surface for a note. Callers are responsible for not
/// double-opening an id; a second call replaces the registry entry.
#[tauri::command]
pub fn create_overlay(
    app: AppHandle,
    registry: State<'_, LiveOverlayRegistry>,
    note: Note,
) -> AppResult<()> {
    open_overlay(&app, &note, &registry)
}

/// Close a note's overlay. Safe to call for an already-closed or unknown id.
/// Any pointer interaction in flight on that overlay dies with it.
#[tauri::command]
pub fn close_overlay(
    registry: State<'_, LiveOverlayRegistry>,
    sessions: State<'_, PointerSessions>,
    note_id: i64,
) {
    sessions.cancel(note_id);
    if let Some(controller) = registry.remove(note_id) {
        controller.lock().close();
    }
}

/// Move an overlay; writes through to the store on success.
#[tauri::command]
pub fn update_overlay_position(
    registry: State<'_, LiveOverlayRegistry>,
    store: State<'_, NoteStore>,
    note_id: i64,
    x: i32,
    y: i32,
) -> AppResult<Delivery> {
    let Some(controller) = registry.get(note_id) else {
        return Ok(Delivery::SurfaceGone);
    };

    let delivery = controller.lock().reposition(WindowPosition { x, y });
    if delivery == Delivery::Applied {
        store.update_position(note_id, x, y)?;
    }
    Ok(delivery)
}

/// Resize an overlay. Dimensions are clamped to the 150px floor before the
/// surface or the store see them.
#[tauri::command]
pub fn update_overlay_size(
    registry: State<'_, LiveOverlayRegistry>,
    store: State<'_, NoteStore>,
    note_id: i64,
    width: u32,
    height: u32,
) -> AppResult<Delivery> {
    let Some(controller) = registry.get(note_id) else {
        return Ok(Delivery::SurfaceGone);
    };

    let (size, delivery) = controller.lock().set_size(WindowSize::new(width, height));
    if delivery == Delivery::Applied {
        store.update_size(note_id, size.width, size.height)?;
    }
    Ok(delivery)
}

/// Actual live size of a note's surface. Returns the 300x300 default when
/// the overlay is not open; callers treat that as "surface absent".
#[tauri::command]
pub fn get_window_size(registry: State<'_, LiveOverlayRegistry>, note_id: i64) -> WindowSize {
    match registry.get(note_id) {
        Some(controller) => controller.lock().query_size(),
        None => WindowSize::fallback(),
    }
}
