//! Pointer protocol commands
//!
//! Overlay webviews forward raw pointer events here; the host computes
//! deltas, throttles, and applies the resulting geometry. Keeping the session
//! state machine host-side means the click threshold, the throttle, and the
//! resize-baseline rule all live in one process.

use std::sync::Arc;
use std::time::Instant;

use tauri::{AppHandle, State};

use crate::core::input::{GeometryRequest, PointerSession, PointerSessions, SessionEnd};
use crate::core::overlay::SharedController;
use crate::core::store::NoteStore;
use crate::shared::emit::emit_event;
use crate::shared::error::{AppError, AppResult};
use crate::shared::events::AppEvent;
use crate::shared::types::{Delivery, PointerRegion};
use crate::system::window::overlay::{LiveOverlayRegistry, OverlayHandle};

fn live_controller(
    registry: &LiveOverlayRegistry,
    note_id: i64,
) -> AppResult<Arc<SharedController<OverlayHandle>>> {
    registry
        .get(note_id)
        .ok_or_else(|| AppError::Window(format!("overlay {} is not open", note_id)))
}

/// Start a pointer interaction on an overlay.
///
/// Body presses open a drag session anchored at the window's actual origin;
/// resize-handle presses open a resize session whose baseline is the
/// surface's *actual* current size, queried here and now — if the surface is
/// already gone this fails immediately instead of leaving a stuck baseline.
#[tauri::command]
pub fn overlay_pointer_down(
    registry: State<'_, LiveOverlayRegistry>,
    sessions: State<'_, PointerSessions>,
    note_id: i64,
    x: i32,
    y: i32,
    region: PointerRegion,
) -> AppResult<()> {
    match region {
        // The close button is its own interactive element; no session.
        PointerRegion::CloseButton => Ok(()),
        PointerRegion::Body => {
            let controller = live_controller(&registry, note_id)?;
            let mut controller = controller.lock();
            let origin = controller.query_position()?;
            controller.begin_drag();
            sessions.begin(note_id, PointerSession::drag(x, y, origin));
            Ok(())
        }
        PointerRegion::ResizeHandle => {
            let controller = live_controller(&registry, note_id)?;
            let baseline = controller.lock().begin_resize()?;
            sessions.begin(note_id, PointerSession::resize(x, y, baseline));
            Ok(())
        }
    }
}

/// Feed pointer movement into the overlay's session. Throttled internally;
/// a suppressed update still reports `Applied` (the caller is optimistic
/// either way).
#[tauri::command]
pub fn overlay_pointer_move(
    registry: State<'_, LiveOverlayRegistry>,
    store: State<'_, NoteStore>,
    sessions: State<'_, PointerSessions>,
    note_id: i64,
    x: i32,
    y: i32,
) -> AppResult<Delivery> {
    match sessions.on_move(note_id, Instant::now(), x, y) {
        Some(request) => apply_request(&registry, &store, note_id, request),
        None => Ok(Delivery::Applied),
    }
}

/// End the overlay's pointer session. Flushes the final geometry, or — when
/// the pointer never crossed the click threshold — reclassifies the
/// interaction as a click and toggles the comment popup.
#[tauri::command]
pub fn overlay_pointer_up(
    app: AppHandle,
    registry: State<'_, LiveOverlayRegistry>,
    store: State<'_, NoteStore>,
    sessions: State<'_, PointerSessions>,
    note_id: i64,
    x: i32,
    y: i32,
) -> AppResult<Delivery> {
    let Some(end) = sessions.on_up(note_id, x, y) else {
        return Ok(Delivery::Applied);
    };

    match end {
        SessionEnd::Click => {
            if let Some(controller) = registry.get(note_id) {
                controller.lock().end_drag();
            }
            emit_event(&app, AppEvent::TogglePopup(note_id));
            Ok(Delivery::Applied)
        }
        SessionEnd::DragEnd { last } => {
            let delivery = apply_request(&registry, &store, note_id, last)?;
            if let Some(controller) = registry.get(note_id) {
                controller.lock().end_drag();
            }
            Ok(delivery)
        }
        SessionEnd::ResizeEnd { last } => {
            let delivery = apply_request(&registry, &store, note_id, last)?;
            if let Some(controller) = registry.get(note_id) {
                controller.lock().end_resize();
            }
            Ok(delivery)
        }
    }
}

fn apply_request(
    registry: &LiveOverlayRegistry,
    store: &NoteStore,
    note_id: i64,
    request: GeometryRequest,
) -> AppResult<Delivery> {
    let Some(controller) = registry.get(note_id) else {
        // Surface closed mid-interaction; benign, the session dies with it.
        return Ok(Delivery::SurfaceGone);
    };

    match request {
        GeometryRequest::Reposition(position) => {
            let delivery = controller.lock().reposition(position);
            if delivery == Delivery::Applied {
                store.update_position(note_id, position.x, position.y)?;
            }
            Ok(delivery)
        }
        GeometryRequest::Resize(size) => {
            let (clamped, delivery) = controller.lock().set_size(size);
            if delivery == Delivery::Applied {
                store.update_size(note_id, clamped.width, clamped.height)?;
            }
            Ok(delivery)
        }
    }
}
