use tauri::{AppHandle, Emitter};
use tracing::warn;

use super::events::AppEvent;

/// Emit an application event to all windows.
///
/// Tauri's emit takes a string event name, so the enum is dispatched manually;
/// the names here must stay in sync with the serde renames on `AppEvent`.
/// Emission is best-effort: a window that closed mid-emit is the same benign
/// race as a late geometry update and is only logged.
pub fn emit_event(app: &AppHandle, event: AppEvent) {
    match &event {
        AppEvent::NoteCreated(note) => {
            if let Err(e) = app.emit("notes://created", note) {
                warn!("failed to emit note-created: {}", e);
            }
        }
        AppEvent::NoteUpdated(note) => {
            if let Err(e) = app.emit("notes://updated", note) {
                warn!("failed to emit note-updated: {}", e);
            }
        }
        AppEvent::NoteDeleted(note_id) => {
            if let Err(e) = app.emit("notes://deleted", note_id) {
                warn!("failed to emit note-deleted: {}", e);
            }
        }
        AppEvent::TogglePopup(note_id) => {
            if let Err(e) = app.emit("overlay://toggle-popup", note_id) {
                warn!("failed to emit toggle-popup: {}", e);
            }
        }
    }
}
