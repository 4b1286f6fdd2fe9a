//! Note CRUD commands
//!
//! Store passthroughs plus the lifecycle coupling: creating a note opens its
//! overlay, deleting a note closes it, and the settings window is notified of
//! every mutation. Closing an overlay (see `close_overlay`) deliberately does
//! NOT delete the note; the calling UI decides which semantics it wants.

use tauri::{AppHandle, State};

use crate::core::input::PointerSessions;
use crate::core::store::NoteStore;
use crate::shared::emit::emit_event;
use crate::shared::error::AppResult;
use crate::shared::events::AppEvent;
use crate::shared::types::{CreateNoteRequest, Note, NoteUpdate};
use crate::system::window::overlay::{open_overlay, LiveOverlayRegistry};

#[tauri::command]
pub fn get_all_notes(store: State<'_, NoteStore>) -> Vec<Note> {
    store.get_all()
}

#[tauri::command]
pub fn get_note(store: State<'_, NoteStore>, note_id: i64) -> Option<Note> {
    store.get(note_id)
}

/// Persist a new note, open its overlay, and notify the settings window.
#[tauri::command]
pub fn create_note(
    app: AppHandle,
    store: State<'_, NoteStore>,
    registry: State<'_, LiveOverlayRegistry>,
    request: CreateNoteRequest,
) -> AppResult<Note> {
    let note = store.create(request)?;
    open_overlay(&app, &note, &registry)?;
    emit_event(&app, AppEvent::NoteCreated(note.clone()));
    Ok(note)
}

/// Merge partial fields into a note. Returns `None` for an unknown id.
#[tauri::command]
pub fn update_note(
    app: AppHandle,
    store: State<'_, NoteStore>,
    note_id: i64,
    updates: NoteUpdate,
) -> AppResult<Option<Note>> {
    let updated = store.update(note_id, updates)?;
    if let Some(note) = &updated {
        emit_event(&app, AppEvent::NoteUpdated(note.clone()));
    }
    Ok(updated)
}

/// Delete a note from the store; always closes its overlay too.
#[tauri::command]
pub fn delete_note(
    app: AppHandle,
    store: State<'_, NoteStore>,
    registry: State<'_, LiveOverlayRegistry>,
    sessions: State<'_, PointerSessions>,
    note_id: i64,
) -> AppResult<bool> {
    let removed = store.delete(note_id)?;

    sessions.cancel(note_id);
    if let Some(controller) = registry.remove(note_id) {
        controller.lock().close();
    }

    if removed {
        emit_event(&app, AppEvent::NoteDeleted(note_id));
    }
    Ok(removed)
}

/// Store-only position write (no surface touch), for callers that already
/// moved the window.
#[tauri::command]
pub fn update_note_position(
    store: State<'_, NoteStore>,
    note_id: i64,
    x: i32,
    y: i32,
) -> AppResult<()> {
    store.update_position(note_id, x, y)
}

/// Store-only size write, clamped like every other size mutation.
#[tauri::command]
pub fn update_note_size(
    store: State<'_, NoteStore>,
    note_id: i64,
    width: u32,
    height: u32,
) -> AppResult<()> {
    store.update_size(note_id, width, height)
}
