mod api;
mod config;
mod core;
mod logging;
mod shared;
mod system;

use tauri::{Manager, RunEvent};
use tracing::{debug, error, info, warn};

use crate::core::input::PointerSessions;
use crate::core::store::NoteStore;
use crate::system::window::overlay::LiveOverlayRegistry;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init();

    tauri::Builder::default()
        .setup(|app| {
            // All state must be managed before any window can invoke a command.
            app.manage(NoteStore::new());
            app.manage(LiveOverlayRegistry::new());
            app.manage(PointerSessions::new());

            let handle = app.handle().clone();
            system::window::settings::create_settings_window(&handle)?;

            // Recreate one overlay surface per persisted note.
            let store = app.state::<NoteStore>();
            let registry = app.state::<LiveOverlayRegistry>();
            let notes = store.get_all();
            info!("restoring {} persisted note overlay(s)", notes.len());
            for note in notes {
                if let Err(e) = system::window::overlay::open_overlay(&handle, &note, &registry) {
                    warn!("failed to restore overlay for note {}: {}", note.id, e);
                }
            }

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Overlay lifecycle & geometry
            api::commands::overlay::create_overlay,
            api::commands::overlay::close_overlay,
            api::commands::overlay::update_overlay_position,
            api::commands::overlay::update_overlay_size,
            api::commands::overlay::get_window_size,
            // Pointer protocol
            api::commands::input::overlay_pointer_down,
            api::commands::input::overlay_pointer_move,
            api::commands::input::overlay_pointer_up,
            // Note CRUD
            api::commands::notes::get_all_notes,
            api::commands::notes::get_note,
            api::commands::notes::create_note,
            api::commands::notes::update_note,
            api::commands::notes::delete_note,
            api::commands::notes::update_note_position,
            api::commands::notes::update_note_size,
        ])
        .build(tauri::generate_context!())
        .unwrap_or_else(|e| {
            error!("FATAL: failed to start StickyBoard: {}", e);
            std::process::exit(1);
        })
        .run(|app, event| {
            if let RunEvent::Exit = event {
                let registry = app.state::<LiveOverlayRegistry>();
                for controller in registry.drain() {
                    let controller = controller.lock();
                    debug!("closing overlay {} on exit", controller.note_id());
                    controller.close();
                }
            }
        });
}
