//! Window configuration registry
//!
//! Centralized window configuration and geometry constants so no dimension is
//! hardcoded at a call site. Maps window roles to WindowConfig structs.

use serde::{Deserialize, Serialize};

/// No note dimension may drop below this, in the store or on a live surface.
pub const MIN_NOTE_DIMENSION: u32 = 150;

/// Default note edge length, also the size reported for an absent surface.
pub const DEFAULT_NOTE_SIZE: u32 = 300;

/// Default top-left coordinate for notes created without a position.
pub const DEFAULT_NOTE_POSITION: i32 = 100;

/// Window configuration for a window role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub transparent: bool,
    pub resizable: bool,
    pub decorations: bool,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
}

impl WindowConfig {
    pub fn new(width: f64, height: f64, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            transparent: false,
            resizable: true,
            decorations: true,
            always_on_top: false,
            skip_taskbar: false,
        }
    }
}

/// Window registry mapping window roles to configurations
pub fn get_window_config(role: &str) -> WindowConfig {
    match role {
        // Overlays are non-resizable at rest; resizing happens only inside the
        // controller's bracketed set_size.
        "overlay" => WindowConfig {
            transparent: true,
            resizable: false,
            decorations: false,
            always_on_top: true,
            skip_taskbar: true,
            ..WindowConfig::new(
                DEFAULT_NOTE_SIZE as f64,
                DEFAULT_NOTE_SIZE as f64,
                "Sticky Note",
            )
        },
        "settings" => WindowConfig::new(1200.0, 800.0, "StickyBoard"),
        _ => WindowConfig::new(500.0, 400.0, "StickyBoard"), // Default fallback
    }
}
