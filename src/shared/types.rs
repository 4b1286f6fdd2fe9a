use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config;

/// Kind of content a note holds. Inferred from the content shape when the
/// caller does not pass an explicit tag (embedded images arrive as data URIs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum NoteType {
    Text,
    Image,
}

impl NoteType {
    pub fn infer(content: &str) -> Self {
        if content.starts_with("data:image/") {
            NoteType::Image
        } else {
            NoteType::Text
        }
    }
}

/// A persisted sticky note record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Note {
    pub id: i64,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub content: String,
    pub position_x: i32,
    pub position_y: i32,
    pub width: u32,
    pub height: u32,
    pub color: Option<String>,
    pub created_by: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Fields the settings window (or a paste action) supplies when creating a
/// note. Everything except the content is optional and defaulted by the store.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateNoteRequest {
    pub content: String,
    #[serde(default, rename = "type")]
    pub note_type: Option<NoteType>,
    #[serde(default)]
    pub position_x: Option<i32>,
    #[serde(default)]
    pub position_y: Option<i32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Partial note record merged into an existing note by `update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NoteUpdate {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "type")]
    pub note_type: Option<NoteType>,
    #[serde(default)]
    pub position_x: Option<i32>,
    #[serde(default)]
    pub position_y: Option<i32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Top-left corner of a surface in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WindowPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size reported for a note whose surface is gone. Callers treat this as
    /// "surface absent", not as live geometry.
    pub fn fallback() -> Self {
        Self::new(config::DEFAULT_NOTE_SIZE, config::DEFAULT_NOTE_SIZE)
    }

    /// Both dimensions raised to the 150px floor. Every size mutation runs
    /// through this before touching a surface or the store.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(config::MIN_NOTE_DIMENSION),
            height: self.height.max(config::MIN_NOTE_DIMENSION),
        }
    }
}

/// Outcome of a fire-and-forget geometry mutation. The renderer stays
/// optimistic either way; `SurfaceGone` just makes the benign "overlay closed
/// mid-drag" race observable instead of silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Delivery {
    Applied,
    SurfaceGone,
}

/// Which overlay sub-region a pointer-down landed on. The close button and
/// resize handle are interactive and never start a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum PointerRegion {
    Body,
    ResizeHandle,
    CloseButton,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_image_from_data_uri() {
        assert_eq!(NoteType::infer("data:image/png;base64,iVBORw0KGgo="), NoteType::Image);
    }

    #[test]
    fn test_infer_text_for_plain_content() {
        assert_eq!(NoteType::infer("buy milk"), NoteType::Text);
        assert_eq!(NoteType::infer("data:text/plain,hello"), NoteType::Text);
    }

    #[test]
    fn test_clamp_raises_both_dimensions() {
        assert_eq!(WindowSize::new(50, 80).clamped(), WindowSize::new(150, 150));
        assert_eq!(WindowSize::new(400, 120).clamped(), WindowSize::new(400, 150));
        assert_eq!(WindowSize::new(300, 300).clamped(), WindowSize::new(300, 300));
    }

    #[test]
    fn test_note_wire_format_uses_camel_case() {
        let note = Note {
            id: 1,
            note_type: NoteType::Text,
            content: "hello".to_string(),
            position_x: 100,
            position_y: 100,
            width: 300,
            height: 300,
            color: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["positionX"], 100);
        assert_eq!(json["type"], "TEXT");
        assert_eq!(json["width"], 300);
    }
}
