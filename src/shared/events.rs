use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::types::Note;

/// Lifecycle notifications fanned out to the settings window (list
/// synchronization) and to overlay webviews (comment popup toggle).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload")] // Tagged enum for easier frontend parsing
#[ts(export)]
pub enum AppEvent {
    #[serde(rename = "notes://created")]
    NoteCreated(Note),

    #[serde(rename = "notes://updated")]
    NoteUpdated(Note),

    #[serde(rename = "notes://deleted")]
    NoteDeleted(i64),

    #[serde(rename = "overlay://toggle-popup")]
    TogglePopup(i64),
}
