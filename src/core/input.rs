use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::shared::types::{WindowPosition, WindowSize};

/// Pointer movement below this (in both axes) classifies the interaction as
/// a click instead of a drag.
pub const CLICK_THRESHOLD_PX: i32 = 2;

/// Minimum spacing between geometry updates during a drag (~60 Hz).
pub const DRAG_MIN_INTERVAL: Duration = Duration::from_millis(16);

/// Minimum spacing between geometry updates during a resize (~20 Hz). Resizes
/// are costlier than moves (the whole bracket runs per update), so they are
/// throttled harder.
pub const RESIZE_MIN_INTERVAL: Duration = Duration::from_millis(50);

/// Geometry mutation an input session wants applied to its overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryRequest {
    Reposition(WindowPosition),
    Resize(WindowSize),
}

/// How a pointer session ended. A sub-threshold drag is reclassified as a
/// click on pointer-up; clicks toggle the comment popup, drags never do.
/// Drag and resize ends always carry the final geometry, flushed regardless
/// of the throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Click,
    DragEnd { last: GeometryRequest },
    ResizeEnd { last: GeometryRequest },
}

enum SessionKind {
    /// Pointer-down on the note body; moves the window.
    Drag { window_origin: WindowPosition },
    /// Pointer-down on the resize handle; grows/shrinks from a baseline
    /// seeded off the surface's actual size at session start.
    Resize { baseline: WindowSize },
}

/// One in-flight pointer interaction for one overlay. Turns raw pointer
/// movement into geometry requests, throttled to bound IPC volume during
/// continuous movement.
pub struct PointerSession {
    kind: SessionKind,
    pointer_origin: (i32, i32),
    moved_beyond_threshold: bool,
    last_sent: Option<Instant>,
}

impl PointerSession {
    pub fn drag(pointer_x: i32, pointer_y: i32, window_origin: WindowPosition) -> Self {
        Self {
            kind: SessionKind::Drag { window_origin },
            pointer_origin: (pointer_x, pointer_y),
            moved_beyond_threshold: false,
            last_sent: None,
        }
    }

    pub fn resize(pointer_x: i32, pointer_y: i32, baseline: WindowSize) -> Self {
        Self {
            kind: SessionKind::Resize { baseline },
            pointer_origin: (pointer_x, pointer_y),
            moved_beyond_threshold: false,
            last_sent: None,
        }
    }

    fn delta(&self, pointer_x: i32, pointer_y: i32) -> (i32, i32) {
        (
            pointer_x - self.pointer_origin.0,
            pointer_y - self.pointer_origin.1,
        )
    }

    fn request_at(&self, pointer_x: i32, pointer_y: i32) -> GeometryRequest {
        let (dx, dy) = self.delta(pointer_x, pointer_y);
        match &self.kind {
            SessionKind::Drag { window_origin } => GeometryRequest::Reposition(WindowPosition {
                x: window_origin.x + dx,
                y: window_origin.y + dy,
            }),
            // Saturate at zero; the controller raises to the 150 floor.
            SessionKind::Resize { baseline } => GeometryRequest::Resize(WindowSize {
                width: (baseline.width as i64 + dx as i64).max(0) as u32,
                height: (baseline.height as i64 + dy as i64).max(0) as u32,
            }),
        }
    }

    fn min_interval(&self) -> Duration {
        match self.kind {
            SessionKind::Drag { .. } => DRAG_MIN_INTERVAL,
            SessionKind::Resize { .. } => RESIZE_MIN_INTERVAL,
        }
    }

    /// Feed a pointer move. Returns the geometry request to apply, or `None`
    /// when throttled or (for drags) still within the click threshold.
    pub fn pointer_move(
        &mut self,
        now: Instant,
        pointer_x: i32,
        pointer_y: i32,
    ) -> Option<GeometryRequest> {
        let (dx, dy) = self.delta(pointer_x, pointer_y);
        if dx.abs() > CLICK_THRESHOLD_PX || dy.abs() > CLICK_THRESHOLD_PX {
            self.moved_beyond_threshold = true;
        }

        // Drags hold position until the interaction is committed as a drag,
        // otherwise a 1px wobble before a click would nudge the window.
        if matches!(self.kind, SessionKind::Drag { .. }) && !self.moved_beyond_threshold {
            return None;
        }

        if let Some(last) = self.last_sent {
            if now.duration_since(last) < self.min_interval() {
                return None;
            }
        }

        self.last_sent = Some(now);
        Some(self.request_at(pointer_x, pointer_y))
    }

    /// Finish the session. The final pointer position is always flushed,
    /// throttle notwithstanding, so the surface lands exactly where the
    /// pointer released.
    pub fn pointer_up(self, pointer_x: i32, pointer_y: i32) -> SessionEnd {
        match self.kind {
            SessionKind::Drag { .. } => {
                if self.moved_beyond_threshold {
                    SessionEnd::DragEnd {
                        last: self.request_at(pointer_x, pointer_y),
                    }
                } else {
                    SessionEnd::Click
                }
            }
            SessionKind::Resize { .. } => SessionEnd::ResizeEnd {
                last: self.request_at(pointer_x, pointer_y),
            },
        }
    }
}

/// Per-overlay pointer sessions, keyed by note id. One managed instance on
/// the host; overlays never share session state directly.
pub struct PointerSessions {
    sessions: Mutex<HashMap<i64, PointerSession>>,
}

impl PointerSessions {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<i64, PointerSession>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start a session, replacing any stale one for the same overlay (a
    /// missed pointer-up leaves one behind).
    pub fn begin(&self, note_id: i64, session: PointerSession) {
        self.lock_map().insert(note_id, session);
    }

    pub fn on_move(
        &self,
        note_id: i64,
        now: Instant,
        pointer_x: i32,
        pointer_y: i32,
    ) -> Option<GeometryRequest> {
        self.lock_map()
            .get_mut(&note_id)?
            .pointer_move(now, pointer_x, pointer_y)
    }

    /// End and remove the session. `None` when no session exists (pointer-up
    /// without a tracked pointer-down is dropped, not an error).
    pub fn on_up(&self, note_id: i64, pointer_x: i32, pointer_y: i32) -> Option<SessionEnd> {
        self.lock_map()
            .remove(&note_id)?
            .pointer_up(pointer_x, pointer_y)
            .into()
    }

    pub fn cancel(&self, note_id: i64) {
        self.lock_map().remove(&note_id);
    }
}

impl Default for PointerSessions {
    fn default() -> Self {
        Self::new()
    }
}
