use tracing::debug;

use super::surface::Surface;
use crate::shared::error::AppResult;
use crate::shared::types::{Delivery, WindowPosition, WindowSize};

/// What the surface is currently doing. `ProgrammaticResize` exists only to
/// keep the size-change listener from re-entering the bracketed resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    Idle,
    UserDragging,
    UserResizing,
    ProgrammaticResize,
}

/// Geometry-enforcement state machine for one live overlay.
///
/// Overlays are non-resizable at the platform level while at rest; native
/// resize affordances fight the custom drag-handle UI and let a native edge
/// drag grow the window without bound. Every size change therefore goes
/// through `set_size`, which briefly enables resizing, applies the new
/// bounds, and locks the window back down. `allowed_size` is the
/// authoritative geometry; `enforce_size` snaps any out-of-band divergence
/// back to it.
pub struct SurfaceController<S: Surface> {
    note_id: i64,
    surface: S,
    allowed_size: WindowSize,
    phase: SurfacePhase,
}

impl<S: Surface> SurfaceController<S> {
    pub fn new(note_id: i64, surface: S, initial_size: WindowSize) -> Self {
        Self {
            note_id,
            surface,
            allowed_size: initial_size.clamped(),
            phase: SurfacePhase::Idle,
        }
    }

    pub fn note_id(&self) -> i64 {
        self.note_id
    }

    pub fn allowed_size(&self) -> WindowSize {
        self.allowed_size
    }

    pub fn phase(&self) -> SurfacePhase {
        self.phase
    }

    pub fn begin_drag(&mut self) {
        if self.phase == SurfacePhase::Idle {
            self.phase = SurfacePhase::UserDragging;
        }
    }

    pub fn end_drag(&mut self) {
        if self.phase == SurfacePhase::UserDragging {
            self.phase = SurfacePhase::Idle;
        }
    }

    /// Start a user resize session, seeding the baseline from the *actual*
    /// current size rather than `allowed_size`. If a correction was in
    /// flight, the cached value may lag the screen; compounding deltas onto
    /// it drifts the window.
    pub fn begin_resize(&mut self) -> AppResult<WindowSize> {
        let baseline = self.surface.size()?;
        self.phase = SurfacePhase::UserResizing;
        Ok(baseline)
    }

    pub fn end_resize(&mut self) {
        if self.phase == SurfacePhase::UserResizing {
            self.phase = SurfacePhase::Idle;
        }
    }

    /// Move the surface without resizing. Always permitted; never touches
    /// `allowed_size`.
    pub fn reposition(&self, position: WindowPosition) -> Delivery {
        if !self.surface.is_alive() {
            return Delivery::SurfaceGone;
        }
        match self.surface.set_position(position) {
            Ok(()) => Delivery::Applied,
            Err(_) => Delivery::SurfaceGone,
        }
    }

    /// Clamp, record the new `allowed_size`, and apply it through the
    /// resizable-window bracket. Returns the clamped size along with whether
    /// the surface was still there to receive it.
    pub fn set_size(&mut self, requested: WindowSize) -> (WindowSize, Delivery) {
        let size = requested.clamped();
        if !self.surface.is_alive() {
            return (size, Delivery::SurfaceGone);
        }

        self.allowed_size = size;

        let resumed = self.phase;
        self.phase = SurfacePhase::ProgrammaticResize;
        let applied = self.apply_bracketed(size);
        self.phase = resumed;

        match applied {
            Ok(()) => (size, Delivery::Applied),
            Err(_) => (size, Delivery::SurfaceGone),
        }
    }

    /// The resizable-window bracket: unlock, apply the new bounds at the
    /// current position (the top-left anchor must not move), re-lock with
    /// min = max = the new size, disable resizing again. Locking without the
    /// bracket leaves the window stuck at a stale size; unlocking without
    /// re-locking lets a native edge drag re-grow it.
    fn apply_bracketed(&self, size: WindowSize) -> AppResult<()> {
        self.surface.set_resizable(true)?;
        self.surface.set_min_size(None)?;
        self.surface.set_max_size(None)?;

        let position = self.surface.position()?;
        self.surface.set_bounds(position, size)?;

        self.surface.set_min_size(Some(size))?;
        self.surface.set_max_size(Some(size))?;
        self.surface.set_resizable(false)?;
        Ok(())
    }

    /// Anti-drift hook, invoked on every raw size-change notification from
    /// the surface. Any resize not mediated by `set_size` is reverted at the
    /// current position within one redraw.
    pub fn enforce_size(&mut self) {
        if self.phase == SurfacePhase::ProgrammaticResize {
            return;
        }
        if !self.surface.is_alive() {
            return;
        }

        // The surface can die between the check and these calls; a failed
        // correction then is the same benign race as a late geometry update.
        let Ok(actual) = self.surface.size() else {
            return;
        };
        if actual == self.allowed_size {
            return;
        }

        debug!(
            "[Overlay {}] size drift {}x{} -> snapping back to {}x{}",
            self.note_id,
            actual.width,
            actual.height,
            self.allowed_size.width,
            self.allowed_size.height
        );

        let Ok(position) = self.surface.position() else {
            return;
        };
        let _ = self.surface.set_bounds(position, self.allowed_size);
    }

    /// Actual top-left corner, for seeding a drag session.
    pub fn query_position(&self) -> AppResult<WindowPosition> {
        self.surface.position()
    }

    /// Actual live size, or the documented 300x300 default when the surface
    /// is gone. Callers must treat the default as "surface absent".
    pub fn query_size(&self) -> WindowSize {
        if !self.surface.is_alive() {
            return WindowSize::fallback();
        }
        self.surface.size().unwrap_or_else(|_| WindowSize::fallback())
    }

    /// Release the surface. Safe to call repeatedly.
    pub fn close(&self) {
        if self.surface.is_alive() {
            let _ = self.surface.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::overlay::surface::fake::FakeSurface;

    fn controller_at(
        position: WindowPosition,
        size: WindowSize,
    ) -> (SurfaceController<FakeSurface>, FakeSurface) {
        let surface = FakeSurface::new(position, size);
        let controller = SurfaceController::new(1, surface.clone(), size);
        (controller, surface)
    }

    #[test]
    fn test_set_size_clamps_to_minimum() {
        let (mut controller, surface) =
            controller_at(WindowPosition { x: 100, y: 100 }, WindowSize::new(300, 300));

        let (size, delivery) = controller.set_size(WindowSize::new(50, 80));

        assert_eq!(size, WindowSize::new(150, 150));
        assert_eq!(delivery, Delivery::Applied);
        assert_eq!(controller.allowed_size(), WindowSize::new(150, 150));
        assert_eq!(surface.state().size, WindowSize::new(150, 150));
    }

    #[test]
    fn test_set_size_runs_the_full_bracket_in_order() {
        let (mut controller, surface) =
            controller_at(WindowPosition { x: 10, y: 20 }, WindowSize::new(300, 300));

        controller.set_size(WindowSize::new(420, 360));

        assert_eq!(
            surface.ops(),
            vec![
                "resizable(true)",
                "min(none)",
                "max(none)",
                "bounds(10,20,420x360)",
                "min(420x360)",
                "max(420x360)",
                "resizable(false)",
            ]
        );
        assert!(!surface.state().resizable);
    }

    #[test]
    fn test_set_size_preserves_position() {
        let (mut controller, surface) =
            controller_at(WindowPosition { x: 77, y: -5 }, WindowSize::new(300, 300));

        controller.set_size(WindowSize::new(500, 200));

        assert_eq!(surface.state().position, WindowPosition { x: 77, y: -5 });
    }

    #[test]
    fn test_reposition_never_changes_allowed_size() {
        let (controller, surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        let delivery = controller.reposition(WindowPosition { x: 640, y: 480 });

        assert_eq!(delivery, Delivery::Applied);
        assert_eq!(surface.state().position, WindowPosition { x: 640, y: 480 });
        assert_eq!(controller.allowed_size(), WindowSize::new(300, 300));
        assert_eq!(surface.state().size, WindowSize::new(300, 300));
    }

    #[test]
    fn test_enforce_size_reverts_out_of_band_growth() {
        let (mut controller, surface) =
            controller_at(WindowPosition { x: 30, y: 40 }, WindowSize::new(300, 300));

        surface.drift_to(WindowSize::new(512, 512));
        controller.enforce_size();

        assert_eq!(surface.state().size, WindowSize::new(300, 300));
        assert_eq!(surface.state().position, WindowPosition { x: 30, y: 40 });
    }

    #[test]
    fn test_enforce_size_is_a_no_op_when_sizes_match() {
        let (mut controller, surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        controller.enforce_size();

        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_query_size_reports_actual_size_while_alive() {
        let (controller, surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        // A drift the listener has not corrected yet is still the actual size.
        surface.drift_to(WindowSize::new(311, 290));

        assert_eq!(controller.query_size(), WindowSize::new(311, 290));
    }

    #[test]
    fn test_query_size_falls_back_when_surface_is_gone() {
        let (controller, surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(200, 200));

        surface.kill();

        assert_eq!(controller.query_size(), WindowSize::new(300, 300));
    }

    #[test]
    fn test_set_size_on_dead_surface_reports_gone_and_keeps_allowed() {
        let (mut controller, surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        surface.kill();
        let (size, delivery) = controller.set_size(WindowSize::new(400, 400));

        assert_eq!(size, WindowSize::new(400, 400));
        assert_eq!(delivery, Delivery::SurfaceGone);
        assert_eq!(controller.allowed_size(), WindowSize::new(300, 300));
    }

    #[test]
    fn test_reposition_on_dead_surface_reports_gone() {
        let (controller, surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        surface.kill();

        assert_eq!(
            controller.reposition(WindowPosition { x: 1, y: 1 }),
            Delivery::SurfaceGone
        );
    }

    #[test]
    fn test_begin_resize_seeds_baseline_from_actual_size() {
        let (mut controller, surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        // A correction in flight: the screen shows 280x300 right now.
        surface.drift_to(WindowSize::new(280, 300));

        let baseline = controller.begin_resize().unwrap();
        assert_eq!(baseline, WindowSize::new(280, 300));
        assert_eq!(controller.phase(), SurfacePhase::UserResizing);
    }

    #[test]
    fn test_begin_resize_fails_when_surface_is_gone() {
        let (mut controller, surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        surface.kill();

        assert!(controller.begin_resize().is_err());
        assert_eq!(controller.phase(), SurfacePhase::Idle);
    }

    #[test]
    fn test_drag_phase_transitions() {
        let (mut controller, _surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        controller.begin_drag();
        assert_eq!(controller.phase(), SurfacePhase::UserDragging);
        controller.end_drag();
        assert_eq!(controller.phase(), SurfacePhase::Idle);
    }

    #[test]
    fn test_set_size_during_resize_session_keeps_session_phase() {
        let (mut controller, _surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        controller.begin_resize().unwrap();
        controller.set_size(WindowSize::new(350, 350));

        assert_eq!(controller.phase(), SurfacePhase::UserResizing);
        controller.end_resize();
        assert_eq!(controller.phase(), SurfacePhase::Idle);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (controller, surface) =
            controller_at(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));

        controller.close();
        controller.close();

        assert!(!surface.state().alive);
        assert_eq!(surface.ops().iter().filter(|op| *op == "close").count(), 1);
    }
}
