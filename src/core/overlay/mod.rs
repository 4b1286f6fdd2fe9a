pub mod controller;
pub mod registry;
pub mod surface;

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use controller::SurfaceController;
use surface::Surface;

/// A controller shared between the command layer and the window-event hooks.
///
/// The size-change hook runs on the main thread and must never block on the
/// controller mutex: a command can hold it while waiting on the main thread
/// for a window call, which would deadlock. When the hook loses that race the
/// missed enforcement is recorded here and the lock holder replays it on
/// release, so out-of-band drift is corrected either way; only the thread
/// doing the correcting changes.
pub struct SharedController<S: Surface> {
    inner: Mutex<SurfaceController<S>>,
    enforce_pending: AtomicBool,
}

impl<S: Surface> SharedController<S> {
    pub fn new(controller: SurfaceController<S>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(controller),
            enforce_pending: AtomicBool::new(false),
        })
    }

    /// Lock the controller, recovering from a poisoned mutex. Geometry state
    /// stays usable even if a panicking thread died mid-mutation.
    pub fn lock(&self) -> ControllerGuard<'_, S> {
        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        ControllerGuard {
            guard,
            enforce_pending: &self.enforce_pending,
        }
    }

    /// Run size enforcement now if the controller is free, otherwise flag it
    /// for the current lock holder to replay on unlock.
    pub fn enforce_or_defer(&self) {
        match self.inner.try_lock() {
            Ok(mut controller) => controller.enforce_size(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().enforce_size(),
            Err(TryLockError::WouldBlock) => {
                self.enforce_pending.store(true, Ordering::Release);
            }
        }
    }
}

pub struct ControllerGuard<'a, S: Surface> {
    guard: MutexGuard<'a, SurfaceController<S>>,
    enforce_pending: &'a AtomicBool,
}

impl<S: Surface> Deref for ControllerGuard<'_, S> {
    type Target = SurfaceController<S>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<S: Surface> DerefMut for ControllerGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl<S: Surface> Drop for ControllerGuard<'_, S> {
    fn drop(&mut self) {
        // Replay an enforcement the size-change hook could not take the lock
        // for; dropping it would leave the surface at the drifted size until
        // the next notification, which may never come.
        if self.enforce_pending.swap(false, Ordering::AcqRel) {
            self.guard.enforce_size();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::overlay::surface::fake::FakeSurface;
    use crate::shared::types::{WindowPosition, WindowSize};

    fn shared_at(size: WindowSize) -> (Arc<SharedController<FakeSurface>>, FakeSurface) {
        let surface = FakeSurface::new(WindowPosition { x: 10, y: 20 }, size);
        let shared = SharedController::new(SurfaceController::new(1, surface.clone(), size));
        (shared, surface)
    }

    #[test]
    fn test_enforce_runs_immediately_when_uncontended() {
        let (shared, surface) = shared_at(WindowSize::new(300, 300));

        surface.drift_to(WindowSize::new(512, 512));
        shared.enforce_or_defer();

        assert_eq!(surface.state().size, WindowSize::new(300, 300));
    }

    #[test]
    fn test_missed_enforcement_replays_on_unlock() {
        let (shared, surface) = shared_at(WindowSize::new(300, 300));

        // A command holds the controller while the drift notification lands.
        let guard = shared.lock();
        surface.drift_to(WindowSize::new(512, 512));
        shared.enforce_or_defer();

        // Deferred, not dropped: nothing happened yet.
        assert_eq!(surface.state().size, WindowSize::new(512, 512));

        drop(guard);
        assert_eq!(surface.state().size, WindowSize::new(300, 300));
        assert_eq!(surface.state().position, WindowPosition { x: 10, y: 20 });
    }

    #[test]
    fn test_replay_happens_once() {
        let (shared, surface) = shared_at(WindowSize::new(300, 300));

        let guard = shared.lock();
        surface.drift_to(WindowSize::new(512, 512));
        shared.enforce_or_defer();
        drop(guard);

        let corrections = surface.ops().len();
        // A later lock/unlock cycle with no missed notification is silent.
        drop(shared.lock());
        assert_eq!(surface.ops().len(), corrections);
    }
}
