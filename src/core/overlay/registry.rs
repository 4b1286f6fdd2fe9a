use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::surface::Surface;
use super::SharedController;

/// In-memory map from note id to its live overlay controller.
///
/// Owned by the host coordinator: constructed at startup, managed as app
/// state, drained at shutdown. Membership mirrors live surfaces 1:1 — an id
/// has an entry iff its overlay is currently open. Opening twice for one id
/// is allowed by design and keeps only the most recent handle; callers are
/// responsible for not double-opening.
pub struct OverlayRegistry<S: Surface> {
    controllers: Mutex<HashMap<i64, Arc<SharedController<S>>>>,
    /// Bumped per open so window labels stay unique even when an id is
    /// re-opened while its previous surface is still tearing down.
    open_serial: AtomicU64,
}

impl<S: Surface> OverlayRegistry<S> {
    pub fn new() -> Self {
        Self {
            controllers: Mutex::new(HashMap::new()),
            open_serial: AtomicU64::new(1),
        }
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Arc<SharedController<S>>>> {
        match self.controllers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn next_open_serial(&self) -> u64 {
        self.open_serial.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a controller, replacing (and returning) any previous entry
    /// for the same note id.
    pub fn insert(
        &self,
        note_id: i64,
        controller: Arc<SharedController<S>>,
    ) -> Option<Arc<SharedController<S>>> {
        self.lock_map().insert(note_id, controller)
    }

    /// Drop the entry for a note id. No-op on unknown ids.
    pub fn remove(&self, note_id: i64) -> Option<Arc<SharedController<S>>> {
        self.lock_map().remove(&note_id)
    }

    /// Drop the entry only if it is still this exact controller. Used by the
    /// destroyed-window hook so a stale surface tearing down after a re-open
    /// cannot evict its replacement.
    pub fn remove_entry_if(&self, note_id: i64, controller: &Arc<SharedController<S>>) {
        let mut map = self.lock_map();
        if map
            .get(&note_id)
            .is_some_and(|current| Arc::ptr_eq(current, controller))
        {
            map.remove(&note_id);
        }
    }

    pub fn has(&self, note_id: i64) -> bool {
        self.lock_map().contains_key(&note_id)
    }

    pub fn get(&self, note_id: i64) -> Option<Arc<SharedController<S>>> {
        self.lock_map().get(&note_id).cloned()
    }

    /// Take every live controller, emptying the registry.
    pub fn drain(&self) -> Vec<Arc<SharedController<S>>> {
        self.lock_map().drain().map(|(_, c)| c).collect()
    }
}

impl<S: Surface> Default for OverlayRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::overlay::controller::SurfaceController;
    use crate::core::overlay::surface::fake::FakeSurface;
    use crate::shared::types::{WindowPosition, WindowSize};

    fn controller(note_id: i64) -> Arc<SharedController<FakeSurface>> {
        let surface = FakeSurface::new(WindowPosition { x: 0, y: 0 }, WindowSize::new(300, 300));
        SharedController::new(SurfaceController::new(
            note_id,
            surface,
            WindowSize::new(300, 300),
        ))
    }

    #[test]
    fn test_membership_tracks_open_and_close() {
        let registry: OverlayRegistry<FakeSurface> = OverlayRegistry::new();

        registry.insert(1, controller(1));
        assert!(registry.has(1));

        registry.remove(1);
        assert!(!registry.has(1));
        assert!(registry.get(1).is_none());
    }

    #[test]
    fn test_remove_unknown_id_is_a_no_op() {
        let registry: OverlayRegistry<FakeSurface> = OverlayRegistry::new();
        assert!(registry.remove(99).is_none());
    }

    #[test]
    fn test_double_insert_keeps_most_recent_handle() {
        let registry: OverlayRegistry<FakeSurface> = OverlayRegistry::new();

        let first = controller(1);
        let second = controller(1);

        registry.insert(1, first.clone());
        let replaced = registry.insert(1, second.clone());

        assert!(replaced.is_some_and(|old| Arc::ptr_eq(&old, &first)));
        assert!(Arc::ptr_eq(&registry.get(1).unwrap(), &second));
    }

    #[test]
    fn test_remove_entry_if_ignores_stale_handles() {
        let registry: OverlayRegistry<FakeSurface> = OverlayRegistry::new();

        let stale = controller(1);
        let current = controller(1);
        registry.insert(1, current.clone());

        // The old surface's destroyed-hook fires after the re-open.
        registry.remove_entry_if(1, &stale);
        assert!(registry.has(1));

        registry.remove_entry_if(1, &current);
        assert!(!registry.has(1));
    }

    #[test]
    fn test_drain_empties_registry() {
        let registry: OverlayRegistry<FakeSurface> = OverlayRegistry::new();

        registry.insert(3, controller(3));
        registry.insert(1, controller(1));

        assert_eq!(registry.drain().len(), 2);
        assert!(!registry.has(1));
        assert!(!registry.has(3));
    }

    #[test]
    fn test_open_serials_are_unique() {
        let registry: OverlayRegistry<FakeSurface> = OverlayRegistry::new();
        let a = registry.next_open_serial();
        let b = registry.next_open_serial();
        assert_ne!(a, b);
    }
}
