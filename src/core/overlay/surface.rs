use crate::shared::error::AppResult;
use crate::shared::types::{WindowPosition, WindowSize};

/// Platform window operations the surface controller needs.
///
/// The live implementation wraps a Tauri webview window; tests drive the
/// controller with a scripted fake. Implementations must be cheap to clone
/// handles of and safe to call after the window has died (`is_alive` gates
/// every use, but a window can still vanish between the check and the call,
/// so errors after the check are tolerated, not prevented).
pub trait Surface: Send {
    fn is_alive(&self) -> bool;
    fn position(&self) -> AppResult<WindowPosition>;
    fn size(&self) -> AppResult<WindowSize>;
    fn set_position(&self, position: WindowPosition) -> AppResult<()>;
    /// Apply position and size together; used by the resize bracket and the
    /// anti-drift snap-back so the top-left anchor never moves.
    fn set_bounds(&self, position: WindowPosition, size: WindowSize) -> AppResult<()>;
    fn set_resizable(&self, resizable: bool) -> AppResult<()>;
    fn set_min_size(&self, size: Option<WindowSize>) -> AppResult<()>;
    fn set_max_size(&self, size: Option<WindowSize>) -> AppResult<()>;
    fn close(&self) -> AppResult<()>;
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::{Arc, Mutex, MutexGuard};

    use super::Surface;
    use crate::shared::error::{AppError, AppResult};
    use crate::shared::types::{WindowPosition, WindowSize};

    pub struct FakeState {
        pub alive: bool,
        pub position: WindowPosition,
        pub size: WindowSize,
        pub resizable: bool,
        pub min_size: Option<WindowSize>,
        pub max_size: Option<WindowSize>,
        /// Ordered log of mutations, for bracket-sequence assertions.
        pub ops: Vec<String>,
    }

    /// Scripted stand-in for a platform window. Cloning shares state, the
    /// same way cloned Tauri window handles point at one window.
    #[derive(Clone)]
    pub struct FakeSurface {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeSurface {
        pub fn new(position: WindowPosition, size: WindowSize) -> Self {
            Self {
                state: Arc::new(Mutex::new(FakeState {
                    alive: true,
                    position,
                    size,
                    resizable: false,
                    min_size: None,
                    max_size: None,
                    ops: Vec::new(),
                })),
            }
        }

        pub fn state(&self) -> MutexGuard<'_, FakeState> {
            self.state.lock().unwrap()
        }

        pub fn kill(&self) {
            self.state().alive = false;
        }

        /// Simulate an out-of-band resize (platform- or user-induced).
        pub fn drift_to(&self, size: WindowSize) {
            self.state().size = size;
        }

        pub fn ops(&self) -> Vec<String> {
            self.state().ops.clone()
        }

        fn guard_alive(&self) -> AppResult<()> {
            if self.state().alive {
                Ok(())
            } else {
                Err(AppError::Window("surface destroyed".to_string()))
            }
        }
    }

    impl Surface for FakeSurface {
        fn is_alive(&self) -> bool {
            self.state().alive
        }

        fn position(&self) -> AppResult<WindowPosition> {
            self.guard_alive()?;
            Ok(self.state().position)
        }

        fn size(&self) -> AppResult<WindowSize> {
            self.guard_alive()?;
            Ok(self.state().size)
        }

        fn set_position(&self, position: WindowPosition) -> AppResult<()> {
            self.guard_alive()?;
            let mut state = self.state();
            state.position = position;
            state.ops.push(format!("position({},{})", position.x, position.y));
            Ok(())
        }

        fn set_bounds(&self, position: WindowPosition, size: WindowSize) -> AppResult<()> {
            self.guard_alive()?;
            let mut state = self.state();
            state.position = position;
            state.size = size;
            state.ops.push(format!(
                "bounds({},{},{}x{})",
                position.x, position.y, size.width, size.height
            ));
            Ok(())
        }

        fn set_resizable(&self, resizable: bool) -> AppResult<()> {
            self.guard_alive()?;
            let mut state = self.state();
            state.resizable = resizable;
            state.ops.push(format!("resizable({})", resizable));
            Ok(())
        }

        fn set_min_size(&self, size: Option<WindowSize>) -> AppResult<()> {
            self.guard_alive()?;
            let mut state = self.state();
            state.min_size = size;
            state.ops.push(match size {
                Some(s) => format!("min({}x{})", s.width, s.height),
                None => "min(none)".to_string(),
            });
            Ok(())
        }

        fn set_max_size(&self, size: Option<WindowSize>) -> AppResult<()> {
            self.guard_alive()?;
            let mut state = self.state();
            state.max_size = size;
            state.ops.push(match size {
                Some(s) => format!("max({}x{})", s.width, s.height),
                None => "max(none)".to_string(),
            });
            Ok(())
        }

        fn close(&self) -> AppResult<()> {
            let mut state = self.state();
            state.alive = false;
            state.ops.push("close".to_string());
            Ok(())
        }
    }
}
