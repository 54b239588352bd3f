use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::settle::SettleTimer;
use crate::geometry::{Rect, SizeChangeMode, WindowState};
use crate::state::PhaseMachine;

/// Identity of one registration; two windows with the same name get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct TrackedWindow {
    pub(crate) name: String,
    pub(crate) mode: SizeChangeMode,
    /// Last known restored (normal-state) bounds.
    pub(crate) default_size: Rect,
    pub(crate) last_state: WindowState,
    pub(crate) machine: PhaseMachine,
    pub(crate) settle: SettleTimer,
}

impl TrackedWindow {
    pub(crate) fn new(
        name: String,
        mode: SizeChangeMode,
        default_size: Rect,
        last_state: WindowState,
    ) -> Self {
        Self {
            name,
            mode,
            default_size,
            last_state,
            machine: PhaseMachine::new(),
            settle: SettleTimer::default(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    next_id: u64,
    windows: BTreeMap<WindowId, TrackedWindow>,
}

impl Registry {
    pub(crate) fn insert(&mut self, window: TrackedWindow) -> WindowId {
        self.next_id = self.next_id.saturating_add(1);
        let id = WindowId(self.next_id);
        self.windows.insert(id, window);
        id
    }

    pub(crate) fn get(&self, id: WindowId) -> Option<&TrackedWindow> {
        self.windows.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: WindowId) -> Option<&mut TrackedWindow> {
        self.windows.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: WindowId) -> Option<TrackedWindow> {
        self.windows.remove(&id)
    }

    pub(crate) fn contains_name(&self, name: &str) -> bool {
        self.windows.values().any(|window| window.name == name)
    }

    pub(crate) fn len(&self) -> usize {
        self.windows.len()
    }
}

/// Scoped registration; dropping it stops tracking the window and cancels
/// any pending settle timer.
#[derive(Debug)]
#[must_use = "dropping the registration stops tracking the window"]
pub struct Registration {
    id: WindowId,
    registry: Weak<RefCell<Registry>>,
}

impl Registration {
    pub(crate) fn new(id: WindowId, registry: &Rc<RefCell<Registry>>) -> Self {
        Self {
            id,
            registry: Rc::downgrade(registry),
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Stops tracking now; equivalent to dropping the handle.
    pub fn release(self) {}
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let Ok(mut registry) = registry.try_borrow_mut() else {
            tracing::warn!(window = %self.id, "registry busy; window stays tracked until closed");
            return;
        };
        if let Some(window) = registry.remove(self.id) {
            tracing::debug!(window = %window.name, id = %self.id, "window unregistered");
        }
    }
}
