use std::time::Duration;

use super::WindowId;

/// A one-shot timer the host should start; when it fires, forward
/// `WindowEvent::SettleElapsed(generation)` for `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleRequest {
    pub window: WindowId,
    pub generation: u64,
    pub delay: Duration,
}

/// Restartable debounce state: only the newest generation may settle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SettleTimer {
    generation: u64,
    pending: bool,
}

impl SettleTimer {
    pub(crate) fn restart(&mut self) -> u64 {
        self.generation = self.generation.saturating_add(1);
        self.pending = true;
        self.generation
    }

    pub(crate) fn cancel(&mut self) {
        self.generation = self.generation.saturating_add(1);
        self.pending = false;
    }

    /// Consumes the pending timer if `generation` is the latest one.
    pub(crate) fn elapse(&mut self, generation: u64) -> bool {
        if !self.pending || generation != self.generation {
            return false;
        }
        self.pending = false;
        true
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending
    }
}
