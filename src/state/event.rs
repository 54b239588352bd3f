use super::WindowPhase;

/// Notifications a host forwards for a tracked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Shown,
    Resized,
    Moved,
    /// Native end-of-resize notification, for toolkits that have one.
    ResizeEnded,
    /// The settle timer scheduled for `generation` fired.
    SettleElapsed(u64),
    Closed,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: WindowPhase,
    pub event: WindowEvent,
    pub to: WindowPhase,
}

impl PhaseTransition {
    pub const fn new(from: WindowPhase, event: WindowEvent, to: WindowPhase) -> Self {
        Self { from, event, to }
    }
}
