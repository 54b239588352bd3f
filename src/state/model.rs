/// Placement phase of one tracked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPhase {
    #[default]
    Registered,
    Loaded,
    Resizing,
    Settled,
    Closed,
}

impl WindowPhase {
    /// Whether stored geometry has been applied and the window may be refitted.
    pub const fn is_loaded(self) -> bool {
        matches!(self, Self::Loaded | Self::Resizing | Self::Settled)
    }
}
