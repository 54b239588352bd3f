use std::collections::VecDeque;

use super::error::{StateError, StateResult};
use super::{PhaseTransition, WindowEvent, WindowPhase};

/// Transitions kept for diagnostics; older ones are dropped.
pub const HISTORY_LIMIT: usize = 32;

#[derive(Debug)]
pub struct PhaseMachine {
    phase: WindowPhase,
    transition_history: VecDeque<PhaseTransition>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            phase: WindowPhase::default(),
            transition_history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    pub fn phase(&self) -> WindowPhase {
        self.phase
    }

    pub fn can_transition(&self, event: WindowEvent) -> bool {
        self.next_phase(event).is_some()
    }

    pub fn next_phase(&self, event: WindowEvent) -> Option<WindowPhase> {
        use WindowEvent as E;
        use WindowPhase as P;
        match (self.phase, event) {
            (P::Closed, _) => None,
            (_, E::Closed | E::Disposed) => Some(P::Closed),
            (P::Registered, E::Shown) => Some(P::Loaded),
            (P::Registered, E::Resized | E::Moved | E::ResizeEnded) => Some(P::Registered),
            (P::Loaded | P::Resizing | P::Settled, E::Resized | E::Moved) => Some(P::Resizing),
            (P::Resizing, E::SettleElapsed(_)) => Some(P::Settled),
            (P::Loaded | P::Resizing | P::Settled, E::ResizeEnded) => Some(P::Settled),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: WindowEvent) -> StateResult<WindowPhase> {
        tracing::debug!(from = ?self.phase, event = ?event, "request phase transition");
        let next = self.next_phase(event).ok_or_else(|| {
            let from = self.phase;
            tracing::warn!(from = ?from, event = ?event, "invalid phase transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = PhaseTransition::new(self.phase, event, next);
        self.phase = next;
        if self.transition_history.len() == HISTORY_LIMIT {
            self.transition_history.pop_front();
        }
        self.transition_history.push_back(record);

        Ok(self.phase)
    }

    /// The most recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.transition_history
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PhaseMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WindowPhase::{:?}", self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_transition_tracks_valid_and_invalid_events() {
        let mut machine = PhaseMachine::new();
        assert!(machine.can_transition(WindowEvent::Shown));
        assert!(machine.can_transition(WindowEvent::Moved));
        assert!(!machine.can_transition(WindowEvent::SettleElapsed(1)));

        let _ = machine
            .transition(WindowEvent::Shown)
            .expect("registered -> loaded should transition");

        assert!(machine.can_transition(WindowEvent::Resized));
        assert!(machine.can_transition(WindowEvent::Closed));
        assert!(!machine.can_transition(WindowEvent::Shown));
    }

    #[test]
    fn transition_records_history_with_ordered_entries() {
        let mut machine = PhaseMachine::new();
        for event in [
            WindowEvent::Shown,
            WindowEvent::Resized,
            WindowEvent::Moved,
            WindowEvent::SettleElapsed(2),
            WindowEvent::Closed,
        ] {
            let _ = machine.transition(event).expect("valid lifecycle");
        }

        assert_eq!(machine.phase(), WindowPhase::Closed);
        assert_eq!(machine.history().len(), 5);
        assert_eq!(
            machine.history()[0],
            PhaseTransition::new(WindowPhase::Registered, WindowEvent::Shown, WindowPhase::Loaded)
        );
        assert_eq!(
            machine.history()[2],
            PhaseTransition::new(WindowPhase::Resizing, WindowEvent::Moved, WindowPhase::Resizing)
        );
        assert_eq!(
            machine.history()[3],
            PhaseTransition::new(
                WindowPhase::Resizing,
                WindowEvent::SettleElapsed(2),
                WindowPhase::Settled
            )
        );
    }

    #[test]
    fn history_keeps_only_recent_transitions() {
        let mut machine = PhaseMachine::new();
        machine.transition(WindowEvent::Shown).expect("shown");
        for _ in 0..HISTORY_LIMIT * 4 {
            machine.transition(WindowEvent::Moved).expect("moved");
        }

        assert_eq!(machine.history().len(), HISTORY_LIMIT);
        assert_eq!(
            machine.history().front(),
            Some(&PhaseTransition::new(
                WindowPhase::Resizing,
                WindowEvent::Moved,
                WindowPhase::Resizing
            ))
        );
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = PhaseMachine::new();

        let err = machine
            .transition(WindowEvent::SettleElapsed(0))
            .expect_err("registered -> settle should fail");
        assert!(matches!(
            err,
            StateError::InvalidStateTransition {
                from: WindowPhase::Registered,
                event: WindowEvent::SettleElapsed(0)
            }
        ));
        assert_eq!(machine.phase(), WindowPhase::Registered);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn closed_is_terminal() {
        let mut machine = PhaseMachine::new();
        let _ = machine.transition(WindowEvent::Disposed).expect("dispose before show");
        assert_eq!(machine.phase(), WindowPhase::Closed);
        assert!(!machine.can_transition(WindowEvent::Closed));
        assert!(!machine.can_transition(WindowEvent::Shown));
        assert_eq!(machine.to_string(), "WindowPhase::Closed");
    }
}
