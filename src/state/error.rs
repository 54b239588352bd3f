use super::event::WindowEvent;
use super::model::WindowPhase;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid window transition: from {from:?} using event {event:?}")]
    InvalidStateTransition {
        from: WindowPhase,
        event: WindowEvent,
    },
}
