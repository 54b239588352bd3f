use crate::geometry::{ParseEnumError, ParseRectError};
use crate::properties::PropertyError;
use crate::state::StateError;
use crate::storage::StoreError;
use thiserror::Error;

pub type PlacementResult<T> = std::result::Result<T, PlacementError>;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Geometry(#[from] ParseRectError),
    #[error(transparent)]
    Enum(#[from] ParseEnumError),
    #[error("window of type {type_tag} has no uid, name or `Name=` tag and cannot be tracked")]
    MissingIdentity { type_tag: String },
    #[error("window {0} is not tracked")]
    UnknownWindow(String),
}

/// Whether property traversal failures abort the operation or are reported
/// through the notifier and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    Strict,
    #[default]
    Resilient,
}

impl ErrorPolicy {
    pub const fn from_strict(strict: bool) -> Self {
        if strict {
            Self::Strict
        } else {
            Self::Resilient
        }
    }
}
