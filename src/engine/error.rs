use thiserror::Error;

use crate::model::{Reservation, SpanError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid span: {0}")]
    InvalidSpan(#[from] SpanError),
    #[error("conflict with reservation: {0}")]
    Conflict(Box<Reservation>),
    #[error("unable to move reservation")]
    MoveFailed(#[source] Box<EngineError>),
    #[error("unable to swap reservation for maintenance")]
    SwapFailed(#[source] Box<EngineError>),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    pub(crate) fn conflict(existing: &Reservation) -> Self {
        EngineError::Conflict(Box::new(existing.clone()))
    }

    /// The reservation that blocked the operation, looking through
    /// move/swap wrappers.
    pub fn conflicting(&self) -> Option<&Reservation> {
        match self {
            EngineError::Conflict(existing) => Some(existing),
            EngineError::MoveFailed(cause) | EngineError::SwapFailed(cause) => cause.conflicting(),
            _ => None,
        }
    }
}
