use std::fmt;

use crate::core::session::{ConsumptionMode, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullError {
    /// The transport channel failed or rejected an operation.
    ChannelClosed(String),
    /// The reading side of a delivery buffer was dropped.
    BufferClosed,
    /// Synchronous and asynchronous consumption attempted within one session.
    ModeConflict {
        session: SessionId,
        active: ConsumptionMode,
    },
    Timeout,
    Internal(String), // for any custom internal errors
}

impl std::error::Error for PullError {}

impl fmt::Display for PullError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullError::ChannelClosed(msg) => write!(f, "Channel closed: {msg}"),
            PullError::BufferClosed => write!(f, "Delivery buffer is closed"),
            PullError::ModeConflict { session, active } => write!(
                f,
                "Session {session} is already in {active} mode; \
                 synchronous and asynchronous consumption cannot be mixed"
            ),
            PullError::Timeout => write!(f, "Operation timed out"),
            PullError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}
