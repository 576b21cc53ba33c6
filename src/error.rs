//! Error types for the WebSocket transport adapter.
//!
//! Every synchronous operation of the I/O contract reports failure through
//! [`Error`]. Failures discovered while the engine is being pumped never
//! surface here; they are delivered through the completion callbacks instead.

use thiserror::Error;

use crate::transport::IoState;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during transport operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A required configuration field is missing or empty.
    #[error("Invalid configuration: {0} is required")]
    ConfigInvalid(&'static str),

    /// Memory for a buffer copy or a queue entry could not be reserved.
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// The operation is not legal in the current state.
    #[error("Cannot {operation} while {state}")]
    StateViolation {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the instance was in.
        state: IoState,
    },

    /// An engine primitive (session creation, connect, notification) failed.
    #[error("Engine failure: {0}")]
    Engine(String),

    /// The pending-write queue could not be updated.
    #[error("Queue failure: {0}")]
    Queue(String),

    /// Send called with an empty payload.
    #[error("Cannot send an empty buffer")]
    EmptyBuffer,

    /// Trust anchor could not be loaded.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    pub(crate) const fn state(operation: &'static str, state: IoState) -> Self {
        Error::StateViolation { operation, state }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(err: std::collections::TryReserveError) -> Self {
        Error::Allocation(err.to_string())
    }
}
