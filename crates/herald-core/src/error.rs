//! Error types shared by transport implementations.

use thiserror::Error;

/// A type-erased error, used wherever user code can fail in arbitrary ways.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while sending a reply.
#[derive(Debug, Error)]
pub enum SendError {
    /// The client is not connected to its transport.
    #[error("client is not connected")]
    NotConnected,

    /// The remote side refused the message.
    #[error("message rejected: {reason}")]
    Rejected {
        /// Reason reported by the remote side.
        reason: String,
    },

    /// Any other transport failure.
    #[error(transparent)]
    Transport(BoxError),
}

impl SendError {
    /// Creates a rejection error with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Wraps an arbitrary transport error.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }
}

/// Result type for reply operations.
pub type SendResult<T> = Result<T, SendError>;
