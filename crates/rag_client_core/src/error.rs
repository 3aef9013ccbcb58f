//! crates/rag_client_core/src/error.rs
//!
//! The error type returned by every store operation.

/// A failed store operation. The `Display` text of the classified variants is
/// the message the user has already been shown.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The HTTP exchange succeeded but the envelope code was not OK.
    #[error("{message}")]
    Business { code: i32, message: String },

    /// The HTTP exchange itself failed (error status, timeout, network).
    #[error("{message}")]
    Transport { status: Option<u16>, message: String },

    /// The envelope was OK but its payload did not have the expected shape.
    #[error("{0}")]
    Decode(String),

    /// Reserved for local invariant violations. Not raised by the stores today.
    #[error("Local state error: {0}")]
    LocalState(String),
}

impl ClientError {
    /// HTTP status of a transport failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_business(&self) -> bool {
        matches!(self, ClientError::Business { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }
}

/// A convenience type alias for `Result<T, ClientError>`.
pub type ClientResult<T> = Result<T, ClientError>;
