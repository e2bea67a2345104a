//! Error types for the session layer.

use tripgate_transport::TransportError;

use crate::StorageError;

/// Errors that can occur during session management.
///
/// `Clone` because a single refresh may be awaited by several callers at
/// once, and every one of them receives the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The operation needs a signed-in principal and there is none.
    #[error("not signed in")]
    NotAuthenticated,

    /// The session this call was made for ended (logout, or a different
    /// login) before the response arrived. The response was discarded.
    #[error("session changed while the request was in flight")]
    Superseded,

    /// The server's identity payload is missing something a principal
    /// can't exist without (id, role, token).
    #[error("invalid identity payload: {0}")]
    InvalidIdentity(String),

    /// The backend call failed. [`TransportError::Unauthorized`] here
    /// means the session has already been cleared.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Durable storage refused the write; neither the cache nor the
    /// durable copy changed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Returns `true` when the server rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_unauthorized())
    }

    /// A message that can be shown to the person using the app.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please sign in to continue.".to_owned(),
            Self::Superseded => {
                "Your session changed. Please try again.".to_owned()
            }
            Self::InvalidIdentity(_) => {
                "Unexpected response from the server.".to_owned()
            }
            Self::Transport(e) => e.user_message(),
            Self::Storage(_) => {
                "Unable to save your session on this device.".to_owned()
            }
        }
    }
}
