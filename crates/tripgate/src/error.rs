//! Unified error type for Tripgate.

use tripgate_navigation::NavigationError;
use tripgate_protocol::ProtocolError;
use tripgate_session::{SessionError, StorageError};
use tripgate_transport::TransportError;
use tripgate_verification::VerificationError;

/// Top-level error that wraps all crate-specific errors.
///
/// Apps that use the `tripgate` crate can handle this one type; `?`
/// converts the sub-crate errors through the `#[from]` impls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripgateError {
    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A backend call failed (network, rejection, expired token).
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

impl TripgateError {
    /// Returns `true` when the underlying cause is a refused session
    /// token. The session is already cleared; the UI should go to login.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_unauthorized(),
            Self::Session(e) => e.is_unauthorized(),
            Self::Verification(e) => e.is_unauthorized(),
            _ => false,
        }
    }
}
