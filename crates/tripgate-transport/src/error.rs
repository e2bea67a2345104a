use tripgate_protocol::ProtocolError;

/// Errors that can occur while talking to the backend services.
///
/// `Clone` because one in-flight call may be shared by several callers,
/// and each of them gets its own copy of the outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No response was received (DNS, connection refused, timeout, ...).
    #[error("network failure: {0}")]
    Network(String),

    /// A response arrived but it signals failure: bad credentials,
    /// validation error, duplicate email, ...
    #[error("request rejected: {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    /// An authenticated call was refused because the session token is
    /// invalid or expired.
    #[error("session token rejected")]
    Unauthorized,

    /// A success response whose body couldn't be understood.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Returns `true` for the authorization-expiry case.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// A message that can be shown to the person using the app.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Unable to reach the server. Check your connection and try again."
                    .to_owned()
            }
            Self::Rejected { message, .. } => message.clone(),
            Self::Unauthorized => {
                "Your session has expired. Please sign in again.".to_owned()
            }
            Self::Decode(_) => "Unexpected response from the server.".to_owned(),
        }
    }
}

impl From<ProtocolError> for TransportError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Rejected(message) => Self::Rejected {
                status: None,
                message,
            },
            other => Self::Decode(other.to_string()),
        }
    }
}
