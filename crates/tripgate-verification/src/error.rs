use tripgate_protocol::{ProtocolError, Role, VerificationStatus};
use tripgate_transport::TransportError;

/// Errors from the verification workflow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("not signed in")]
    NotAuthenticated,

    /// Only agents go through verification.
    #[error("verification is only for agents (signed in as {0})")]
    NotAnAgent(Role),

    /// The agent already submitted; nothing was sent.
    #[error("verification is already {0}")]
    AlreadySubmitted(VerificationStatus),

    /// The agent record has no specialization to attach.
    #[error("agent has no specialization on record")]
    MissingSpecialization,

    /// The form failed local validation; nothing was sent.
    #[error("invalid verification form: {0}")]
    InvalidForm(#[from] ProtocolError),

    /// The verification service call failed. When the token was refused
    /// the session has already been cleared.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl VerificationError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_unauthorized())
    }

    /// A message that can be shown next to the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please sign in to continue.".to_owned(),
            Self::NotAnAgent(_) => {
                "Only agent accounts can be verified.".to_owned()
            }
            Self::AlreadySubmitted(VerificationStatus::Verified) => {
                "Your account is already verified.".to_owned()
            }
            Self::AlreadySubmitted(_) => {
                "Your verification is already under review.".to_owned()
            }
            Self::MissingSpecialization => {
                "Your account has no specialization. Please contact support."
                    .to_owned()
            }
            Self::InvalidForm(ProtocolError::MissingField(field)) => {
                format!("Please fill in {field}.")
            }
            Self::InvalidForm(_) => "Please check the form and try again.".to_owned(),
            Self::Transport(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_names_missing_field() {
        let err: VerificationError = ProtocolError::MissingField("taxId").into();
        assert_eq!(err.user_message(), "Please fill in taxId.");
    }

    #[test]
    fn test_is_unauthorized_only_for_refused_token() {
        assert!(VerificationError::Transport(TransportError::Unauthorized)
            .is_unauthorized());
        assert!(!VerificationError::NotAuthenticated.is_unauthorized());
    }
}
