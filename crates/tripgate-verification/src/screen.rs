//! What the verification page and the agent dashboard show.

use tripgate_protocol::VerificationStatus;
use tripgate_session::Principal;

use crate::VerificationError;

/// The view for the verification page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationScreen {
    /// Not submitted yet: show the form.
    Form,

    /// Submitted, waiting for an admin: show the under-review notice
    /// instead of the form.
    UnderReview,

    /// Already verified: the page has nothing to offer, send the agent to
    /// their dashboard.
    RedirectToDashboard,
}

/// Picks the verification page view for `principal`.
///
/// # Errors
/// - [`VerificationError::NotAuthenticated`] when nobody is signed in
/// - [`VerificationError::NotAnAgent`] for customers and admins
pub fn screen_for(
    principal: Option<&Principal>,
) -> Result<VerificationScreen, VerificationError> {
    let principal = principal.ok_or(VerificationError::NotAuthenticated)?;
    if !principal.is_agent() {
        return Err(VerificationError::NotAnAgent(principal.role));
    }
    Ok(match principal.verification_status {
        VerificationStatus::Unverified => VerificationScreen::Form,
        VerificationStatus::Pending => VerificationScreen::UnderReview,
        VerificationStatus::Verified => VerificationScreen::RedirectToDashboard,
    })
}

/// Only verified agents may create listings.
pub fn can_list_products(principal: &Principal) -> bool {
    principal.is_verified_agent()
}

/// The agent dashboard is shown blurred, with a call to finish
/// verification, until the agent is verified.
pub fn dashboard_locked(principal: &Principal) -> bool {
    principal.is_agent() && !principal.is_verified_agent()
}

#[cfg(test)]
mod tests {
    use tripgate_protocol::{PrincipalId, Role, Specialization};

    use super::*;

    fn principal(role: Role, status: VerificationStatus) -> Principal {
        Principal {
            id: PrincipalId::from("u-1"),
            name: "Ana".into(),
            email: "a@b.com".into(),
            role,
            specialization: (role == Role::Agent).then_some(Specialization::Tour),
            verification_status: status,
            session_token: "t".into(),
        }
    }

    #[test]
    fn test_screen_for_follows_status() {
        let cases = [
            (VerificationStatus::Unverified, VerificationScreen::Form),
            (VerificationStatus::Pending, VerificationScreen::UnderReview),
            (VerificationStatus::Verified, VerificationScreen::RedirectToDashboard),
        ];
        for (status, expected) in cases {
            let agent = principal(Role::Agent, status);
            assert_eq!(screen_for(Some(&agent)), Ok(expected));
        }
    }

    #[test]
    fn test_screen_for_rejects_non_agents() {
        let customer = principal(Role::Customer, VerificationStatus::Unverified);
        assert_eq!(
            screen_for(Some(&customer)),
            Err(VerificationError::NotAnAgent(Role::Customer))
        );
        assert_eq!(screen_for(None), Err(VerificationError::NotAuthenticated));
    }

    #[test]
    fn test_dashboard_locked_until_verified() {
        let pending = principal(Role::Agent, VerificationStatus::Pending);
        assert!(dashboard_locked(&pending));
        assert!(!can_list_products(&pending));

        let verified = principal(Role::Agent, VerificationStatus::Verified);
        assert!(!dashboard_locked(&verified));
        assert!(can_list_products(&verified));
    }

    #[test]
    fn test_admin_is_never_locked_and_never_lists() {
        let admin = principal(Role::Admin, VerificationStatus::Unverified);
        assert!(!dashboard_locked(&admin));
        assert!(!can_list_products(&admin));
    }
}
