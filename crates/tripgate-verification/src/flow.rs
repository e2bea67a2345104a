//! Submitting the verification form and following its review.

use serde::{Deserialize, Serialize};
use tripgate_protocol::{
    AgentType, Specialization, VerificationStatus, VerificationSubmission,
};
use tripgate_session::{Principal, PrincipalPatch, SessionController, Storage};
use tripgate_transport::{AuthApi, TransportError, VerificationApi};

use crate::VerificationError;

/// What the agent fills in on the verification page.
///
/// The specialization isn't part of the form: it was fixed at
/// registration and is attached from the session when submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationForm {
    pub agent_type: AgentType,
    pub id_number: String,
    pub tax_id: String,
    #[serde(default)]
    pub company_name: Option<String>,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

impl VerificationForm {
    /// Builds the request body, attaching the agent's specialization.
    pub fn into_submission(
        self,
        specialization: Specialization,
    ) -> VerificationSubmission {
        VerificationSubmission {
            agent_type: self.agent_type,
            id_number: self.id_number,
            tax_id: self.tax_id,
            company_name: self.company_name,
            bank_name: self.bank_name,
            account_number: self.account_number,
            account_holder: self.account_holder,
            specialization,
        }
    }
}

/// Drives verification for the signed-in agent.
#[derive(Debug, Clone)]
pub struct VerificationFlow<V> {
    api: V,
}

impl<V: VerificationApi> VerificationFlow<V> {
    pub fn new(api: V) -> Self {
        Self { api }
    }

    /// Sends the verification form.
    ///
    /// Everything that can be checked locally is checked before the call:
    /// someone is signed in, they are an agent, they haven't submitted
    /// yet, and the form is complete. The call is made once, with no
    /// retry.
    ///
    /// On success the session moves to `PENDING` right away, without
    /// waiting for a refresh, so the page can switch to the under-review
    /// view. On failure nothing changes.
    ///
    /// # Errors
    /// See [`VerificationError`]. A refused token also ends the session.
    pub async fn submit<A, S>(
        &self,
        session: &SessionController<A, S>,
        form: VerificationForm,
    ) -> Result<Principal, VerificationError>
    where
        A: AuthApi,
        S: Storage,
    {
        let principal = signed_in_agent(session)?;
        if principal.verification_status != VerificationStatus::Unverified {
            return Err(VerificationError::AlreadySubmitted(
                principal.verification_status,
            ));
        }
        let specialization = principal
            .specialization
            .ok_or(VerificationError::MissingSpecialization)?;

        let submission = form.into_submission(specialization);
        submission.validate()?;

        let token = principal.session_token;
        let response = self
            .api
            .submit(&token, &submission)
            .await
            .map_err(|e| expire_on_unauthorized(session, &token, e))?;

        // Approval is only taken from an authoritative read; whatever the
        // submission response says, the local step stops at PENDING.
        let reported = response.status.unwrap_or(VerificationStatus::Pending);
        tracing::info!(
            principal_id = %principal.id,
            %reported,
            "verification submitted"
        );

        session
            .update_local(PrincipalPatch::verification(VerificationStatus::Pending))
            .ok_or(VerificationError::NotAuthenticated)
    }

    /// Asks the service where the review stands and applies the answer.
    ///
    /// Returns the agent's status afterwards, or `None` when the service
    /// has no submission on file (the session is left as is). A status
    /// older than the one already known is ignored.
    ///
    /// # Errors
    /// See [`VerificationError`]. A refused token also ends the session.
    pub async fn sync_status<A, S>(
        &self,
        session: &SessionController<A, S>,
    ) -> Result<Option<VerificationStatus>, VerificationError>
    where
        A: AuthApi,
        S: Storage,
    {
        let principal = signed_in_agent(session)?;
        let token = principal.session_token;

        let response = self
            .api
            .status(&token)
            .await
            .map_err(|e| expire_on_unauthorized(session, &token, e))?;

        let Some(status) = response.and_then(|r| r.status) else {
            tracing::debug!(principal_id = %principal.id, "no verification on file");
            return Ok(None);
        };

        let updated = session
            .update_local(PrincipalPatch::verification(status))
            .ok_or(VerificationError::NotAuthenticated)?;
        Ok(Some(updated.verification_status))
    }

    pub fn api(&self) -> &V {
        &self.api
    }
}

fn signed_in_agent<A, S>(
    session: &SessionController<A, S>,
) -> Result<Principal, VerificationError>
where
    A: AuthApi,
    S: Storage,
{
    let principal = session
        .current()
        .ok_or(VerificationError::NotAuthenticated)?;
    if !principal.is_agent() {
        return Err(VerificationError::NotAnAgent(principal.role));
    }
    Ok(principal)
}

fn expire_on_unauthorized<A, S>(
    session: &SessionController<A, S>,
    token: &str,
    err: TransportError,
) -> VerificationError
where
    A: AuthApi,
    S: Storage,
{
    if err.is_unauthorized() {
        session.expire(token);
    } else {
        tracing::warn!(error = %err, "verification call failed");
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_submission_attaches_specialization() {
        let form = VerificationForm {
            agent_type: AgentType::Individual,
            id_number: "ID-1".into(),
            tax_id: "TX-1".into(),
            company_name: None,
            bank_name: "Bank".into(),
            account_number: "0001".into(),
            account_holder: "Ana".into(),
        };

        let submission = form.into_submission(Specialization::Transport);

        assert_eq!(submission.specialization, Specialization::Transport);
        assert_eq!(submission.id_number, "ID-1");
    }

    #[test]
    fn test_form_deserializes_camel_case() {
        let form: VerificationForm = serde_json::from_str(
            r#"{
                "agentType": "COMPANY",
                "idNumber": "ID-1",
                "taxId": "TX-1",
                "companyName": "Ana Tours",
                "bankName": "Bank",
                "accountNumber": "0001",
                "accountHolder": "Ana Tours"
            }"#,
        )
        .unwrap();
        assert_eq!(form.agent_type, AgentType::Company);
        assert_eq!(form.company_name.as_deref(), Some("Ana Tours"));
    }
}
