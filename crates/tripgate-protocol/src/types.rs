//! Core protocol types for Tripgate's wire format.
//!
//! Everything here is either sent to the marketplace backend, received
//! from it, or written to durable client storage. The backend is loose
//! about casing ("agent", "AGENT", "Agent" all show up), so the closed
//! sets below parse case-insensitively and always serialize in the
//! canonical SCREAMING_CASE form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The opaque, stable identifier of an account.
///
/// Newtype wrapper so a principal id can't be confused with a session
/// token or an email, even though all three are strings underneath.
/// `#[serde(transparent)]` keeps it a bare string in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// What kind of account a principal is.
///
/// Issued by the server at registration/login and immutable for the
/// lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Books tours, stays, and transport.
    Customer,
    /// Lists products; must pass verification first.
    Agent,
    /// Moderates users and verification requests.
    Admin,
}

impl Role {
    /// The canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Agent => "AGENT",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "AGENT" => Ok(Self::Agent),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(ProtocolError::UnknownVariant("role", s.to_owned())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

// ---------------------------------------------------------------------------
// Specialization
// ---------------------------------------------------------------------------

/// The product line an agent sells. Only agents carry one, and it is
/// chosen once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Specialization {
    Tour,
    Stay,
    Transport,
}

impl Specialization {
    /// The canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tour => "TOUR",
            Self::Stay => "STAY",
            Self::Transport => "TRANSPORT",
        }
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Specialization {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TOUR" => Ok(Self::Tour),
            "STAY" => Ok(Self::Stay),
            "TRANSPORT" => Ok(Self::Transport),
            _ => Err(ProtocolError::UnknownVariant(
                "specialization",
                s.to_owned(),
            )),
        }
    }
}

impl TryFrom<String> for Specialization {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Specialization> for String {
    fn from(spec: Specialization) -> Self {
        spec.as_str().to_owned()
    }
}

// ---------------------------------------------------------------------------
// VerificationStatus: the agent verification state machine
// ---------------------------------------------------------------------------

/// Where an agent is in the verification workflow.
///
/// Transitions only move forward:
///
/// ```text
/// Unverified ──(submission accepted)──→ Pending ──(approved)──→ Verified
/// ```
///
/// - **Unverified**: the default for every agent. The submission form is
///   available and product listing is blocked.
/// - **Pending**: a submission was accepted and is under review. The form
///   is replaced by a read-only "under review" view.
/// - **Verified**: terminal. The agent can list products.
///
/// The variants are declared in workflow order, so the derived `Ord`
/// doubles as "how far along": `Pending > Unverified`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
}

impl VerificationStatus {
    /// The canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unverified => "UNVERIFIED",
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
        }
    }

    /// The single next state, or `None` from the terminal state.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unverified => Some(Self::Pending),
            Self::Pending => Some(Self::Verified),
            Self::Verified => None,
        }
    }

    /// Returns `true` if `target` is exactly one step ahead.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Moves toward `target` without ever moving backwards.
    ///
    /// Returns `target` when it is further along, otherwise `self`
    /// unchanged. Asking for the current state is a no-op.
    #[must_use]
    pub fn advance_to(self, target: Self) -> Self {
        self.max(target)
    }

    /// Returns `true` once no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNVERIFIED" => Ok(Self::Unverified),
            "PENDING" => Ok(Self::Pending),
            "VERIFIED" => Ok(Self::Verified),
            _ => Err(ProtocolError::UnknownVariant(
                "verification status",
                s.to_owned(),
            )),
        }
    }
}

impl TryFrom<String> for VerificationStatus {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VerificationStatus> for String {
    fn from(status: VerificationStatus) -> Self {
        status.as_str().to_owned()
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
///
/// `specialization` is required by the session layer when `role` is
/// [`Role::Agent`] and omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<Specialization>,
}

/// Whether the agent registers as a person or as a business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentType {
    Individual,
    Company,
}

/// Body of `POST /agents/verification`.
///
/// Ephemeral: built right before submission and dropped right after. The
/// client never persists identity documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSubmission {
    pub agent_type: AgentType,
    pub id_number: String,
    pub tax_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    pub specialization: Specialization,
}

impl VerificationSubmission {
    /// Checks that every required field is filled in.
    ///
    /// `company_name` is only required for [`AgentType::Company`].
    ///
    /// # Errors
    /// Returns [`ProtocolError::MissingField`] naming the first blank field.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let required = [
            ("idNumber", &self.id_number),
            ("taxId", &self.tax_id),
            ("bankName", &self.bank_name),
            ("accountNumber", &self.account_number),
            ("accountHolder", &self.account_holder),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ProtocolError::MissingField(name));
            }
        }

        let company_blank = self
            .company_name
            .as_deref()
            .is_none_or(|c| c.trim().is_empty());
        if self.agent_type == AgentType::Company && company_blank {
            return Err(ProtocolError::MissingField("companyName"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The loosely-shaped identity payload returned by login, register, and
/// "who am I".
///
/// Different endpoints disagree on field names (and on whether the user
/// sits under a `user` key), so this stays a raw JSON value. The session
/// layer's merge logic knows the aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityPayload(pub serde_json::Value);

impl IdentityPayload {
    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for IdentityPayload {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// `{ status }` as returned by the verification endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub status: Option<VerificationStatus>,
}

/// The response envelope every endpoint uses.
///
/// Either `{ "data": T }` or `{ "error": ..., "message": "..." }`.
///
/// `#[serde(untagged)]` means serde tries each variant in order and keeps
/// the first that fits. `Failure` is listed first because an `Option<T>`
/// payload would otherwise happily accept an error body as `data: null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiEnvelope<T> {
    /// The server refused the request.
    Failure {
        error: serde_json::Value,
        #[serde(default)]
        message: Option<String>,
    },

    /// The request succeeded.
    Data { data: T },
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the `data` payload.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Rejected`] carrying the server's
    /// human-readable message for a failure envelope. When the server sent
    /// no `message`, a string `error` is used instead.
    pub fn into_result(self) -> Result<T, ProtocolError> {
        match self {
            Self::Data { data } => Ok(data),
            Self::Failure { error, message } => {
                let message = message
                    .or_else(|| error.as_str().map(str::to_owned))
                    .unwrap_or_else(|| "request failed".to_owned());
                Err(ProtocolError::Rejected(message))
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =====================================================================
    // Closed sets
    // =====================================================================

    #[test]
    fn test_role_parses_case_insensitively() {
        assert_eq!("agent".parse::<Role>().unwrap(), Role::Agent);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" CUSTOMER ".parse::<Role>().unwrap(), Role::Customer);
    }

    #[test]
    fn test_role_unknown_returns_error() {
        let result = "superuser".parse::<Role>();
        assert!(
            matches!(result, Err(ProtocolError::UnknownVariant("role", ref s)) if s == "superuser")
        );
    }

    #[test]
    fn test_role_serializes_canonical_name() {
        let json = serde_json::to_value(Role::Customer).unwrap();
        assert_eq!(json, json!("CUSTOMER"));
        let back: Role = serde_json::from_value(json!("customer")).unwrap();
        assert_eq!(back, Role::Customer);
    }

    #[test]
    fn test_specialization_round_trip_through_lowercase() {
        let spec: Specialization =
            serde_json::from_value(json!("transport")).unwrap();
        assert_eq!(spec, Specialization::Transport);
        assert_eq!(serde_json::to_value(spec).unwrap(), json!("TRANSPORT"));
    }

    // =====================================================================
    // VerificationStatus state machine
    // =====================================================================

    #[test]
    fn test_verification_status_default_is_unverified() {
        assert_eq!(VerificationStatus::default(), VerificationStatus::Unverified);
    }

    #[test]
    fn test_verification_status_next_follows_strict_order() {
        assert_eq!(
            VerificationStatus::Unverified.next(),
            Some(VerificationStatus::Pending)
        );
        assert_eq!(
            VerificationStatus::Pending.next(),
            Some(VerificationStatus::Verified)
        );
        assert_eq!(VerificationStatus::Verified.next(), None);
        assert!(VerificationStatus::Verified.is_terminal());
    }

    #[test]
    fn test_verification_status_can_transition_to() {
        use VerificationStatus::*;
        assert!(Unverified.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Verified));
        assert!(!Unverified.can_transition_to(Verified));
        assert!(!Verified.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_verification_status_advance_never_regresses() {
        use VerificationStatus::*;
        assert_eq!(Unverified.advance_to(Pending), Pending);
        assert_eq!(Pending.advance_to(Verified), Verified);
        assert_eq!(Verified.advance_to(Pending), Verified);
        assert_eq!(Verified.advance_to(Unverified), Verified);
        assert_eq!(Pending.advance_to(Pending), Pending);
    }

    // =====================================================================
    // VerificationSubmission
    // =====================================================================

    fn submission() -> VerificationSubmission {
        VerificationSubmission {
            agent_type: AgentType::Individual,
            id_number: "ID-1".into(),
            tax_id: "TAX-1".into(),
            company_name: None,
            bank_name: "First Bank".into(),
            account_number: "000123".into(),
            account_holder: "Ana Agent".into(),
            specialization: Specialization::Tour,
        }
    }

    #[test]
    fn test_submission_json_uses_camel_case() {
        let json = serde_json::to_value(submission()).unwrap();
        assert_eq!(json["agentType"], "INDIVIDUAL");
        assert_eq!(json["idNumber"], "ID-1");
        assert_eq!(json["accountHolder"], "Ana Agent");
        assert_eq!(json["specialization"], "TOUR");
        assert!(json.get("companyName").is_none());
    }

    #[test]
    fn test_submission_validate_blank_field_returns_missing_field() {
        let mut s = submission();
        s.tax_id = "   ".into();
        assert_eq!(s.validate(), Err(ProtocolError::MissingField("taxId")));
    }

    #[test]
    fn test_submission_validate_company_requires_company_name() {
        let mut s = submission();
        s.agent_type = AgentType::Company;
        assert_eq!(
            s.validate(),
            Err(ProtocolError::MissingField("companyName"))
        );

        s.company_name = Some("Sunrise Travel Ltd".into());
        assert_eq!(s.validate(), Ok(()));
    }

    // =====================================================================
    // Envelope
    // =====================================================================

    #[test]
    fn test_envelope_data_unwraps() {
        let env: ApiEnvelope<StatusPayload> =
            serde_json::from_value(json!({ "data": { "status": "pending" } }))
                .unwrap();
        assert_eq!(
            env.into_result().unwrap().status,
            Some(VerificationStatus::Pending)
        );
    }

    #[test]
    fn test_envelope_failure_carries_message() {
        let env: ApiEnvelope<IdentityPayload> = serde_json::from_value(
            json!({ "error": true, "message": "Invalid credentials" }),
        )
        .unwrap();
        assert_eq!(
            env.into_result(),
            Err(ProtocolError::Rejected("Invalid credentials".into()))
        );
    }

    #[test]
    fn test_envelope_failure_without_message_uses_error_string() {
        let env: ApiEnvelope<Option<StatusPayload>> =
            serde_json::from_value(json!({ "error": "forbidden" })).unwrap();
        assert_eq!(
            env.into_result(),
            Err(ProtocolError::Rejected("forbidden".into()))
        );
    }

    #[test]
    fn test_envelope_null_data_is_none() {
        let env: ApiEnvelope<Option<StatusPayload>> =
            serde_json::from_value(json!({ "data": null })).unwrap();
        assert_eq!(env.into_result(), Ok(None));
    }

    #[test]
    fn test_register_request_omits_absent_specialization() {
        let req = RegisterRequest {
            name: "Cora".into(),
            email: "cora@example.com".into(),
            password: "pw".into(),
            role: Role::Customer,
            specialization: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["role"], "CUSTOMER");
        assert!(json.get("specialization").is_none());
    }
}
