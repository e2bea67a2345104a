//! Principal types: the data structures that represent the signed-in user.
//!
//! A "principal" is the client's record of who is signed in. It tracks:
//! - WHO they are (`id`, `name`, `email`)
//! - WHAT they may do (`role`, and for agents `specialization` and
//!   `verification_status`)
//! - HOW to prove it on later calls (`session_token`)

use serde::{Deserialize, Serialize};
use tripgate_protocol::{PrincipalId, Role, Specialization, VerificationStatus};

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// The authenticated user.
///
/// Exactly one principal is active at a time, or none. This is also the
/// record written to durable storage, so its serialized form is stable:
/// camelCase keys, canonical enum names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Stable for the account's lifetime.
    pub id: PrincipalId,

    pub name: String,

    pub email: String,

    /// Issued by the server; never changed by a partial update.
    pub role: Role,

    /// Only agents carry one. Set once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<Specialization>,

    /// Only meaningful for agents. Forward-only for local updates.
    #[serde(default)]
    pub verification_status: VerificationStatus,

    /// Opaque credential attached to authenticated requests.
    pub session_token: String,
}

impl Principal {
    /// Returns `true` if the principal has the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_agent(&self) -> bool {
        self.has_role(Role::Agent)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Returns `true` for an agent whose verification was approved.
    pub fn is_verified_agent(&self) -> bool {
        self.is_agent() && self.verification_status == VerificationStatus::Verified
    }
}

// ---------------------------------------------------------------------------
// PrincipalPatch
// ---------------------------------------------------------------------------

/// A bank of optional fields to merge onto the cached principal.
///
/// There is deliberately no `id`, `role`, or `session_token` here: those
/// only change when a whole new principal arrives from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub specialization: Option<Specialization>,
    pub verification_status: Option<VerificationStatus>,
}

impl PrincipalPatch {
    /// A patch that only touches the verification status.
    pub fn verification(status: VerificationStatus) -> Self {
        Self {
            verification_status: Some(status),
            ..Self::default()
        }
    }

    /// Reads a partial server payload, using the same field aliases as a
    /// full login response (see [`crate::merge`]).
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        crate::merge::patch_from_payload(payload)
    }

    /// Returns `true` if the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.specialization.is_none()
            && self.verification_status.is_none()
    }

    /// Returns a copy of `base` with this patch applied.
    ///
    /// - `name` and `email` overwrite.
    /// - `specialization` fills an empty slot on an agent; an existing one
    ///   is kept.
    /// - `verification_status` only moves forward
    ///   (see [`VerificationStatus::advance_to`]).
    ///
    /// Absent fields keep their previous value.
    pub fn apply_to(&self, base: &Principal) -> Principal {
        let mut next = base.clone();

        if let Some(name) = &self.name {
            next.name.clone_from(name);
        }
        if let Some(email) = &self.email {
            next.email.clone_from(email);
        }
        if let Some(spec) = self.specialization {
            match next.specialization {
                None if next.is_agent() => next.specialization = Some(spec),
                Some(existing) if existing != spec => {
                    tracing::debug!(
                        principal_id = %next.id,
                        %existing,
                        ignored = %spec,
                        "specialization is set once; keeping existing"
                    );
                }
                _ => {}
            }
        }
        if let Some(status) = self.verification_status {
            let advanced = next.verification_status.advance_to(status);
            if advanced != status {
                tracing::debug!(
                    principal_id = %next.id,
                    current = %next.verification_status,
                    ignored = %status,
                    "verification status is forward-only; keeping current"
                );
            }
            next.verification_status = advanced;
        }

        next
    }
}

// ---------------------------------------------------------------------------
// AuthOutcome
// ---------------------------------------------------------------------------

/// The result of a login or registration attempt.
///
/// Failures never escape as errors at this boundary: the caller gets a
/// message it can show inline and in a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Signed in; this is the canonical principal now in the store.
    Success(Principal),

    /// Nothing changed. `message` is human-readable.
    Failure { message: String },
}

impl AuthOutcome {
    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The signed-in principal, on success.
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Success(p) => Some(p),
            Self::Failure { .. } => None,
        }
    }

    /// The failure message, on failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { message } => Some(message),
        }
    }
}
