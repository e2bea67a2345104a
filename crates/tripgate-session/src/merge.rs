//! Identity merge logic.
//!
//! The backend is not consistent about how it spells a user. Login,
//! registration and "who am I" each return slightly different shapes, and
//! the verification status in particular shows up under more than one
//! name. This module is the one place that knows all the spellings.
//!
//! For every logical field there is an alias list. The first alias that is
//! present (and not `null`) wins, so the result is deterministic no matter
//! how many spellings a payload carries at once.

use serde_json::Value;
use tripgate_protocol::{
    IdentityPayload, PrincipalId, Role, Specialization, VerificationStatus,
};

use crate::{Principal, PrincipalPatch, SessionError};

/// Where the account id may appear.
pub const ID_ALIASES: &[&str] = &["id", "_id", "userId"];

/// Where the display name may appear.
pub const NAME_ALIASES: &[&str] = &["name", "fullName"];

pub const EMAIL_ALIASES: &[&str] = &["email"];

pub const ROLE_ALIASES: &[&str] = &["role"];

pub const SPECIALIZATION_ALIASES: &[&str] =
    &["specialization", "agentSpecialization"];

/// Where the verification status may appear, qualified names first.
///
/// The bare `status` is last: some payloads use it for unrelated account
/// states, so it only counts when nothing more specific is there.
pub const VERIFICATION_STATUS_ALIASES: &[&str] =
    &["verificationStatus", "verification_status", "status"];

/// Where the session token may appear, at the top of the payload or on
/// the user object.
pub const TOKEN_ALIASES: &[&str] = &["token", "accessToken", "access_token"];

/// Builds a brand-new principal from a login / register / "who am I"
/// payload.
///
/// `fallback_token` is the token the call was made with; it is used when
/// the payload doesn't carry one (e.g. `/auth/me` returns only `{ user }`).
///
/// # Errors
/// Returns [`SessionError::InvalidIdentity`] when the id, the role, or any
/// token is missing, or the role isn't one we know.
pub fn principal_from_payload(
    payload: &IdentityPayload,
    fallback_token: Option<&str>,
) -> Result<Principal, SessionError> {
    let root = payload.as_value();
    let user = user_object(root);

    let id = first_text(user, ID_ALIASES)
        .ok_or_else(|| SessionError::InvalidIdentity("missing id".into()))?;

    let role = first_present(user, ROLE_ALIASES)
        .and_then(Value::as_str)
        .ok_or_else(|| SessionError::InvalidIdentity("missing role".into()))?
        .parse::<Role>()
        .map_err(|e| SessionError::InvalidIdentity(e.to_string()))?;

    let session_token = first_text(root, TOKEN_ALIASES)
        .or_else(|| first_text(user, TOKEN_ALIASES))
        .or_else(|| fallback_token.map(str::to_owned))
        .ok_or_else(|| SessionError::InvalidIdentity("missing token".into()))?;

    // Only agents have a specialization; anything else sent for a
    // customer or admin is noise.
    let specialization = match role {
        Role::Agent => first_parsed(user, SPECIALIZATION_ALIASES),
        Role::Customer | Role::Admin => None,
    };

    let verification_status = verification_status(user).unwrap_or_default();

    Ok(Principal {
        id: PrincipalId(id),
        name: first_text(user, NAME_ALIASES).unwrap_or_default(),
        email: first_text(user, EMAIL_ALIASES).unwrap_or_default(),
        role,
        specialization,
        verification_status,
        session_token,
    })
}

/// Reads a partial payload into a [`PrincipalPatch`].
///
/// Uses the same alias table as [`principal_from_payload`]. Fields that
/// are absent stay `None`, so applying the patch leaves them untouched.
/// Identity fields (id, role, token) are ignored.
pub fn patch_from_payload(payload: &Value) -> PrincipalPatch {
    let user = user_object(payload);
    PrincipalPatch {
        name: first_text(user, NAME_ALIASES),
        email: first_text(user, EMAIL_ALIASES),
        specialization: first_parsed(user, SPECIALIZATION_ALIASES),
        verification_status: verification_status(user),
    }
}

/// The verification status under its first recognizable alias, or `None`
/// when no alias carries one.
pub fn verification_status(user: &Value) -> Option<VerificationStatus> {
    first_parsed(user, VERIFICATION_STATUS_ALIASES)
}

/// The user object: `payload.user` when present, else the payload itself.
fn user_object(payload: &Value) -> &Value {
    payload
        .get("user")
        .filter(|u| u.is_object())
        .unwrap_or(payload)
}

fn first_present<'a>(object: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| object.get(key))
        .find(|v| !v.is_null())
}

/// First alias holding a string or a number, as text. Ids are sometimes
/// numeric.
fn first_text(object: &Value, aliases: &[&str]) -> Option<String> {
    first_present(object, aliases).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First alias whose value parses as `T`.
///
/// A present-but-unrecognized value is skipped (and logged) so a lower
/// precedence alias still gets its chance.
fn first_parsed<T: std::str::FromStr>(
    object: &Value,
    aliases: &[&str],
) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    for key in aliases {
        let Some(raw) = object.get(key).and_then(Value::as_str) else {
            continue;
        };
        match raw.parse::<T>() {
            Ok(value) => return Some(value),
            Err(e) => tracing::debug!(key, error = %e, "skipping unrecognized alias value"),
        }
    }
    None
}
