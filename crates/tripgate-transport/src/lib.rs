//! Service abstraction layer for Tripgate.
//!
//! The session layer never talks HTTP directly. It calls the marketplace
//! backend through two traits:
//!
//! - [`AuthApi`]: login, registration, "who am I", logout
//! - [`VerificationApi`]: agent verification submission and status
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpApi`], a `reqwest` implementation of both
//!
//! [`StubApi`] is an in-memory backend implementing both traits, used by
//! the demo and by tests across the workspace.

mod error;
#[cfg(feature = "http")]
mod http;
mod stub;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpApi;
pub use stub::{Endpoint, StubApi};

use std::future::Future;

use tripgate_protocol::{
    IdentityPayload, LoginRequest, RegisterRequest, StatusPayload,
    VerificationSubmission,
};

/// The authentication service.
///
/// Every method resolves to the `data` part of the response envelope, or
/// a [`TransportError`] telling the caller which of the failure classes
/// (network, rejection, expired session, garbage) happened.
///
/// The returned futures are `Send` so one call can be shared between
/// tasks while it is in flight.
pub trait AuthApi: Send + Sync + 'static {
    /// `POST /auth/login` → `{ token, user }`.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<IdentityPayload, TransportError>> + Send;

    /// `POST /auth/register` → `{ token, user }`.
    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<IdentityPayload, TransportError>> + Send;

    /// `GET /auth/me` → `{ user }`.
    ///
    /// Returns [`TransportError::Unauthorized`] when `token` is no longer
    /// accepted.
    fn me(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<IdentityPayload, TransportError>> + Send;

    /// `POST /auth/logout`.
    fn logout(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// The agent verification service.
pub trait VerificationApi: Send + Sync + 'static {
    /// `POST /agents/verification` → `{ status }`.
    fn submit(
        &self,
        token: &str,
        submission: &VerificationSubmission,
    ) -> impl Future<Output = Result<StatusPayload, TransportError>> + Send;

    /// `GET /agents/verification` → `{ status }`, or `None` when the
    /// agent has never submitted anything.
    fn status(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<StatusPayload>, TransportError>> + Send;
}

/// Shared handles forward to the inner service, so one client can back
/// both the session controller and the verification flow.
impl<T: AuthApi> AuthApi for std::sync::Arc<T> {
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<IdentityPayload, TransportError>> + Send {
        (**self).login(request)
    }

    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<IdentityPayload, TransportError>> + Send {
        (**self).register(request)
    }

    fn me(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<IdentityPayload, TransportError>> + Send {
        (**self).me(token)
    }

    fn logout(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).logout(token)
    }
}

impl<T: VerificationApi> VerificationApi for std::sync::Arc<T> {
    fn submit(
        &self,
        token: &str,
        submission: &VerificationSubmission,
    ) -> impl Future<Output = Result<StatusPayload, TransportError>> + Send {
        (**self).submit(token, submission)
    }

    fn status(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<StatusPayload>, TransportError>> + Send
    {
        (**self).status(token)
    }
}
