//! HTTP implementation of the service traits using `reqwest`.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tripgate_protocol::{
    ApiEnvelope, IdentityPayload, LoginRequest, RegisterRequest,
    StatusPayload, VerificationSubmission,
};

use crate::{AuthApi, TransportError, VerificationApi};

/// What a request proves its identity with. Only a refused session token
/// means the session is over; a 401 on a password call is just a wrong
/// password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credential {
    Password,
    Token,
}

/// Talks to the marketplace backend over HTTP.
///
/// Authenticated calls send the session token as a bearer header.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base: String,
    http: reqwest::Client,
}

impl HttpApi {
    /// Creates a client for the API rooted at `base`
    /// (e.g. `https://api.example.com/v1`).
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// The configured base URL.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.trim_end_matches('/'), path)
    }

    /// Sends a request and unwraps the `{ data }` envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
        credential: Credential,
    ) -> Result<T, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED && credential == Credential::Token {
            tracing::debug!(operation, "session token rejected");
            return Err(TransportError::Unauthorized);
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(TransportError::Decode(e.to_string()));
            }
            Err(_) => {
                return Err(TransportError::Rejected {
                    status: Some(status.as_u16()),
                    message: status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_owned(),
                });
            }
        };

        match envelope.into_result() {
            Ok(data) if status.is_success() => Ok(data),
            Ok(_) => Err(TransportError::Rejected {
                status: Some(status.as_u16()),
                message: "request failed".to_owned(),
            }),
            Err(e) => {
                tracing::debug!(operation, %status, error = %e, "request rejected");
                Err(match TransportError::from(e) {
                    TransportError::Rejected { message, .. } => {
                        TransportError::Rejected {
                            status: Some(status.as_u16()),
                            message,
                        }
                    }
                    other => other,
                })
            }
        }
    }
}

impl AuthApi for HttpApi {
    async fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<IdentityPayload, TransportError> {
        let req = self.http.post(self.url("/auth/login")).json(request);
        self.send(req, "login", Credential::Password).await
    }

    async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<IdentityPayload, TransportError> {
        let req = self.http.post(self.url("/auth/register")).json(request);
        self.send(req, "register", Credential::Password).await
    }

    async fn me(&self, token: &str) -> Result<IdentityPayload, TransportError> {
        let req = self.http.get(self.url("/auth/me")).bearer_auth(token);
        self.send(req, "me", Credential::Token).await
    }

    async fn logout(&self, token: &str) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        // The body is `{ data: {} }` or empty; only the status matters.
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(TransportError::Unauthorized),
            s => Err(TransportError::Rejected {
                status: Some(s.as_u16()),
                message: "logout failed".to_owned(),
            }),
        }
    }
}

impl VerificationApi for HttpApi {
    async fn submit(
        &self,
        token: &str,
        submission: &VerificationSubmission,
    ) -> Result<StatusPayload, TransportError> {
        let req = self
            .http
            .post(self.url("/agents/verification"))
            .bearer_auth(token)
            .json(submission);
        self.send(req, "submit verification", Credential::Token).await
    }

    async fn status(
        &self,
        token: &str,
    ) -> Result<Option<StatusPayload>, TransportError> {
        let req = self
            .http
            .get(self.url("/agents/verification"))
            .bearer_auth(token);
        self.send(req, "verification status", Credential::Token).await
    }
}
