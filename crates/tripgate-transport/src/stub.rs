//! An in-memory marketplace backend.
//!
//! [`StubApi`] implements [`AuthApi`] and [`VerificationApi`] against a
//! handful of accounts held in memory. It behaves like the real services
//! closely enough to drive the whole session layer without a network:
//!
//! - login checks the password and issues a random session token
//! - register answers with a deliberately thin user (no specialization,
//!   no verification status), like the real endpoint
//! - "who am I" answers with the full user, or `Unauthorized` for a
//!   token it doesn't know
//! - verification submission moves an agent to `PENDING`
//!
//! On top of that it can inject failures ([`fail_next`](StubApi::fail_next)),
//! hold calls open until released ([`hold`](StubApi::hold)) so tests can
//! interleave concurrent operations deterministically, and count calls
//! per endpoint.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use serde_json::{Value, json};
use tokio::sync::Notify;
use tripgate_protocol::{
    IdentityPayload, LoginRequest, RegisterRequest, Role, Specialization,
    StatusPayload, VerificationStatus, VerificationSubmission,
};

use crate::{AuthApi, TransportError, VerificationApi};

/// The operations the stub serves, used to target failures, holds, and
/// call counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Register,
    Me,
    Logout,
    SubmitVerification,
    VerificationStatus,
}

#[derive(Debug, Clone)]
struct Account {
    id: String,
    name: String,
    email: String,
    password: String,
    role: Role,
    specialization: Option<Specialization>,
    status: VerificationStatus,
    submitted: bool,
}

#[derive(Debug)]
struct StubState {
    accounts: Vec<Account>,
    /// Session token → index into `accounts`.
    sessions: HashMap<String, usize>,
    failures: HashMap<Endpoint, VecDeque<TransportError>>,
    calls: HashMap<Endpoint, usize>,
    gates: HashMap<Endpoint, Arc<Notify>>,
    /// Key the verification status is reported under in user objects.
    /// `None` leaves it out entirely.
    status_key: Option<&'static str>,
    next_id: u64,
}

impl StubState {
    fn account_for(&self, token: &str) -> Result<usize, TransportError> {
        self.sessions
            .get(token)
            .copied()
            .ok_or(TransportError::Unauthorized)
    }

    fn find_email(&self, email: &str) -> Option<usize> {
        self.accounts
            .iter()
            .position(|a| a.email.eq_ignore_ascii_case(email.trim()))
    }

    fn open_session(&mut self, index: usize) -> String {
        let token = generate_token();
        self.sessions.insert(token.clone(), index);
        token
    }

    fn render_user(&self, account: &Account) -> Value {
        let mut user = json!({
            "id": account.id,
            "name": account.name,
            "email": account.email,
            "role": account.role,
        });
        if let Some(spec) = account.specialization {
            user["specialization"] = json!(spec);
        }
        if let (Some(key), Role::Agent) = (self.status_key, account.role) {
            user[key] = json!(account.status);
        }
        user
    }
}

/// In-memory implementation of both service traits.
#[derive(Debug)]
pub struct StubApi {
    state: Mutex<StubState>,
}

impl StubApi {
    /// Creates an empty backend with no accounts.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StubState {
                accounts: Vec::new(),
                sessions: HashMap::new(),
                failures: HashMap::new(),
                calls: HashMap::new(),
                gates: HashMap::new(),
                status_key: Some("verificationStatus"),
                next_id: 1,
            }),
        }
    }

    /// Adds an account and returns its id.
    pub fn add_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        specialization: Option<Specialization>,
    ) -> String {
        let mut state = self.state.lock();
        let id = format!("u-{}", state.next_id);
        state.next_id += 1;
        state.accounts.push(Account {
            id: id.clone(),
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            role,
            specialization,
            status: VerificationStatus::Unverified,
            submitted: false,
        });
        id
    }

    /// Opens a session for `email` without going through login, as if the
    /// client had signed in during an earlier run.
    pub fn issue_token(&self, email: &str) -> Option<String> {
        let mut state = self.state.lock();
        let index = state.find_email(email)?;
        Some(state.open_session(index))
    }

    /// Reports the verification status under `key` (or not at all).
    ///
    /// The real backends disagree on the field name; this lets tests
    /// exercise each alias.
    #[must_use]
    pub fn with_status_key(self, key: Option<&'static str>) -> Self {
        self.state.lock().status_key = key;
        self
    }

    /// Sets an account's verification status, as a reviewer would.
    pub fn set_status(&self, email: &str, status: VerificationStatus) {
        let mut state = self.state.lock();
        if let Some(index) = state.find_email(email) {
            state.accounts[index].status = status;
            state.accounts[index].submitted = true;
        }
    }

    /// Approves an agent's verification.
    pub fn approve(&self, email: &str) {
        self.set_status(email, VerificationStatus::Verified);
    }

    /// Invalidates every session token, as if they all expired.
    pub fn revoke_sessions(&self) {
        self.state.lock().sessions.clear();
    }

    /// Makes the next call to `endpoint` fail with `error`.
    ///
    /// Calls can be queued; each one is consumed by a single call.
    pub fn fail_next(&self, endpoint: Endpoint, error: TransportError) {
        self.state
            .lock()
            .failures
            .entry(endpoint)
            .or_default()
            .push_back(error);
    }

    /// Holds calls to `endpoint` open until released.
    ///
    /// The response is computed when the call arrives (so it reflects the
    /// backend as it was at that moment), then the call waits on the
    /// returned gate. Call `notify_one()` once per held call to let it
    /// complete.
    pub fn hold(&self, endpoint: Endpoint) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().gates.insert(endpoint, Arc::clone(&gate));
        gate
    }

    /// Stops holding calls to `endpoint`. Calls already waiting still need
    /// their gate notified.
    pub fn release(&self, endpoint: Endpoint) {
        self.state.lock().gates.remove(&endpoint);
    }

    /// How many times `endpoint` was called.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// How many sessions are currently open.
    pub fn open_sessions(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Counts the call, then either pops a scripted failure or runs
    /// `handler`. Returns the gate to wait on, if the endpoint is held.
    fn serve<T>(
        &self,
        endpoint: Endpoint,
        handler: impl FnOnce(&mut StubState) -> Result<T, TransportError>,
    ) -> (Result<T, TransportError>, Option<Arc<Notify>>) {
        let mut state = self.state.lock();
        *state.calls.entry(endpoint).or_default() += 1;
        let gate = state.gates.get(&endpoint).cloned();

        let scripted = state
            .failures
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);
        let outcome = match scripted {
            Some(error) => Err(error),
            None => handler(&mut state),
        };
        (outcome, gate)
    }

    async fn respond<T>(
        &self,
        endpoint: Endpoint,
        handler: impl FnOnce(&mut StubState) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        let (outcome, gate) = self.serve(endpoint, handler);
        if let Some(gate) = gate {
            tracing::debug!(?endpoint, "stub call held");
            gate.notified().await;
        }
        outcome
    }
}

impl Default for StubApi {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthApi for StubApi {
    async fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<IdentityPayload, TransportError> {
        self.respond(Endpoint::Login, |state| {
            let index = state
                .find_email(&request.email)
                .filter(|&i| state.accounts[i].password == request.password)
                .ok_or_else(|| rejected(400, "Invalid email or password"))?;
            let token = state.open_session(index);
            let user = state.render_user(&state.accounts[index]);
            Ok(IdentityPayload(json!({ "token": token, "user": user })))
        })
        .await
    }

    async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<IdentityPayload, TransportError> {
        self.respond(Endpoint::Register, |state| {
            if state.find_email(&request.email).is_some() {
                return Err(rejected(409, "Email is already registered"));
            }
            if request.role == Role::Agent && request.specialization.is_none()
            {
                return Err(rejected(422, "Agents must choose a specialization"));
            }

            let id = format!("u-{}", state.next_id);
            state.next_id += 1;
            state.accounts.push(Account {
                id: id.clone(),
                name: request.name.clone(),
                email: request.email.clone(),
                password: request.password.clone(),
                role: request.role,
                specialization: request.specialization,
                status: VerificationStatus::Unverified,
                submitted: false,
            });
            let index = state.accounts.len() - 1;
            let token = state.open_session(index);

            // Thin on purpose: the real endpoint leaves out everything but
            // the basics, and clients are expected to call /auth/me.
            Ok(IdentityPayload(json!({
                "token": token,
                "user": {
                    "id": id,
                    "name": request.name,
                    "email": request.email,
                    "role": request.role,
                },
            })))
        })
        .await
    }

    async fn me(&self, token: &str) -> Result<IdentityPayload, TransportError> {
        self.respond(Endpoint::Me, |state| {
            let index = state.account_for(token)?;
            let user = state.render_user(&state.accounts[index]);
            Ok(IdentityPayload(json!({ "user": user })))
        })
        .await
    }

    async fn logout(&self, token: &str) -> Result<(), TransportError> {
        self.respond(Endpoint::Logout, |state| {
            state
                .sessions
                .remove(token)
                .map(|_| ())
                .ok_or(TransportError::Unauthorized)
        })
        .await
    }
}

impl VerificationApi for StubApi {
    async fn submit(
        &self,
        token: &str,
        submission: &VerificationSubmission,
    ) -> Result<StatusPayload, TransportError> {
        self.respond(Endpoint::SubmitVerification, |state| {
            let index = state.account_for(token)?;
            let account = &mut state.accounts[index];
            if account.role != Role::Agent {
                return Err(rejected(403, "Only agents can be verified"));
            }
            if account.submitted {
                return Err(rejected(409, "Verification already submitted"));
            }
            submission
                .validate()
                .map_err(|e| rejected(422, &e.to_string()))?;

            account.status = VerificationStatus::Pending;
            account.submitted = true;
            Ok(StatusPayload {
                status: Some(VerificationStatus::Pending),
            })
        })
        .await
    }

    async fn status(
        &self,
        token: &str,
    ) -> Result<Option<StatusPayload>, TransportError> {
        self.respond(Endpoint::VerificationStatus, |state| {
            let index = state.account_for(token)?;
            let account = &state.accounts[index];
            Ok(account.submitted.then_some(StatusPayload {
                status: Some(account.status),
            }))
        })
        .await
    }
}

fn rejected(status: u16, message: &str) -> TransportError {
    TransportError::Rejected {
        status: Some(status),
        message: message.to_owned(),
    }
}

/// Generates a random 32-character hex session token (128 bits).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
