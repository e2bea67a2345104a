//! The session lifecycle controller.
//!
//! One controller exists per running app. It is created at the
//! composition root and handed (cloned) to whatever needs the session:
//! the verification flow, the route guard, the header.
//!
//! ```text
//!                 login / register
//!   [SignedOut] ───────────────────► [SignedIn]
//!        ▲                             │   │ ▲
//!        │   logout / 401 on refresh   │   │ │ refresh, update_local
//!        └─────────────────────────────┘   └─┘
//! ```
//!
//! # Ordering
//!
//! Service calls suspend; everything else is synchronous and happens under
//! one lock, so merges are applied in the order their calls complete. A
//! refresh that was issued before a local update but finishes after it
//! would otherwise stomp on that update. To prevent that, every local
//! patch is stamped with a revision and kept in an overlay. When a refresh
//! completes, the server record replaces the principal and the patches
//! stamped after the refresh was issued are applied again on top.
//!
//! ```text
//! rev 4  refresh() issued ─────────────────────────────┐
//! rev 5  update_local(VERIFIED)   cache: VERIFIED      │
//!        refresh completes (server: PENDING)  ◄────────┘
//!        → PENDING record + overlay[rev 5]    cache: VERIFIED
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tripgate_protocol::{LoginRequest, RegisterRequest, Role};
use tripgate_transport::AuthApi;

use crate::merge::principal_from_payload;
use crate::{
    AuthOutcome, InFlight, Principal, PrincipalPatch, ReentryLatch,
    SessionConfig, SessionError, SessionStore, Storage,
};

type RefreshResult = Result<Principal, SessionError>;

/// A cloneable handle to the app's session.
///
/// All clones share one cache, one storage and one set of in-flight
/// calls.
pub struct SessionController<A, S> {
    inner: Arc<Inner<A, S>>,
}

impl<A, S> Clone for SessionController<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<A, S> {
    api: A,
    config: SessionConfig,
    state: Mutex<State<S>>,
    refreshes: InFlight<String, RefreshResult>,
    latch: ReentryLatch<String>,
    ready: watch::Sender<bool>,
    changes: watch::Sender<Option<Principal>>,
}

struct State<S> {
    store: SessionStore<S>,
    initialized: bool,

    /// Bumped by every local patch.
    revision: u64,

    /// Local patches a running refresh hasn't seen yet. Pruned whenever
    /// no refresh is in flight.
    overlay: Vec<(u64, PrincipalPatch)>,
}

fn current_token<S>(state: &State<S>) -> Option<&str>
where
    S: Storage,
{
    state.store.get().map(|p| p.session_token.as_str())
}

impl<A: AuthApi, S: Storage> SessionController<A, S> {
    /// Creates a controller with an empty cache.
    ///
    /// Nothing is read from `storage` until [`initialize`](Self::initialize).
    pub fn new(api: A, storage: S, config: SessionConfig) -> Self {
        let store = SessionStore::new(storage, &config);
        Self {
            inner: Arc::new(Inner {
                api,
                config,
                state: Mutex::new(State {
                    store,
                    initialized: false,
                    revision: 0,
                    overlay: Vec::new(),
                }),
                refreshes: InFlight::new(),
                latch: ReentryLatch::new(),
                ready: watch::Sender::new(false),
                changes: watch::Sender::new(None),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Startup
    // -----------------------------------------------------------------------

    /// Hydrates the session from durable storage.
    ///
    /// Runs once; later calls just return the current principal. Never
    /// fails: corrupt storage is cleaned up and treated as signed out.
    pub fn initialize(&self) -> Option<Principal> {
        let mut state = self.inner.state.lock();
        if !state.initialized {
            state.initialized = true;
            match state.store.load() {
                Some(p) => {
                    tracing::info!(principal_id = %p.id, role = %p.role, "session restored");
                }
                None => tracing::debug!("no stored session"),
            }
            self.inner.publish(&state);
            self.inner.ready.send_replace(true);
        }
        state.store.get().cloned()
    }

    /// Resolves once [`initialize`](Self::initialize) has run.
    ///
    /// Route guards await this before deciding, so a reload doesn't bounce
    /// a signed-in user to the login page.
    pub async fn ready(&self) {
        let mut ready = self.inner.ready.subscribe();
        // The sender lives as long as `self`, so this can't fail.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    /// Signs in with email and password.
    ///
    /// Never returns an error: network failures and rejections both come
    /// back as [`AuthOutcome::Failure`] with a message for the user, and
    /// leave the session untouched.
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let request = LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let signed_in = match self.inner.api.login(&request).await {
            Ok(payload) => principal_from_payload(&payload, None)
                .and_then(|p| self.inner.establish(p)),
            Err(e) => Err(e.into()),
        };

        match signed_in {
            Ok(principal) => {
                tracing::info!(
                    principal_id = %principal.id,
                    role = %principal.role,
                    "signed in"
                );
                AuthOutcome::Success(principal)
            }
            Err(e) => {
                tracing::info!(error = %e, "login failed");
                AuthOutcome::failure(e.user_message())
            }
        }
    }

    /// Creates an account and signs in as it.
    ///
    /// Agents must pick a specialization; that is checked before anything
    /// is sent. The registration response is thin, so a successful
    /// registration is followed by a [`refresh`](Self::refresh). If only
    /// that refresh fails (and not because the new token was refused), the
    /// principal built from the registration response is kept.
    pub async fn register(&self, request: RegisterRequest) -> AuthOutcome {
        if request.role == Role::Agent && request.specialization.is_none() {
            return AuthOutcome::failure("Please choose a specialization.");
        }

        let registered = match self.inner.api.register(&request).await {
            Ok(payload) => principal_from_payload(&payload, None)
                .map(|mut p| {
                    if p.is_agent() && p.specialization.is_none() {
                        p.specialization = request.specialization;
                    }
                    p
                })
                .and_then(|p| self.inner.establish(p)),
            Err(e) => Err(e.into()),
        };
        let registered = match registered {
            Ok(principal) => principal,
            Err(e) => {
                tracing::info!(error = %e, "registration failed");
                return AuthOutcome::failure(e.user_message());
            }
        };
        tracing::info!(
            principal_id = %registered.id,
            role = %registered.role,
            "account registered"
        );

        match self.refresh().await {
            Ok(fresh) => AuthOutcome::Success(fresh),
            Err(e) if e.is_unauthorized() => {
                AuthOutcome::failure(e.user_message())
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "refresh after registration failed; keeping registration response"
                );
                AuthOutcome::Success(self.current().unwrap_or(registered))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Replaces the cached principal with the server's current record.
    ///
    /// Concurrent calls share one request. Local patches made while the
    /// request was out are applied again on top of the response.
    ///
    /// # Errors
    /// - [`SessionError::NotAuthenticated`] without a session (no call made)
    /// - [`SessionError::Transport`] if the call failed; when the token was
    ///   refused the session is cleared first
    /// - [`SessionError::Superseded`] if the session changed meanwhile
    pub async fn refresh(&self) -> Result<Principal, SessionError> {
        let (token, issued_at) = {
            let state = self.inner.state.lock();
            let token = current_token(&state)
                .ok_or(SessionError::NotAuthenticated)?
                .to_owned();
            (token, state.revision)
        };

        // The shared call may outlive this caller, so it holds only a weak
        // handle to the controller.
        let inner = Arc::downgrade(&self.inner);
        self.inner
            .refreshes
            .run(token.clone(), move || fetch(inner, token, issued_at))
            .await
    }

    /// Refreshes unless the last call used the same `key`.
    ///
    /// Views trigger a refresh when they mount, and a mount can fire more
    /// than once per navigation. Pass something that identifies the
    /// navigation (the path, a route id) as `key`; repeats return `None`
    /// without a call.
    pub async fn refresh_for(
        &self,
        key: impl Into<String>,
    ) -> Option<Result<Principal, SessionError>> {
        let key = key.into();
        if !self.inner.latch.enter(key.as_str()) {
            tracing::debug!(%key, "refresh already triggered for this navigation");
            return None;
        }
        Some(self.refresh().await)
    }

    // -----------------------------------------------------------------------
    // Local updates
    // -----------------------------------------------------------------------

    /// Merges `patch` into the cached principal without calling the server.
    ///
    /// Returns the updated principal, or `None` (and changes nothing) when
    /// nobody is signed in. An empty patch returns the principal as is.
    pub fn update_local(&self, patch: PrincipalPatch) -> Option<Principal> {
        let mut state = self.inner.state.lock();
        let current = state.store.get()?.clone();
        if patch.is_empty() {
            return Some(current);
        }

        let next = patch.apply_to(&current);
        if next != current {
            if let Err(e) = state.store.set(Some(next.clone())) {
                tracing::warn!(error = %e, "could not persist local update");
                return Some(current);
            }
            self.inner.publish(&state);
        }

        if self.inner.refreshes.is_empty() {
            state.overlay.clear();
        }
        state.revision += 1;
        let revision = state.revision;
        state.overlay.push((revision, patch));

        tracing::debug!(
            principal_id = %next.id,
            revision,
            status = %next.verification_status,
            "local update applied"
        );
        Some(next)
    }

    // -----------------------------------------------------------------------
    // Sign out
    // -----------------------------------------------------------------------

    /// Signs out.
    ///
    /// The local session is cleared first and unconditionally. The server
    /// is then told, best-effort: failures and timeouts are logged and
    /// otherwise ignored.
    pub async fn logout(&self) {
        let token = {
            let mut state = self.inner.state.lock();
            let token = current_token(&state).map(str::to_owned);
            self.inner.clear(&mut state);
            token
        };
        self.inner.latch.reset();

        let Some(token) = token else {
            return;
        };
        tracing::info!("signed out");

        let notify = self.inner.api.logout(&token);
        match tokio::time::timeout(self.inner.config.logout_timeout, notify).await {
            Ok(Ok(())) => tracing::debug!("server session closed"),
            Ok(Err(e)) => tracing::warn!(error = %e, "server logout failed"),
            Err(_) => tracing::warn!(
                timeout = ?self.inner.config.logout_timeout,
                "server logout timed out"
            ),
        }
    }

    /// Ends the session because `token` was refused by an authenticated
    /// call, unless the session has moved on to another token since.
    ///
    /// Returns `true` if a session was cleared.
    pub fn expire(&self, token: &str) -> bool {
        self.inner.expire(token)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The signed-in principal, if any.
    pub fn current(&self) -> Option<Principal> {
        self.inner.state.lock().store.get().cloned()
    }

    /// The session token to attach to authenticated calls.
    pub fn token(&self) -> Option<String> {
        current_token(&self.inner.state.lock()).map(str::to_owned)
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.lock().store.get().is_some()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.inner
            .state
            .lock()
            .store
            .get()
            .is_some_and(|p| p.has_role(role))
    }

    /// Watches the signed-in principal. The receiver sees every change
    /// (sign in, refresh, local update, sign out).
    pub fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.inner.changes.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }
}

/// The shared body of a refresh.
async fn fetch<A, S>(
    inner: Weak<Inner<A, S>>,
    token: String,
    issued_at: u64,
) -> RefreshResult
where
    A: AuthApi,
    S: Storage,
{
    let Some(inner) = inner.upgrade() else {
        return Err(SessionError::Superseded);
    };
    match inner.api.me(&token).await {
        Ok(payload) => {
            let fresh = principal_from_payload(&payload, Some(&token))?;
            inner.apply_refresh(&token, issued_at, fresh)
        }
        Err(e) => {
            if e.is_unauthorized() {
                inner.expire(&token);
            }
            Err(e.into())
        }
    }
}

impl<A: AuthApi, S: Storage> Inner<A, S> {
    fn publish(&self, state: &State<S>) {
        self.changes.send_replace(state.store.get().cloned());
    }

    /// Installs a principal from a login or registration response.
    fn establish(&self, principal: Principal) -> RefreshResult {
        let mut state = self.state.lock();
        state.store.set(Some(principal.clone()))?;
        state.overlay.clear();
        self.publish(&state);
        Ok(principal)
    }

    fn apply_refresh(
        &self,
        token: &str,
        issued_at: u64,
        fresh: Principal,
    ) -> RefreshResult {
        let mut state = self.state.lock();
        if current_token(&state) != Some(token) {
            tracing::debug!("session changed during refresh; discarding response");
            return Err(SessionError::Superseded);
        }

        state.overlay.retain(|(revision, _)| *revision > issued_at);
        let merged = state
            .overlay
            .iter()
            .fold(fresh, |principal, (_, patch)| patch.apply_to(&principal));
        state.store.set(Some(merged.clone()))?;
        self.publish(&state);

        tracing::debug!(
            principal_id = %merged.id,
            status = %merged.verification_status,
            reapplied = state.overlay.len(),
            "session refreshed"
        );
        Ok(merged)
    }

    fn clear(&self, state: &mut State<S>) {
        if let Err(e) = state.store.set(None) {
            tracing::warn!(error = %e, "could not clear stored session");
        }
        state.overlay.clear();
        self.publish(state);
    }

    fn expire(&self, token: &str) -> bool {
        let mut state = self.state.lock();
        if current_token(&state) != Some(token) {
            return false;
        }
        self.clear(&mut state);
        drop(state);
        // Same local teardown as `logout`. The server already refused the
        // token, so there is nothing to tell it.
        self.latch.reset();
        tracing::info!("session token refused; signed out");
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tripgate_protocol::{Specialization, VerificationStatus};
    use tripgate_transport::{Endpoint, StubApi};

    use super::*;
    use crate::MemoryStorage;

    fn controller() -> (Arc<StubApi>, SessionController<Arc<StubApi>, MemoryStorage>) {
        let api = Arc::new(StubApi::new());
        api.add_account("Ana", "a@b.com", "pw", Role::Agent, Some(Specialization::Tour));
        let session = SessionController::new(
            Arc::clone(&api),
            MemoryStorage::new(),
            SessionConfig::default(),
        );
        (api, session)
    }

    #[tokio::test]
    async fn test_initialize_twice_is_noop() {
        let (_, session) = controller();
        assert!(!session.is_ready());
        assert_eq!(session.initialize(), None);
        assert!(session.is_ready());

        session.login("a@b.com", "pw").await;
        // A second initialize must not reload over the live session.
        assert!(session.initialize().is_some());
    }

    #[tokio::test]
    async fn test_refresh_signed_out_makes_no_call() {
        let (api, session) = controller();
        assert_eq!(session.refresh().await, Err(SessionError::NotAuthenticated));
        assert_eq!(api.calls(Endpoint::Me), 0);
    }

    #[tokio::test]
    async fn test_update_local_bumps_revision_and_records_overlay() {
        let (_, session) = controller();
        session.login("a@b.com", "pw").await;

        session.update_local(PrincipalPatch::verification(VerificationStatus::Pending));

        let state = session.inner.state.lock();
        assert_eq!(state.revision, 1);
        // Nobody is refreshing, so only the latest patch is kept.
        assert_eq!(state.overlay.len(), 1);
    }

    #[tokio::test]
    async fn test_overlay_pruned_when_no_refresh_waits() {
        let (_, session) = controller();
        session.login("a@b.com", "pw").await;

        for _ in 0..3 {
            session.update_local(PrincipalPatch {
                name: Some("Ana B".into()),
                ..PrincipalPatch::default()
            });
        }

        assert_eq!(session.inner.state.lock().overlay.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_sees_sign_in_and_out() {
        let (_, session) = controller();
        let mut changes = session.subscribe();

        session.login("a@b.com", "pw").await;
        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_some());

        session.logout().await;
        assert!(changes.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_expire_ignores_stale_token() {
        let (_, session) = controller();
        session.login("a@b.com", "pw").await;

        assert!(!session.expire("some-older-token"));
        assert!(session.is_authenticated());

        let token = session.token().unwrap();
        assert!(session.expire(&token));
        assert!(!session.is_authenticated());
    }
}
