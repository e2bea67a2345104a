//! Routing after a refresh, for views that may be gone by the time it
//! lands.
//!
//! A view refreshes the session when it opens and then decides whether
//! to stay or redirect. If the user has already navigated away when the
//! response arrives, the refreshed principal should still be stored, but
//! redirecting would yank them away from wherever they went instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tripgate_session::{SessionController, SessionError, Storage};
use tripgate_transport::AuthApi;

use crate::{Decision, Destination, NavigationGuard};

/// Whether a view is still on screen.
///
/// Clones share the flag. The view keeps one and calls
/// [`end`](Self::end) when it goes away; async work holds another and
/// checks [`is_alive`](Self::is_alive) before acting.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks the view as gone. Can't be undone.
    pub fn end(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Refreshes the session for a view on `destination`, then decides where
/// the view should go.
///
/// The refresh is keyed on the destination's path, so a view that opens
/// twice for the same navigation triggers one call. The refresh always
/// runs to completion and its result is stored. The decision is only
/// returned while `liveness` says the view is still there; otherwise this
/// returns `None`.
///
/// A refused token sends the user to login, with `destination` kept so
/// they come back to it after signing in again.
pub async fn route_after_refresh<A, S>(
    session: &SessionController<A, S>,
    destination: &Destination,
    liveness: &Liveness,
) -> Option<Decision>
where
    A: AuthApi,
    S: Storage,
{
    let refreshed = session.refresh_for(destination.path()).await;

    if !liveness.is_alive() {
        tracing::debug!(%destination, "view closed during refresh; not routing");
        return None;
    }

    let decision = match refreshed {
        Some(Ok(principal)) => NavigationGuard::decide(Some(&principal), destination),
        Some(Err(e)) if e.is_unauthorized() || e == SessionError::NotAuthenticated => {
            NavigationGuard::decide(None, destination)
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "refresh failed; routing on cached session");
            NavigationGuard::decide(session.current().as_ref(), destination)
        }
        None => NavigationGuard::decide(session.current().as_ref(), destination),
    };
    Some(decision)
}
