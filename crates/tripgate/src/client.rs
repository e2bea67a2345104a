//! `TripgateClient` builder: the composition root.
//!
//! This ties the layers together for an app: one backend client shared by
//! the session controller and the verification flow, one durable storage,
//! one configuration.
//!
//! ```text
//! TripgateClientBuilder ──build()──► TripgateClient
//!                                      ├── session()       SessionController
//!                                      ├── verification()  VerificationFlow
//!                                      └── guard()/route() NavigationGuard
//! ```

use std::sync::Arc;

use tripgate_navigation::{
    Decision, Destination, Liveness, NavigationGuard, route_after_refresh,
};
use tripgate_session::{
    MemoryStorage, Principal, SessionConfig, SessionController, Storage,
};
use tripgate_transport::{AuthApi, HttpApi, VerificationApi};
use tripgate_verification::VerificationFlow;

use crate::config::validate_session;
use crate::{ClientConfig, TripgateError};

/// Builder for a [`TripgateClient`].
///
/// # Example
///
/// ```rust,no_run
/// use tripgate::prelude::*;
///
/// let client = TripgateClient::builder()
///     .api_base("https://api.tripgate.io/v1")
///     .storage(FileStorage::new("session.json"))
///     .build()?;
/// client.start();
/// # Ok::<(), TripgateError>(())
/// ```
pub struct TripgateClientBuilder<S = MemoryStorage> {
    config: ClientConfig,
    storage: S,
}

impl TripgateClientBuilder {
    /// Creates a builder with default settings and in-memory storage.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            storage: MemoryStorage::new(),
        }
    }
}

impl Default for TripgateClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Storage> TripgateClientBuilder<S> {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the base URL of the marketplace API.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets where the session is persisted.
    pub fn storage<T: Storage>(self, storage: T) -> TripgateClientBuilder<T> {
        TripgateClientBuilder {
            config: self.config,
            storage,
        }
    }

    /// Builds a client that talks to the configured API over HTTP.
    ///
    /// # Errors
    /// Returns [`TripgateError::Config`] if the configuration is invalid.
    pub fn build(self) -> Result<TripgateClient<HttpApi, S>, TripgateError> {
        self.config.validate()?;
        let api = HttpApi::new(self.config.api_base.trim());
        Ok(self.assemble(api))
    }

    /// Builds a client on top of any backend implementation, such as
    /// [`StubApi`](tripgate_transport::StubApi) in tests and demos.
    ///
    /// # Errors
    /// Returns [`TripgateError::Config`] if the session configuration is
    /// invalid. `api_base` isn't used.
    pub fn build_with<A>(self, api: A) -> Result<TripgateClient<A, S>, TripgateError>
    where
        A: AuthApi + VerificationApi,
    {
        validate_session(&self.config.session)?;
        Ok(self.assemble(api))
    }

    fn assemble<A>(self, api: A) -> TripgateClient<A, S>
    where
        A: AuthApi + VerificationApi,
    {
        let api = Arc::new(api);
        tracing::debug!(api_base = %self.config.api_base, "client assembled");
        TripgateClient {
            session: SessionController::new(
                Arc::clone(&api),
                self.storage,
                self.config.session.clone(),
            ),
            verification: VerificationFlow::new(Arc::clone(&api)),
            config: self.config,
        }
    }
}

/// An assembled Tripgate client.
///
/// Cheap to clone; clones share the same session.
pub struct TripgateClient<A, S> {
    session: SessionController<Arc<A>, S>,
    verification: VerificationFlow<Arc<A>>,
    config: ClientConfig,
}

impl<A, S> Clone for TripgateClient<A, S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            verification: self.verification.clone(),
            config: self.config.clone(),
        }
    }
}

impl TripgateClient<HttpApi, MemoryStorage> {
    /// Creates a new builder.
    pub fn builder() -> TripgateClientBuilder {
        TripgateClientBuilder::new()
    }
}

impl<A, S> TripgateClient<A, S>
where
    A: AuthApi + VerificationApi,
    S: Storage,
{
    /// Restores the session saved by a previous run. Call once at startup.
    pub fn start(&self) -> Option<Principal> {
        self.session.initialize()
    }

    pub fn session(&self) -> &SessionController<Arc<A>, S> {
        &self.session
    }

    pub fn verification(&self) -> &VerificationFlow<Arc<A>> {
        &self.verification
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Decides a navigation with the cached session, without a network
    /// call.
    pub fn guard(&self, destination: &Destination) -> Decision {
        NavigationGuard::decide(self.session.current().as_ref(), destination)
    }

    /// Decides a navigation given as a path.
    ///
    /// # Errors
    /// Returns [`TripgateError::Navigation`] for an unknown path.
    pub fn guard_path(&self, path: &str) -> Result<Decision, TripgateError> {
        Ok(self.guard(&path.parse()?))
    }

    /// Refreshes the session for a view on `destination` and decides
    /// where it should go. See [`route_after_refresh`].
    pub async fn route(
        &self,
        destination: &Destination,
        liveness: &Liveness,
    ) -> Option<Decision> {
        route_after_refresh(&self.session, destination, liveness).await
    }
}
