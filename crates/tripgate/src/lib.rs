//! # Tripgate
//!
//! Client-side session and authorization layer for the Tripgate travel
//! marketplace.
//!
//! Tripgate keeps track of who is signed in, keeps that identity in sync
//! with the backend without letting a slow response undo a newer local
//! change, and decides which screens a customer, agent or admin may see.
//! An app builds one [`TripgateClient`] at startup and routes every
//! session question through it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tripgate::prelude::*;
//!
//! # async fn run() -> Result<(), TripgateError> {
//! let client = TripgateClient::builder()
//!     .api_base("https://api.tripgate.io/v1")
//!     .storage(FileStorage::new("session.json"))
//!     .build()?;
//! client.start();
//!
//! let outcome = client.session().login("ana@stays.io", "secret").await;
//! if let Some(principal) = outcome.principal() {
//!     let home = post_auth_redirect(principal, None);
//!     let decision = client.route(&home, &Liveness::new()).await;
//!     println!("{home} -> {decision:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! ```text
//! tripgate (this crate)      client builder, unified error, tracing setup
//!   ├── navigation           destinations, guards, post-login routing
//!   ├── verification         agent verification screens and submission
//!   ├── session              principal, store, refresh coalescing, lifecycle
//!   ├── transport            AuthApi / VerificationApi, HTTP + stub backends
//!   └── protocol             wire types, codec
//! ```

mod client;
mod config;
mod error;

pub use client::{TripgateClient, TripgateClientBuilder};
pub use config::ClientConfig;
pub use error::TripgateError;

pub use tripgate_navigation as navigation;
pub use tripgate_protocol as protocol;
pub use tripgate_session as session;
pub use tripgate_transport as transport;
pub use tripgate_verification as verification;

/// Installs a `tracing` subscriber that writes to stderr.
///
/// The filter comes from `RUST_LOG` and defaults to
/// `warn,tripgate=info`. Calling this more than once, or after the app
/// installed its own subscriber, does nothing.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tripgate=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything an app usually needs, in one import.
pub mod prelude {
    pub use crate::{ClientConfig, TripgateClient, TripgateClientBuilder, TripgateError};

    pub use tripgate_navigation::{
        Access, Decision, Destination, Liveness, NavItem, NavigationGuard,
        post_auth_redirect, primary_navigation,
    };
    pub use tripgate_protocol::{
        AgentType, RegisterRequest, Role, Specialization, VerificationStatus,
    };
    pub use tripgate_session::{
        AuthOutcome, FileStorage, MemoryStorage, Principal, PrincipalPatch,
        SessionConfig, SessionController, Storage,
    };
    pub use tripgate_transport::{AuthApi, HttpApi, VerificationApi};
    pub use tripgate_verification::{
        VerificationFlow, VerificationForm, VerificationScreen, can_list_products,
        dashboard_locked, screen_for,
    };
}
