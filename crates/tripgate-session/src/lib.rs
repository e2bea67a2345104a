//! Client session management for Tripgate.
//!
//! This crate owns everything the app knows about "who is signed in":
//!
//! 1. **Principal**: the canonical identity record ([`Principal`])
//! 2. **Identity merge**: turning loosely-shaped server payloads into a
//!    `Principal`, and patching one in place ([`merge`], [`PrincipalPatch`])
//! 3. **Session store**: the single cached principal, mirrored to durable
//!    storage so it survives reloads ([`SessionStore`], [`Storage`])
//! 4. **Lifecycle**: login, register, refresh, local updates, logout
//!    ([`SessionController`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Verification / Navigation (above)  ← read the principal, gate screens
//!     ↕
//! Session Layer (this crate)  ← owns identity and its persistence
//!     ↕
//! Transport / Protocol (below)  ← service calls, wire types
//! ```

mod coalesce;
mod config;
mod controller;
mod error;
pub mod merge;
mod principal;
mod storage;
mod store;

pub use coalesce::{InFlight, ReentryLatch};
pub use config::SessionConfig;
pub use controller::SessionController;
pub use error::SessionError;
pub use principal::{AuthOutcome, Principal, PrincipalPatch};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageOp};
pub use store::SessionStore;
