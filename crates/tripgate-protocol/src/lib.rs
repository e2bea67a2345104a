//! Wire protocol for Tripgate.
//!
//! This crate defines the "language" the marketplace backend and the
//! client session layer speak:
//!
//! - **Types** ([`Role`], [`VerificationStatus`], [`LoginRequest`],
//!   [`ApiEnvelope`], etc.): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how records are turned
//!   into text for durable storage and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! # Architecture
//!
//! The protocol layer sits below transport (service calls) and session
//! (identity). It doesn't know about HTTP or storage: it only knows the
//! shape of the data.
//!
//! ```text
//! Transport (requests) → Protocol (payloads) → Session (principal)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    AgentType, ApiEnvelope, IdentityPayload, LoginRequest, PrincipalId,
    RegisterRequest, Role, Specialization, StatusPayload,
    VerificationStatus, VerificationSubmission,
};
