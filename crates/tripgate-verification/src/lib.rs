//! Agent verification for Tripgate.
//!
//! Agents can't list products until an admin has reviewed their identity
//! and payout details. This crate drives that workflow on the client:
//!
//! ```text
//!   UNVERIFIED ──submit()──► PENDING ──(admin approves)──► VERIFIED
//!     [Form]                [UnderReview]                 [dashboard]
//! ```
//!
//! - [`screen_for`] decides what the verification page shows
//! - [`VerificationFlow`] submits the form and syncs the status
//! - [`can_list_products`] / [`dashboard_locked`] gate the agent dashboard
//!
//! Status only moves forward on the client; see
//! [`VerificationStatus::advance_to`](tripgate_protocol::VerificationStatus::advance_to).

mod error;
mod flow;
mod screen;

pub use error::VerificationError;
pub use flow::{VerificationFlow, VerificationForm};
pub use screen::{VerificationScreen, can_list_products, dashboard_locked, screen_for};
