//! Role-gated navigation for Tripgate.
//!
//! Every screen in the app is a [`Destination`]. Before one is shown, the
//! [`NavigationGuard`] looks at the signed-in principal and decides
//! whether to allow it, send the user to the login page (remembering where
//! they were going), or redirect them somewhere they belong.
//!
//! ```text
//!                 ┌─ public ───────────► Allow
//!   Destination ──┼─ login/register ───► Allow, or role home if signed in
//!                 └─ role-restricted ──► Allow / RedirectToLogin / Redirect
//! ```
//!
//! The agent area adds one more gate on top of the role check: the
//! verification state (see `tripgate-verification`).

mod destination;
mod error;
mod guard;
mod liveness;

pub use destination::{Access, Destination};
pub use error::NavigationError;
pub use guard::{Decision, NavItem, NavigationGuard, post_auth_redirect, primary_navigation};
pub use liveness::{Liveness, route_after_refresh};
