//! The screens of the app and who may open them.

use std::fmt;
use std::str::FromStr;

use tripgate_protocol::Role;

use crate::NavigationError;

/// A screen the app can navigate to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    // Public
    Home,
    Explore,
    ListingDetail(String),

    // Sign-in pages, only for anonymous visitors
    Login,
    Register,

    // Customer area
    CustomerBookings,
    CustomerProfile,

    // Agent area
    AgentDashboard,
    AgentListings,
    AgentNewListing,
    AgentVerification,

    // Admin area
    AdminDashboard,
    AdminUsers,
    AdminVerificationQueue,
}

/// Who may open a destination, before any finer-grained check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, signed in or not.
    Public,

    /// Only visitors who are not signed in.
    Guest,

    /// Only signed-in principals with this role.
    Role(Role),
}

impl Destination {
    /// The URL path for this destination.
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::Explore => "/explore".to_owned(),
            Self::ListingDetail(id) => format!("/listings/{id}"),
            Self::Login => "/login".to_owned(),
            Self::Register => "/register".to_owned(),
            Self::CustomerBookings => "/bookings".to_owned(),
            Self::CustomerProfile => "/profile".to_owned(),
            Self::AgentDashboard => "/agent/dashboard".to_owned(),
            Self::AgentListings => "/agent/listings".to_owned(),
            Self::AgentNewListing => "/agent/listings/new".to_owned(),
            Self::AgentVerification => "/agent/verification".to_owned(),
            Self::AdminDashboard => "/admin".to_owned(),
            Self::AdminUsers => "/admin/users".to_owned(),
            Self::AdminVerificationQueue => "/admin/verifications".to_owned(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Self::Home | Self::Explore | Self::ListingDetail(_) => Access::Public,
            Self::Login | Self::Register => Access::Guest,
            Self::CustomerBookings | Self::CustomerProfile => {
                Access::Role(Role::Customer)
            }
            Self::AgentDashboard
            | Self::AgentListings
            | Self::AgentNewListing
            | Self::AgentVerification => Access::Role(Role::Agent),
            Self::AdminDashboard
            | Self::AdminUsers
            | Self::AdminVerificationQueue => Access::Role(Role::Admin),
        }
    }

    /// Where a principal with `role` lands by default.
    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Customer => Self::Home,
            Role::Agent => Self::AgentDashboard,
            Role::Admin => Self::AdminDashboard,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.path())
    }
}

impl FromStr for Destination {
    type Err = NavigationError;

    /// Parses a path. A query string, a fragment and a trailing slash are
    /// ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        let destination = match trimmed {
            "" => Self::Home,
            "/explore" => Self::Explore,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/bookings" => Self::CustomerBookings,
            "/profile" => Self::CustomerProfile,
            "/agent" | "/agent/dashboard" => Self::AgentDashboard,
            "/agent/listings" => Self::AgentListings,
            "/agent/listings/new" => Self::AgentNewListing,
            "/agent/verification" => Self::AgentVerification,
            "/admin" => Self::AdminDashboard,
            "/admin/users" => Self::AdminUsers,
            "/admin/verifications" => Self::AdminVerificationQueue,
            other => match other.strip_prefix("/listings/") {
                Some(id) if !id.is_empty() && !id.contains('/') => {
                    Self::ListingDetail(id.to_owned())
                }
                _ => return Err(NavigationError::UnknownPath(s.to_owned())),
            },
        };
        Ok(destination)
    }
}
