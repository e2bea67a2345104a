//! Access decisions and the role-specific navigation menu.

use tripgate_protocol::Role;
use tripgate_session::Principal;
use tripgate_verification::can_list_products;

use crate::{Access, Destination};

/// What to do with a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Show the destination.
    Allow,

    /// Nobody is signed in. Show the login page, then continue to
    /// `resume`.
    RedirectToLogin { resume: Destination },

    /// Signed in, but this destination isn't for them (right now).
    Redirect(Destination),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether the current principal may open a destination.
///
/// Rules, checked in order:
///
/// | Situation                                       | Decision                        |
/// |-------------------------------------------------|---------------------------------|
/// | public destination                              | `Allow`                         |
/// | login/register while signed in                  | `Redirect(home for role)`       |
/// | role-restricted, not signed in                  | `RedirectToLogin { resume }`    |
/// | role-restricted, different role                 | `Redirect(home for role)`       |
/// | agent verification page, already verified       | `Redirect(AgentDashboard)`      |
/// | new listing, agent not verified yet             | `Redirect(AgentVerification)`   |
/// | anything else                                   | `Allow`                         |
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationGuard;

impl NavigationGuard {
    pub fn decide(
        principal: Option<&Principal>,
        destination: &Destination,
    ) -> Decision {
        let required = match destination.access() {
            Access::Public => return Decision::Allow,
            Access::Guest => {
                return match principal {
                    Some(p) => Decision::Redirect(Destination::home_for(p.role)),
                    None => Decision::Allow,
                };
            }
            Access::Role(role) => role,
        };

        let Some(principal) = principal else {
            return Decision::RedirectToLogin {
                resume: destination.clone(),
            };
        };
        if principal.role != required {
            tracing::debug!(
                principal_id = %principal.id,
                role = %principal.role,
                %destination,
                "destination belongs to another role"
            );
            return Decision::Redirect(Destination::home_for(principal.role));
        }

        match destination {
            Destination::AgentVerification if principal.is_verified_agent() => {
                Decision::Redirect(Destination::AgentDashboard)
            }
            Destination::AgentNewListing if !can_list_products(principal) => {
                Decision::Redirect(Destination::AgentVerification)
            }
            _ => Decision::Allow,
        }
    }
}

/// One entry in the main menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub destination: Destination,
}

impl NavItem {
    fn new(label: &'static str, destination: Destination) -> Self {
        Self { label, destination }
    }
}

/// The main menu for `principal`.
///
/// Agents see the verification entry only until they are verified.
pub fn primary_navigation(principal: Option<&Principal>) -> Vec<NavItem> {
    let Some(principal) = principal else {
        return vec![
            NavItem::new("Home", Destination::Home),
            NavItem::new("Explore", Destination::Explore),
            NavItem::new("Sign in", Destination::Login),
            NavItem::new("Sign up", Destination::Register),
        ];
    };

    match principal.role {
        Role::Customer => vec![
            NavItem::new("Home", Destination::Home),
            NavItem::new("Explore", Destination::Explore),
            NavItem::new("My bookings", Destination::CustomerBookings),
            NavItem::new("Profile", Destination::CustomerProfile),
        ],
        Role::Agent => {
            let mut items = vec![
                NavItem::new("Dashboard", Destination::AgentDashboard),
                NavItem::new("My listings", Destination::AgentListings),
            ];
            if !principal.is_verified_agent() {
                items.push(NavItem::new("Verification", Destination::AgentVerification));
            }
            items
        }
        Role::Admin => vec![
            NavItem::new("Dashboard", Destination::AdminDashboard),
            NavItem::new("Users", Destination::AdminUsers),
            NavItem::new("Verifications", Destination::AdminVerificationQueue),
        ],
    }
}

/// Where to go right after a successful login or registration.
///
/// Admins and agents always land on their dashboard. Everyone else goes
/// back to what they were trying to open, if they may open it, or home.
pub fn post_auth_redirect(
    principal: &Principal,
    requested: Option<&Destination>,
) -> Destination {
    match principal.role {
        Role::Admin => Destination::AdminDashboard,
        Role::Agent => Destination::AgentDashboard,
        Role::Customer => requested
            .filter(|d| d.access() != Access::Guest)
            .filter(|d| NavigationGuard::decide(Some(principal), d).is_allowed())
            .cloned()
            .unwrap_or(Destination::Home),
    }
}
