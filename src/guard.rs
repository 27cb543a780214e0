/// Route access decisions
///
/// Pure functions over the session status; rendering the outcome is left to
/// the caller.

use crate::models::Role;
use crate::token_store::{SessionStatus, SessionStore};

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin,
    /// Signed in, but the role is not allowed here
    Forbidden,
    /// Signed-in users skip public-only pages
    RedirectToDashboard,
}

impl RouteDecision {
    /// Target path of a redirecting decision.
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            RouteDecision::Allow => None,
            RouteDecision::RedirectToLogin => Some(LOGIN_PATH),
            RouteDecision::Forbidden => Some(UNAUTHORIZED_PATH),
            RouteDecision::RedirectToDashboard => Some(DASHBOARD_PATH),
        }
    }
}

/// Pages that need a session. An empty `allowed_roles` admits every role.
pub fn protected(status: &SessionStatus, allowed_roles: &[Role]) -> RouteDecision {
    match status {
        SessionStatus::SignedOut => RouteDecision::RedirectToLogin,
        SessionStatus::SignedIn { .. } if allowed_roles.is_empty() => RouteDecision::Allow,
        SessionStatus::SignedIn { role: Some(role), .. } if allowed_roles.contains(role) => {
            RouteDecision::Allow
        }
        SessionStatus::SignedIn { .. } => RouteDecision::Forbidden,
    }
}

/// Pages such as login that only make sense without a session.
pub fn public_only(status: &SessionStatus) -> RouteDecision {
    if status.is_signed_in() {
        RouteDecision::RedirectToDashboard
    } else {
        RouteDecision::Allow
    }
}

impl SessionStore {
    pub fn guard(&self, allowed_roles: &[Role]) -> RouteDecision {
        protected(&self.status(), allowed_roles)
    }
}
