use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::SessionStore;

use super::table::ResolvedRoute;

/// Where unauthenticated visitors are sent.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// A guard's verdict on one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "kind", content = "path")]
pub enum Decision {
    /// Render the target unchanged.
    Proceed,
    /// Replace the transition with one to this path.
    Redirect(String),
}

impl Decision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Decision::Proceed)
    }
}

/// Pre-transition hook run before every navigation, including the first.
///
/// Implementations must be side-effect free: the router applies the
/// decision, the guard only computes it.
pub trait NavigationGuard {
    fn evaluate(&self, to: &ResolvedRoute, from: Option<&ResolvedRoute>) -> Decision;
}

/// Keeps `requiresAuth` routes out of reach of anonymous sessions.
#[derive(Debug, Clone, Copy)]
pub struct AuthGuard<'s> {
    session: &'s SessionStore,
    login_path: &'s str,
}

impl<'s> AuthGuard<'s> {
    pub fn new(session: &'s SessionStore) -> Self {
        Self {
            session,
            login_path: DEFAULT_LOGIN_PATH,
        }
    }

    pub fn with_login_path(mut self, login_path: &'s str) -> Self {
        self.login_path = login_path;
        self
    }
}

impl NavigationGuard for AuthGuard<'_> {
    fn evaluate(&self, to: &ResolvedRoute, from: Option<&ResolvedRoute>) -> Decision {
        // Redirect records are never rendered, whatever the session says
        if let Some(target) = to.redirect() {
            debug!(to = %to.path(), redirect = target, "Following route redirect");
            return Decision::Redirect(target.to_string());
        }

        if !to.requires_auth() {
            return Decision::Proceed;
        }

        if self.session.is_authenticated() {
            Decision::Proceed
        } else {
            debug!(
                to = %to.path(),
                from = from.map(|r| r.path()).unwrap_or("<initial>"),
                "Anonymous session, redirecting to login"
            );
            Decision::Redirect(self.login_path.to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
