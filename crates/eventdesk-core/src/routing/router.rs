use tracing::{debug, info, warn};

use super::error::NavigationError;
use super::guard::{Decision, NavigationGuard};
use super::table::{ResolvedRoute, RouteTable};

/// Redirect hops followed before a navigation is abandoned.
pub const MAX_REDIRECTS: usize = 10;

/// A navigation the guard let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// The path the caller asked for.
    pub requested: String,
    /// Where the navigation ended up.
    pub route: ResolvedRoute,
    /// Every redirect target followed on the way, in order.
    pub redirects: Vec<String>,
}

impl Navigation {
    pub fn was_redirected(&self) -> bool {
        !self.redirects.is_empty()
    }
}

/// Applies guard decisions to a route table and tracks where the user is.
#[derive(Debug)]
pub struct Router {
    table: RouteTable,
    current: Option<ResolvedRoute>,
    history: Vec<ResolvedRoute>,
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table,
            current: None,
            history: Vec::new(),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The route currently rendered; `None` before the first navigation.
    pub fn current(&self) -> Option<&ResolvedRoute> {
        self.current.as_ref()
    }

    /// Earlier routes, oldest first.
    pub fn history(&self) -> &[ResolvedRoute] {
        &self.history
    }

    /// Work out where a navigation to `path` would land without committing.
    pub fn preview(
        &self,
        path: &str,
        guard: &dyn NavigationGuard,
    ) -> Result<Navigation, NavigationError> {
        let mut target = path.to_string();
        let mut redirects = Vec::new();

        loop {
            let to = self
                .table
                .resolve(&target)
                .ok_or_else(|| NavigationError::NoMatch(target.clone()))?;

            match guard.evaluate(&to, self.current.as_ref()) {
                Decision::Proceed => {
                    return Ok(Navigation {
                        requested: path.to_string(),
                        route: to,
                        redirects,
                    });
                }
                Decision::Redirect(next) => {
                    if redirects.len() >= MAX_REDIRECTS {
                        warn!(path, hops = redirects.len(), "Redirect loop, giving up");
                        return Err(NavigationError::RedirectLoop {
                            path: path.to_string(),
                            hops: redirects.len(),
                        });
                    }
                    debug!(from = %target, to = %next, "Navigation redirected");
                    redirects.push(next.clone());
                    target = next;
                }
            }
        }
    }

    /// Navigate to `path`, asking `guard` before every hop.
    ///
    /// Asking for the route already shown is `Duplicated`. Being redirected
    /// back to it is not an error; the router just stays put.
    pub fn navigate(
        &mut self,
        path: &str,
        guard: &dyn NavigationGuard,
    ) -> Result<Navigation, NavigationError> {
        let navigation = self.preview(path, guard)?;

        if let Some(ref current) = self.current {
            if current.same_route(&navigation.route) {
                if navigation.was_redirected() {
                    debug!(path, "Redirected back to the current route");
                    return Ok(navigation);
                }
                return Err(NavigationError::Duplicated(current.full_path()));
            }
        }

        info!(
            requested = %navigation.requested,
            landed = %navigation.route.full_path(),
            redirects = navigation.redirects.len(),
            "Navigated"
        );
        if let Some(previous) = self.current.replace(navigation.route.clone()) {
            self.history.push(previous);
        }
        Ok(navigation)
    }

    /// Return to the previous route, guarded like any other navigation.
    pub fn back(&mut self, guard: &dyn NavigationGuard) -> Result<Navigation, NavigationError> {
        let previous = self.history.pop().ok_or(NavigationError::NoHistory)?;

        match self.preview(&previous.full_path(), guard) {
            Ok(navigation) => {
                debug!(landed = %navigation.route.full_path(), "Went back");
                self.current = Some(navigation.route.clone());
                Ok(navigation)
            }
            Err(e) => {
                self.history.push(previous);
                Err(e)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
