//! Routing module: route declarations, the navigation guard and the router.
//!
//! A navigation attempt is resolved against the `RouteTable`, handed to a
//! `NavigationGuard`, and committed by the `Router` only once the guard
//! answers `Decision::Proceed`.

pub mod error;
pub mod guard;
pub mod path;
pub mod router;
pub mod table;

pub use error::{NavigationError, RouteError};
pub use guard::{AuthGuard, Decision, NavigationGuard, DEFAULT_LOGIN_PATH};
pub use path::Location;
pub use router::{Navigation, Router, MAX_REDIRECTS};
pub use table::{admin_routes, MatchedRecord, ResolvedRoute, RouteMeta, RouteRecord, RouteTable};
