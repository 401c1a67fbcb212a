//! eventdesk-core - session and navigation core for the eventdesk admin console.
//!
//! This crate provides the pieces every eventdesk front end shares:
//! - `auth`: the bearer-token session store and its persistent slot backends
//! - `routing`: the route table, the navigation guard and the router
//! - `config`: application configuration loading

pub mod auth;
pub mod config;
pub mod routing;

pub use auth::{SessionStore, StorageError, TokenStorage};
pub use config::{Config, StorageBackend};
pub use routing::{AuthGuard, Decision, NavigationGuard, RouteTable, Router};
