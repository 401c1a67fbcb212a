use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Route path must not be empty")]
    EmptyPath,

    #[error("Top-level route path must start with '/': {0}")]
    NotAbsolute(String),

    #[error("Wildcard '*' must be the last segment: {0}")]
    WildcardNotLast(String),

    #[error("Route param is missing a name: {0}")]
    EmptyParamName(String),

    #[error("Route has both a view and a redirect: {0}")]
    ViewAndRedirect(String),

    #[error("Route has neither a view nor a redirect: {0}")]
    NoTarget(String),

    #[error("Route declared twice: {0}")]
    Duplicate(String),

    #[error("Redirect target of {path} must be an absolute path, got {target:?}")]
    BadRedirect { path: String, target: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("No route matches {0}")]
    NoMatch(String),

    #[error("Gave up on {path} after {hops} redirects")]
    RedirectLoop { path: String, hops: usize },

    #[error("Already at {0}")]
    Duplicated(String),

    #[error("No earlier route to go back to")]
    NoHistory,
}
