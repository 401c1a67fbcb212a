use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::RouteError;
use super::path::{self, Location, Pattern, PatternProblem};

/// Per-route metadata consulted by guards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(default)]
    pub requires_auth: bool,
}

/// One route declaration, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RouteRecord {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default)]
    pub meta: RouteMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn view(path: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            view: Some(view.into()),
            redirect: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn redirect(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            view: None,
            redirect: Some(target.into()),
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn requires_auth(mut self) -> Self {
        self.meta.requires_auth = true;
        self
    }

    pub fn with_children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// The admin console's route declarations.
pub fn admin_routes() -> Vec<RouteRecord> {
    vec![
        RouteRecord::view("/login", "AdminLogin"),
        RouteRecord::view("/register", "RegisterAdmin"),
        RouteRecord::view("/dashboard", "UserDashboard").requires_auth(),
        RouteRecord::view("/manage-events", "ManageEvents").requires_auth(),
        RouteRecord::view("/manage-tickets", "ManageTickets").requires_auth(),
        RouteRecord::view("/manage-organizers", "ManageOrganizers").requires_auth(),
        RouteRecord::redirect("*", "/login"),
    ]
}

/// A declaration flattened to its full path, one per level of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRecord {
    pub path: String,
    pub view: Option<String>,
    pub redirect: Option<String>,
    pub requires_auth: bool,
}

/// The outcome of matching a path: every record from the outermost parent
/// down to the leaf, plus captured params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub location: Location,
    pub matched: Vec<MatchedRecord>,
    pub params: BTreeMap<String, String>,
}

impl ResolvedRoute {
    pub fn path(&self) -> &str {
        &self.location.path
    }

    pub fn full_path(&self) -> String {
        self.location.full_path()
    }

    pub fn leaf(&self) -> Option<&MatchedRecord> {
        self.matched.last()
    }

    pub fn view(&self) -> Option<&str> {
        self.leaf().and_then(|r| r.view.as_deref())
    }

    pub fn redirect(&self) -> Option<&str> {
        self.leaf().and_then(|r| r.redirect.as_deref())
    }

    /// True if any record along the match is flagged.
    pub fn requires_auth(&self) -> bool {
        self.matched.iter().any(|r| r.requires_auth)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Same record, params and query. Letter case and trailing slashes in
    /// the requested path do not count.
    pub fn same_route(&self, other: &ResolvedRoute) -> bool {
        self.leaf().map(|r| &r.path) == other.leaf().map(|r| &r.path)
            && self.params == other.params
            && self.location.query == other.location.query
    }
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    pattern: Pattern,
    chain: Vec<MatchedRecord>,
}

impl CompiledRoute {
    fn full_path(&self) -> &str {
        self.chain.last().map(|r| r.path.as_str()).unwrap_or("")
    }
}

/// Validated, ordered route table. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> Result<Self, RouteError> {
        let mut routes = Vec::new();
        let mut seen = HashSet::new();
        let mut chain = Vec::new();

        for record in &records {
            compile(record, None, &mut chain, &mut routes, &mut seen)?;
        }

        // Catch-all goes last no matter where it was declared
        let (catch_all, mut ordered): (Vec<_>, Vec<_>) =
            routes.into_iter().partition(|r| r.full_path() == "*");
        ordered.extend(catch_all);

        Ok(Self { routes: ordered })
    }

    /// First route matching `raw`, in resolution order.
    pub fn resolve(&self, raw: &str) -> Option<ResolvedRoute> {
        let location = Location::parse(raw);
        self.routes.iter().find_map(|route| {
            route.pattern.matches(&location.path).map(|params| ResolvedRoute {
                location: location.clone(),
                matched: route.chain.clone(),
                params,
            })
        })
    }

    /// Routes in resolution order, as full path and matched chain.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MatchedRecord])> {
        self.routes.iter().map(|r| (r.full_path(), r.chain.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn compile(
    record: &RouteRecord,
    parent: Option<&str>,
    chain: &mut Vec<MatchedRecord>,
    out: &mut Vec<CompiledRoute>,
    seen: &mut HashSet<String>,
) -> Result<(), RouteError> {
    if record.path.is_empty() {
        return Err(RouteError::EmptyPath);
    }

    let full = match parent {
        Some(parent) => path::join(parent, &record.path),
        None if record.path == "*" || record.path.starts_with('/') => record.path.clone(),
        None => return Err(RouteError::NotAbsolute(record.path.clone())),
    };
    let full = if full == "*" { full } else { path::normalize(&full) };

    if record.view.is_some() && record.redirect.is_some() {
        return Err(RouteError::ViewAndRedirect(full));
    }
    if record.view.is_none() && record.redirect.is_none() && record.children.is_empty() {
        return Err(RouteError::NoTarget(full));
    }
    if let Some(ref target) = record.redirect {
        if !target.starts_with('/') {
            return Err(RouteError::BadRedirect {
                path: full,
                target: target.clone(),
            });
        }
    }

    let pattern = Pattern::compile(&full).map_err(|problem| match problem {
        PatternProblem::EmptyParamName => RouteError::EmptyParamName(full.clone()),
        PatternProblem::WildcardNotLast => RouteError::WildcardNotLast(full.clone()),
    })?;

    if !seen.insert(full.to_ascii_lowercase()) {
        return Err(RouteError::Duplicate(full));
    }

    chain.push(MatchedRecord {
        path: full.clone(),
        view: record.view.clone(),
        redirect: record.redirect.clone(),
        requires_auth: record.meta.requires_auth,
    });

    // Children first, so a parent never shadows a more specific child
    for child in &record.children {
        compile(child, Some(&full), chain, out, seen)?;
    }

    out.push(CompiledRoute {
        pattern,
        chain: chain.clone(),
    });
    chain.pop();
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
