//! Path normalization and pattern matching.

use std::collections::BTreeMap;

/// Param name the trailing wildcard captures into.
pub const WILDCARD_PARAM: &str = "pathMatch";

/// A navigation target split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Location {
    /// Split `raw` into path, query and fragment, and normalize the path:
    /// leading slash ensured, repeated slashes collapsed, trailing slash
    /// dropped.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (raw, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };

        Self {
            path: normalize(path),
            query: query.filter(|q| !q.is_empty()),
            fragment: fragment.filter(|f| !f.is_empty()),
        }
    }

    /// Path plus query and fragment, as it would appear in the address bar.
    pub fn full_path(&self) -> String {
        let mut out = self.path.clone();
        if let Some(ref query) = self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(ref fragment) = self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

/// Normalize a bare path.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Join a child pattern onto its parent's full pattern.
pub fn join(parent: &str, child: &str) -> String {
    if child.starts_with('/') || parent.is_empty() {
        return child.to_string();
    }
    if child.is_empty() {
        return parent.to_string();
    }
    if parent.ends_with('/') {
        format!("{}{}", parent, child)
    } else {
        format!("{}/{}", parent, child)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// Why a pattern could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternProblem {
    EmptyParamName,
    WildcardNotLast,
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn compile(pattern: &str) -> Result<Self, PatternProblem> {
        let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (i, part) in raw.iter().enumerate() {
            let segment = if *part == "*" {
                if i + 1 != raw.len() {
                    return Err(PatternProblem::WildcardNotLast);
                }
                Segment::Wildcard
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternProblem::EmptyParamName);
                }
                Segment::Param(name.to_string())
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match a normalized path, returning captured params on success.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = BTreeMap::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => {
                    let rest = parts.get(i..).map(|p| p.join("/")).unwrap_or_default();
                    params.insert(WILDCARD_PARAM.to_string(), format!("/{}", rest));
                    return Some(params);
                }
                Segment::Literal(lit) => {
                    let part = parts.get(i)?;
                    if !lit.eq_ignore_ascii_case(part) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let part = parts.get(i)?;
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

// ============================================================================
// Tests
// ============================================================================
