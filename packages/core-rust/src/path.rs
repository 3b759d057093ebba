//! Validated endpoint path templates.
//!
//! A `PathSpec` is the key under which an endpoint is published to a router.
//! Only the shape of the template is checked here; matching request paths
//! against it is the router's job.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static VARIABLE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_]*)\}$").expect("valid regex"));

/// Errors from parsing a path template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathSpecError {
    #[error("path template is empty")]
    Empty,
    #[error("path template must start with '/': {path}")]
    MissingLeadingSlash { path: String },
    #[error("path template must not contain a query or fragment: {path}")]
    QueryOrFragment { path: String },
    #[error("path template has an empty segment: {path}")]
    EmptySegment { path: String },
    #[error("invalid path variable segment '{segment}' in {path}")]
    InvalidVariable { path: String, segment: String },
    #[error("path variable '{name}' declared more than once in {path}")]
    DuplicateVariable { path: String, name: String },
}

/// One `/`-separated segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Variable(String),
}

/// A validated path template such as `/rooms/{room}/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSpec {
    raw: String,
    segments: Vec<Segment>,
}

impl PathSpec {
    /// Parses and validates a path template.
    ///
    /// # Errors
    ///
    /// Returns `PathSpecError` if the template is empty, is not absolute,
    /// carries a query or fragment, has an empty segment, or declares a
    /// malformed or repeated `{variable}`.
    pub fn parse(raw: &str) -> Result<Self, PathSpecError> {
        if raw.is_empty() {
            return Err(PathSpecError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(PathSpecError::MissingLeadingSlash {
                path: raw.to_string(),
            });
        }
        if raw.contains(['?', '#']) {
            return Err(PathSpecError::QueryOrFragment {
                path: raw.to_string(),
            });
        }
        if raw == "/" {
            return Ok(Self {
                raw: raw.to_string(),
                segments: Vec::new(),
            });
        }

        let mut segments = Vec::new();
        let mut seen = HashSet::new();
        for part in raw[1..].split('/') {
            if part.is_empty() {
                return Err(PathSpecError::EmptySegment {
                    path: raw.to_string(),
                });
            }
            if !part.contains(['{', '}']) {
                segments.push(Segment::Literal(part.to_string()));
                continue;
            }
            let Some(captures) = VARIABLE_SEGMENT.captures(part) else {
                return Err(PathSpecError::InvalidVariable {
                    path: raw.to_string(),
                    segment: part.to_string(),
                });
            };
            let name = captures[1].to_string();
            if !seen.insert(name.clone()) {
                return Err(PathSpecError::DuplicateVariable {
                    path: raw.to_string(),
                    name,
                });
            }
            segments.push(Segment::Variable(name));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the `{variable}` segments, in template order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    #[must_use]
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables().any(|v| v == name)
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for PathSpec {
    type Err = PathSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
