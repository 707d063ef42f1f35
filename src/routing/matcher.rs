//! Location pattern matching.
//!
//! # Responsibilities
//! - Compile a pattern string into literal / parameter / wildcard segments
//! - Match a concrete path against a compiled pattern
//! - Extract named parameters on success
//!
//! # Design Decisions
//! - Empty segments are discarded: `/a//b/` is the same as `a/b`
//! - Segment counts must be equal; `*` covers exactly one segment
//! - Literals are lower-cased at compile time (request paths are lower-cased)
//! - No regex, no percent-decoding

use std::fmt;

use crate::protocol::Params;

/// One compiled path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the concrete segment.
    Literal(String),
    /// `:name`, binds the concrete segment under `name`.
    Param(String),
    /// `*`, matches any single segment.
    Wildcard,
}

impl Segment {
    fn compile(raw: &str) -> Self {
        if raw == "*" {
            Segment::Wildcard
        } else if let Some(name) = raw.strip_prefix(':') {
            Segment::Param(name.to_string())
        } else {
            Segment::Literal(raw.to_lowercase())
        }
    }
}

/// A compiled location pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pattern: String,
    segments: Vec<Segment>,
}

impl Location {
    pub fn compile(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            segments: split(pattern).map(Segment::compile).collect(),
        }
    }

    /// The pattern as registered.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match `path`, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let concrete: Vec<&str> = split(path).collect();
        if concrete.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, value) in self.segments.iter().zip(concrete) {
            match segment {
                Segment::Literal(literal) if literal != value => return None,
                Segment::Literal(_) | Segment::Wildcard => {}
                Segment::Param(name) => {
                    params.insert(name.clone(), value.to_string());
                }
            }
        }
        Some(params)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matches(path).is_some()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
