//! Path matching for interaction request matchers.
//!
//! A recorded path is compiled once when the pact is loaded:
//! - a path regex from the pact matching rules wins when present and valid
//! - a path containing placeholder segments (`{id}` or `:id`) matches
//!   structurally, with placeholders accepting any non-empty segment
//! - anything else is an exact string comparison

use regex::Regex;
use std::sync::Arc;

/// A single segment of a placeholder path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Compiled path matcher for efficient runtime evaluation.
#[derive(Debug, Clone)]
pub enum PathPattern {
    Exact(String),
    Segments(Vec<Segment>),
    Regex(Arc<Regex>),
}

impl PathPattern {
    /// Compile a recorded path, optionally overridden by a regex matching rule.
    ///
    /// The regex is anchored at both ends. An invalid regex is ignored and the
    /// recorded path is used as-is.
    pub fn compile(path: &str, regex: Option<&str>) -> Self {
        if let Some(pattern) = regex {
            if let Ok(re) = Regex::new(&format!("^(?:{pattern})$")) {
                return PathPattern::Regex(Arc::new(re));
            }
        }

        let segments: Vec<Segment> = path.split('/').map(parse_segment).collect();
        if segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(_)))
        {
            PathPattern::Segments(segments)
        } else {
            PathPattern::Exact(path.to_string())
        }
    }

    /// Check whether an incoming request path satisfies this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(expected) => expected == path,
            PathPattern::Regex(re) => re.is_match(path),
            PathPattern::Segments(expected) => {
                let actual: Vec<&str> = path.split('/').collect();
                actual.len() == expected.len()
                    && expected.iter().zip(actual).all(|(e, a)| match e {
                        Segment::Literal(lit) => lit == a,
                        Segment::Placeholder(_) => !a.is_empty(),
                    })
            }
        }
    }
}

fn parse_segment(segment: &str) -> Segment {
    let placeholder = segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .or_else(|| segment.strip_prefix(':'))
        .filter(|name| !name.is_empty());

    match placeholder {
        Some(name) => Segment::Placeholder(name.to_string()),
        None => Segment::Literal(segment.to_string()),
    }
}
