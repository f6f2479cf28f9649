//! Dotted path expressions
//!
//! A path such as `result.list.1.name` is split on `.` into segments. The
//! parser does not decide whether a segment is a field name or an index;
//! each walker makes that call per step, based on the container it is
//! standing on.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Parsed dotted path (`a.b.3.c`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    raw: String,
    segments: Vec<String>,
}

impl PathExpression {
    /// Parse a dotted path. Empty input and empty segments are rejected.
    pub fn parse(input: &str) -> Result<Self, InvalidPath> {
        if input.is_empty() {
            return Err(InvalidPath::new(input, "path must not be empty"));
        }

        let segments: Vec<String> = input.split('.').map(str::to_string).collect();
        if let Some(position) = segments.iter().position(String::is_empty) {
            return Err(InvalidPath::new(
                input,
                format!("segment {} is empty", position + 1),
            ));
        }

        Ok(Self {
            raw: input.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Interpret a segment as a sequence index (base-10, non-negative).
pub fn segment_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl FromStr for PathExpression {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A path string that cannot be parsed. This is a defect in the caller's
/// test code, never a data condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid path `{input}`: {reason}")]
pub struct InvalidPath {
    input: String,
    reason: String,
}

impl InvalidPath {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }
}
