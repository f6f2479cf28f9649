//! Assertion specs and their evaluation
//!
//! An [`AssertionSpec`] pairs an [`Operator`] and an expected value with the
//! place the value under test comes from: a path into the scenario root, a
//! producer called on its own, or a derivation over the whole root.
//!
//! Evaluation has two failure channels. A false comparison is an ordinary
//! failed [`AssertionOutcome`]. An operator applied to a value of the wrong
//! shape is a [`ShapeDefect`], returned as an error, because it means the
//! test itself is broken.

mod engine;

use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::common::Result;
use crate::path::{InvalidPath, PathExpression};
use crate::walk::{Resolved, Root};

pub use engine::evaluate;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    Contains,
    Matches,
    #[serde(alias = "len")]
    LengthEquals,
    GreaterThan,
    LessThan,
    Present,
    NotPresent,
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::Contains => "Contains",
            Self::Matches => "Matches",
            Self::LengthEquals => "LengthEquals",
            Self::GreaterThan => "GreaterThan",
            Self::LessThan => "LessThan",
            Self::Present => "Present",
            Self::NotPresent => "NotPresent",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an assertion was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callsite {
    /// Rust source location of the declaring call.
    Source {
        file: &'static str,
        line: u32,
        column: u32,
    },
    /// Case inside a scenario document (1-based).
    Document { path: String, case: usize },
}

impl Callsite {
    /// Location of the caller of the `#[track_caller]` chain.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::Source {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for Callsite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source { file, line, column } => write!(f, "{file}:{line}:{column}"),
            Self::Document { path, case } => write!(f, "{path}#case{case}"),
        }
    }
}

type Producer<'a> = Box<dyn Fn() -> Result<Value> + 'a>;
type Derivation<'a> = Box<dyn Fn(Root<'_>) -> Value + 'a>;

/// Where the value under test comes from.
pub enum Source<'a> {
    /// Resolved against the scenario root.
    Path(PathExpression),
    /// Obtained through a side channel, e.g. reading the cache directly.
    Producer(Producer<'a>),
    /// Computed from the whole scenario root.
    Derive(Derivation<'a>),
}

impl fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(&path.as_str()).finish(),
            Self::Producer(_) => f.write_str("Producer"),
            Self::Derive(_) => f.write_str("Derive"),
        }
    }
}

impl fmt::Display for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{path}"),
            Self::Producer(_) => f.write_str("<producer>"),
            Self::Derive(_) => f.write_str("<derived>"),
        }
    }
}

/// A single expectation.
#[derive(Debug)]
pub struct AssertionSpec<'a> {
    pub description: String,
    pub operator: Operator,
    pub expected: Value,
    pub source: Source<'a>,
    pub callsite: Callsite,
}

impl<'a> AssertionSpec<'a> {
    /// Expectation on the value at `path`.
    #[track_caller]
    pub fn at(
        path: &str,
        operator: Operator,
        expected: impl Into<Value>,
    ) -> std::result::Result<Self, InvalidPath> {
        let callsite = Callsite::caller();
        Ok(Self::new(
            Source::Path(PathExpression::parse(path)?),
            operator,
            expected.into(),
            callsite,
        ))
    }

    /// Expectation on a value fetched by `producer`, with no path resolution.
    #[track_caller]
    pub fn produced(
        producer: impl Fn() -> Result<Value> + 'a,
        operator: Operator,
        expected: impl Into<Value>,
    ) -> Self {
        Self::new(
            Source::Producer(Box::new(producer)),
            operator,
            expected.into(),
            Callsite::caller(),
        )
    }

    /// Expectation on a value computed from the scenario root.
    #[track_caller]
    pub fn derived(
        derive: impl Fn(Root<'_>) -> Value + 'a,
        operator: Operator,
        expected: impl Into<Value>,
    ) -> Self {
        Self::new(
            Source::Derive(Box::new(derive)),
            operator,
            expected.into(),
            Callsite::caller(),
        )
    }

    pub fn new(source: Source<'a>, operator: Operator, expected: Value, callsite: Callsite) -> Self {
        Self {
            description: String::new(),
            operator,
            expected,
            source,
            callsite,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Evaluated expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionOutcome {
    pub description: String,
    pub operator: Operator,
    /// Path or source label of the value under test.
    pub subject: String,
    pub expected: Value,
    pub resolved: Resolved,
    pub passed: bool,
    /// Set when the assertion did not pass.
    pub message: Option<String>,
    pub callsite: Callsite,
}

/// Operator applied to a value of the wrong kind. Not an assertion failure:
/// the test code is wrong and must be fixed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operator} requires {required}, got {actual} (at {callsite})")]
pub struct ShapeDefect {
    pub operator: Operator,
    pub required: &'static str,
    pub actual: String,
    pub callsite: Callsite,
}
