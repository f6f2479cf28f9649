//! Scenarios and the collaborators they borrow
//!
//! A scenario is one isolated unit of work: optionally wrapped in a
//! transactional scope on the shared data store, it runs a body, evaluates
//! its assertions against what the body produced, and always leaves the
//! store, cache, and search index clean for the next scenario.

mod report;
mod runner;

use serde_json::Value;

use crate::assertion::{AssertionOutcome, AssertionSpec, Callsite};
use crate::common::Result;
use crate::http::HttpResponse;
use crate::walk::{Inspect, Root};

pub use report::ConsoleReporter;
pub use runner::{ScenarioRunner, ScenarioState};

/// Shared data store that can open and roll back a scope.
pub trait DataStore {
    fn begin(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;
}

/// Shared cache.
pub trait Cache {
    fn flush_all(&self) -> Result<()>;
}

/// Shared search index.
pub trait SearchIndex {
    fn clear_all(&self) -> Result<()>;
}

/// Receives every outcome of a scenario.
pub trait Reporter {
    /// `case` is the 1-based position of the assertion; 0 is the status check.
    fn record(&mut self, scenario: &str, case: usize, outcome: &AssertionOutcome);

    fn finish(&mut self, _report: &ScenarioReport) {}
}

/// Declared scenario: a description, its isolation mode, and what to check.
#[derive(Debug)]
pub struct Scenario<'a> {
    pub description: String,
    pub transactional: bool,
    /// Checked before the declared assertions when the body returns a response.
    pub expected_status: Option<u16>,
    pub assertions: Vec<AssertionSpec<'a>>,
    pub callsite: Callsite,
}

impl<'a> Scenario<'a> {
    #[track_caller]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            transactional: false,
            expected_status: None,
            assertions: Vec::new(),
            callsite: Callsite::caller(),
        }
    }

    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = Some(status);
        self
    }

    pub fn assert(mut self, spec: AssertionSpec<'a>) -> Self {
        self.assertions.push(spec);
        self
    }

    pub fn assertions(mut self, specs: impl IntoIterator<Item = AssertionSpec<'a>>) -> Self {
        self.assertions.extend(specs);
        self
    }

    pub fn with_callsite(mut self, callsite: Callsite) -> Self {
        self.callsite = callsite;
        self
    }
}

/// What a scenario body produced.
pub enum Output<'a> {
    Response(HttpResponse),
    /// A decoded tree that did not come from HTTP.
    Tree(Value),
    Native(Box<dyn Inspect + 'a>),
    Nothing,
}

impl<'a> Output<'a> {
    pub fn native(value: impl Inspect + 'a) -> Self {
        Self::Native(Box::new(value))
    }

    pub fn root(&self) -> Root<'_> {
        match self {
            Self::Response(response) => Root::Tree(&response.body),
            Self::Tree(value) => Root::Tree(value),
            Self::Native(value) => Root::Native(value.as_ref()),
            Self::Nothing => Root::Empty,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(response) => Some(response.status),
            _ => None,
        }
    }
}

/// Aggregated outcomes of one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub description: String,
    pub callsite: Callsite,
    pub outcomes: Vec<AssertionOutcome>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed)
    }
}
