//! Scenario document types
//!
//! Defines the data structures for deserializing YAML scenario files.

use serde::Deserialize;
use serde_json::Value;

use crate::assertion::Operator;
use crate::http::RequestSpec;

/// A scenario file holds one scenario or a list of them
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ScenarioFile {
    Many(Vec<ScenarioDocument>),
    One(Box<ScenarioDocument>),
}

impl ScenarioFile {
    pub fn into_scenarios(self) -> Vec<ScenarioDocument> {
        match self {
            Self::Many(scenarios) => scenarios,
            Self::One(scenario) => vec![*scenario],
        }
    }
}

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDocument {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Wrap in a transactional scope (falls back to the configured default)
    pub transactional: Option<bool>,
    /// The request the scenario body sends
    pub request: RequestSpec,
    /// Expected response status code
    pub status: Option<u16>,
    /// Assertions on the decoded response body
    #[serde(default)]
    pub asserts: Vec<AssertionEntry>,
}

/// One assertion on the response body
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct AssertionEntry {
    /// What the assertion checks
    #[serde(default)]
    pub it: String,
    /// Comparison operator (e.g. "equal", "contains", "greater_than")
    pub op: Operator,
    /// Dotted path into the response body
    pub path: String,
    /// Expected value; omitted means null
    #[serde(default)]
    pub want: Value,
}
