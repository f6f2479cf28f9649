//! apicheck - dotted-path resolution and assertions for service tests
//!
//! This library resolves dotted paths (`result.list.1.name`) against decoded
//! response payloads or arbitrary in-memory values, evaluates typed
//! assertions on what it finds, and runs them inside isolated scenarios.

pub mod assertion;
pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod path;
pub mod scenario;
pub mod testing;
pub mod walk;

// Re-export commonly used types
pub use assertion::{evaluate, AssertionOutcome, AssertionSpec, Callsite, Operator, ShapeDefect};
pub use common::{Error, Result};
pub use path::{InvalidPath, PathExpression};
pub use scenario::{Output, Scenario, ScenarioReport, ScenarioRunner};
pub use walk::{resolve_native, resolve_tree, Inspect, Resolved, Root};
