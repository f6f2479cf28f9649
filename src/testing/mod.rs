//! Scenario documents
//!
//! Reads declarative YAML scenarios (a request, an expected status, and a
//! list of path assertions) and runs them through the scenario runner
//! against a live service.

mod config;
mod runner;

pub use config::*;
pub use runner::{load_scenarios, run_file, TestResult};
