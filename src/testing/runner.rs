//! Scenario document runner
//!
//! Turns each document into a [`Scenario`] and runs it through the
//! [`ScenarioRunner`] with the HTTP collaborator as its body.

use std::path::Path;

use colored::Colorize;
use tracing::debug;

use crate::assertion::{AssertionSpec, Callsite, Source};
use crate::common::config::ScenarioDefaults;
use crate::common::{Error, Result};
use crate::http::HttpInvoker;
use crate::path::PathExpression;
use crate::scenario::{Reporter, Scenario, ScenarioRunner};

use super::config::{ScenarioDocument, ScenarioFile};

/// Result of one scenario
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub assertions_run: usize,
    pub assertions_failed: usize,
    pub error: Option<String>,
}

/// Load the scenarios in a YAML file
pub fn load_scenarios(path: &Path) -> Result<Vec<ScenarioDocument>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read scenario file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let file: ScenarioFile = serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse scenario file: {}", e)))?;

    Ok(file.into_scenarios())
}

/// Run every scenario in a YAML file
///
/// A scenario whose request fails is recorded as a failed result and the
/// next scenario still runs. Defects (bad paths, operator/value mismatches)
/// abort the whole file.
pub fn run_file<R: Reporter>(
    path: &Path,
    invoker: &dyn HttpInvoker,
    reporter: &mut R,
    defaults: &ScenarioDefaults,
) -> Result<Vec<TestResult>> {
    let documents = load_scenarios(path)?;
    let mut results = Vec::with_capacity(documents.len());

    for document in &documents {
        println!(
            "\n{} {}",
            "Running Scenario:".blue().bold(),
            document.name.white().bold()
        );
        if let Some(desc) = &document.description {
            println!("  {}", desc.dimmed());
        }

        let scenario = build_scenario(path, document, defaults)?;
        debug!(
            name = %document.name,
            assertions = scenario.assertions.len(),
            "scenario loaded"
        );

        let mut runner = ScenarioRunner::new().with_reporter(&mut *reporter);
        match runner.run_request(&scenario, invoker, &document.request) {
            Ok(report) => {
                let failed = report.failures().count();
                results.push(TestResult {
                    name: document.name.clone(),
                    passed: failed == 0,
                    assertions_run: report.outcomes.len(),
                    assertions_failed: failed,
                    error: None,
                });
            }
            Err(e) if e.is_defect() => return Err(e),
            Err(e) => {
                println!("  {} {}", "✗".red(), e);
                results.push(TestResult {
                    name: document.name.clone(),
                    passed: false,
                    assertions_run: 0,
                    assertions_failed: 0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(results)
}

fn build_scenario<'a>(
    path: &Path,
    document: &ScenarioDocument,
    defaults: &ScenarioDefaults,
) -> Result<Scenario<'a>> {
    let file = path.display().to_string();
    let mut scenario = Scenario::new(&document.name)
        .transactional(document.transactional.unwrap_or(defaults.transactional))
        .with_callsite(Callsite::Document {
            path: file.clone(),
            case: 0,
        });
    if let Some(status) = document.status {
        scenario = scenario.expect_status(status);
    }

    for (index, entry) in document.asserts.iter().enumerate() {
        let spec = AssertionSpec::new(
            Source::Path(PathExpression::parse(&entry.path)?),
            entry.op,
            entry.want.clone(),
            Callsite::Document {
                path: file.clone(),
                case: index + 1,
            },
        )
        .describe(entry.it.clone());
        scenario = scenario.assert(spec);
    }

    Ok(scenario)
}
