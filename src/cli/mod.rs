//! CLI command handling
//!
//! Dispatches CLI commands and formats output.

use std::path::Path;

use colored::Colorize;
use serde_json::Value;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::http::HttpClient;
use crate::path::PathExpression;
use crate::scenario::ConsoleReporter;
use crate::testing;
use crate::walk::{resolve_tree, Resolved};

/// Dispatch a CLI command
pub fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Test {
            paths,
            base_url,
            verbose,
        } => {
            let mut config = Config::load()?;
            if let Some(base_url) = base_url {
                config.http.base_url = base_url;
            }
            if !config.scenarios.color {
                colored::control::set_override(false);
            }

            let client = HttpClient::new(&config.http)?;
            let mut reporter = ConsoleReporter::new(verbose);
            let mut results = Vec::new();

            for path in &paths {
                results.extend(testing::run_file(
                    path,
                    &client,
                    &mut reporter,
                    &config.scenarios,
                )?);
            }

            let passed = results.iter().filter(|r| r.passed).count();
            let assertions_run: usize = results.iter().map(|r| r.assertions_run).sum();
            let assertions_failed: usize = results.iter().map(|r| r.assertions_failed).sum();
            let errored = results.iter().filter(|r| r.error.is_some()).count();

            let summary = format!(
                "{} of {} scenarios passed; {}",
                passed,
                results.len(),
                reporter.summary()
            );
            println!("{}", summary.bold());

            if errored > 0 {
                return Err(Error::ScenariosErrored { count: errored });
            }
            if assertions_failed > 0 {
                return Err(Error::AssertionsFailed {
                    failed: assertions_failed,
                    total: assertions_run,
                });
            }
            Ok(())
        }

        Commands::Resolve { file, path } => {
            let path = PathExpression::parse(&path)?;
            let document = read_document(&file)?;
            match resolve_tree(&document, &path) {
                Resolved::Value(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Resolved::Absent => println!("<absent>"),
            }
            Ok(())
        }
    }
}

/// Read a JSON or YAML document into a generic tree
fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}
