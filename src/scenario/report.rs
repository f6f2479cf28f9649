//! Console reporting
//!
//! Prints outcomes as they are recorded and keeps a running tally so the
//! CLI can decide the exit status.

use colored::Colorize;

use super::runner::case_label;
use super::{Reporter, ScenarioReport};
use crate::assertion::AssertionOutcome;

/// Prints each outcome to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    verbose: bool,
    passed: usize,
    failed: usize,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// One-line summary of everything recorded so far.
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} total",
            self.passed,
            self.failed,
            self.total()
        )
    }
}

impl Reporter for ConsoleReporter {
    fn record(&mut self, _scenario: &str, case: usize, outcome: &AssertionOutcome) {
        let label = case_label(case, outcome);
        match &outcome.message {
            None => {
                self.passed += 1;
                if self.verbose {
                    println!(
                        "  {} {} {}",
                        "✓".green(),
                        label,
                        outcome.resolved.to_string().dimmed()
                    );
                } else {
                    println!("  {} {}", "✓".green(), label);
                }
            }
            Some(message) => {
                self.failed += 1;
                println!("  {} {} {}", "✗".red(), label, message);
                println!("      {} {}", "at".dimmed(), outcome.callsite.to_string().dimmed());
            }
        }
    }

    fn finish(&mut self, report: &ScenarioReport) {
        if report.passed() {
            println!("{} {}\n", "✓".green().bold(), report.description.green().bold());
        } else {
            let failed = report.failures().count();
            println!(
                "{} {} ({} of {} failed)\n",
                "✗".red().bold(),
                report.description.red().bold(),
                failed,
                report.outcomes.len()
            );
        }
    }
}
