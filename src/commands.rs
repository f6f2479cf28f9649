//! CLI command definitions
//!
//! Defines the clap commands for the apicheck CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scenarios in one or more YAML files against a service
    Test {
        /// Scenario files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Base URL of the service (overrides the config file)
        #[arg(long)]
        base_url: Option<String>,

        /// Show resolved values for passing assertions
        #[arg(long, short)]
        verbose: bool,
    },

    /// Resolve a dotted path inside a JSON or YAML document
    Resolve {
        /// Document to read (JSON, or YAML when the extension says so)
        file: PathBuf,

        /// Dotted path, e.g. result.list.0.name
        path: String,
    },
}
