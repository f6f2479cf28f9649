//! Error types for apicheck
//!
//! Defects in test code (bad path syntax, operator/operand mismatches) keep
//! their own types in [`crate::path`] and [`crate::assertion`]; they convert
//! into [`Error`] only at the CLI boundary.

use std::io;
use thiserror::Error;

use crate::assertion::ShapeDefect;
use crate::path::InvalidPath;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for apicheck
#[derive(Error, Debug)]
pub enum Error {
    // === Defects ===
    #[error(transparent)]
    InvalidPath(#[from] InvalidPath),

    #[error("Shape defect: {0}")]
    ShapeDefect(#[from] ShapeDefect),

    // === Scenario Errors ===
    #[error("Scenario '{name}' failed: {reason}")]
    ScenarioFailed { name: String, reason: String },

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    // === HTTP Errors ===
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Test Errors ===
    #[error("{count} scenario(s) could not be run")]
    ScenariosErrored { count: usize },

    #[error("{failed} of {total} assertions failed")]
    AssertionsFailed { failed: usize, total: usize },
}

impl Error {
    /// Create a scenario failure error
    pub fn scenario_failed(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::ScenarioFailed {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is a defect in test code rather than a runtime failure
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::InvalidPath(_) | Self::ShapeDefect(_))
    }
}
