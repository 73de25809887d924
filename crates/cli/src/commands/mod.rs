//! Subcommand implementations.

pub mod products;
pub mod seed;

use curio_backend::BackendError;
use curio_core::EmailError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Neither the flag nor its environment variable was set.
    #[error("Missing setting: {0} (pass the flag or set the environment variable)")]
    MissingSetting(&'static str),

    /// Backend request failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Admin email is malformed.
    #[error("Invalid admin email: {0}")]
    Email(#[from] EmailError),

    /// Seed file is not valid YAML for a product list.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// One or more seed entries failed validation.
    #[error("{} seed entries failed validation", .0.len())]
    InvalidEntries(Vec<String>),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}
