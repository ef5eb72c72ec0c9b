// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SfnwatchError {
    /// The workflow definition lacks the structure needed to build a graph.
    #[error("Malformed definition: {0}")]
    MalformedDefinition(String),

    /// A collaborator call made while polling failed.
    #[error("Fetch failure: {0}")]
    FetchFailure(String),

    /// A user-initiated abort / redrive / start failed.
    #[error("Action failure: {0}")]
    ActionFailure(String),

    /// A launch parameter value that does not fit its configured type.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SfnwatchError {
    /// Errors that the reconciler swallows and retries on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SfnwatchError::FetchFailure(_)
                | SfnwatchError::MalformedDefinition(_)
                | SfnwatchError::NotFound(_)
                | SfnwatchError::IoError(_)
                | SfnwatchError::JsonError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SfnwatchError>;
