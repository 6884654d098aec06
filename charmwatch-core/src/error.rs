//! Error types for the charmwatch pipeline

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to the charm store catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    /// A success response carried a body that is not the expected JSON
    #[error("Malformed response from {url}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while loading or validating run configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that stop a report run
#[derive(Error, Debug)]
pub enum RunError {
    /// The changes feed could not be fetched for the run date
    #[error("Changes feed unavailable for {date}; no report written")]
    UpstreamUnavailable { date: NaiveDate },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to render report")]
    Render(#[from] askama::Error),

    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file {path}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::UpstreamUnavailable { .. } => 2,
            _ => 1,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }
}
