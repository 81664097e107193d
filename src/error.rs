//! Error types for the screening engine
//!
//! Search operations never fail: an empty result is data. Errors only come
//! from configuration, per-record precomputation, refresh cycles and the
//! store collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid runtime tunables. These stop the process at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to parse {key}={value:?} as {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{key} must be {constraint}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: String,
        constraint: &'static str,
    },

    #[error("failed to read sources config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A single record could not be precomputed. The record is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("name {original:?} is empty after step '{step}'")]
    EmptyName { original: String, step: &'static str },
}

/// A refresh cycle failed. The previously installed snapshot stays live.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("download of {name} from {url} failed: {source}")]
    Download {
        name: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no downloaded file for list source {0}")]
    MissingFile(String),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refresh produced no records")]
    Empty,

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the customer status and download stats collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no customer ID provided")]
    MissingCustomerId,

    #[error("no operator ID provided")]
    MissingOperatorId,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
