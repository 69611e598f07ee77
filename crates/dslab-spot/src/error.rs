//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading price traces and building price timelines.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("price trace cannot be found: {0}")]
    TraceNotFound(PathBuf),

    #[error("unknown price trace format: {0}")]
    UnknownFormat(String),

    #[error("failed to read price trace {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse price trace {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("price timeline is empty")]
    EmptyTimeline,
}

pub type PriceResult<T> = Result<T, PriceError>;

/// Errors raised while reading the simulation config or resolving a scheduler.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("can't parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("can't resolve scheduler: {0}")]
    UnknownAlgorithm(String),

    #[error("invalid value for option {name}: {value}")]
    InvalidOption { name: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
