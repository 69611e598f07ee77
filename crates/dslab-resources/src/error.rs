//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the exclusive resource switch.
#[derive(Debug, Error, PartialEq)]
pub enum SwitchError {
    #[error("no available resource channel left")]
    CapacityExhausted,

    #[error("resource switch is closed")]
    SwitchClosed,

    #[error("unknown output {0}")]
    UnknownOutput(u64),
}

pub type SwitchResult<T> = Result<T, SwitchError>;

/// Errors aborting a workload replay.
#[derive(Debug, Error, PartialEq)]
pub enum ReplayError {
    /// The clock passed the end of the current fragment without servicing it.
    #[error("fragment deadline {deadline} is already passed at {now}")]
    ReplayConsistencyViolation { deadline: u64, now: u64 },

    #[error(transparent)]
    Switch(#[from] SwitchError),
}

pub type ReplayResult<T> = Result<T, ReplayError>;

/// Errors raised while reading workload traces.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read workload trace {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse workload trace {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type TraceResult<T> = Result<T, TraceError>;
