use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures running one of the wrapped command-line tools.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("{program} reported an error: {message}")]
    Reported { program: String, message: String },
}

/// Problems with the batch input table.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read batch table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("row {row} of {path} has an empty case id")]
    EmptyCaseId { path: PathBuf, row: usize },
}
