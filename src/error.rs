use crate::backend::client::HttpError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy for a harness run. Per-case variants are converted into
/// failed `TestCase` records at the case boundary; the rest abort the run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("write rejected by backend: {0}")]
    WriteFailed(HttpError),

    #[error("backend did not converge after {attempts} attempts")]
    TimedOut { attempts: u32 },

    #[error("run cancelled")]
    Cancelled,

    #[error("field not found at {path}")]
    FieldNotFound { path: String },

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("duplicate test case name: {0}")]
    DuplicateName(String),

    #[error("run already finalized, no further records accepted")]
    RunClosed,

    #[error("io error on {destination}: {source}")]
    Io {
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed result artifact {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

impl HarnessError {
    pub fn io(destination: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            destination: destination.into(),
            source,
        }
    }
}
