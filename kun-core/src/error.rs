// ============================================================================
// kun-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Kun Core Library
//
// Every fallible operation in kun-core returns `CoreResult<T>`. The job runner
// is the one place where these errors stop propagating: it converts them into
// a boolean outcome plus a status message for the caller.
//
// KEY COMPONENTS:
// - CoreError: the error taxonomy (invalid jobs, missing engine, process failures)
// - CoreResult: result alias used across the crate
// - Helper constructors for process start/wait/failure errors

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Errors produced by kun-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A job specification violated one of its construction invariants.
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// A value could not be parsed into one of the supported option enums.
    #[error("Unsupported {kind}: '{value}'")]
    Unsupported { kind: &'static str, value: String },

    #[error("FFmpeg executable not found")]
    EngineNotFound,

    #[error("Failed to start '{0}': {1}")]
    CommandStart(String, io::Error),

    #[error("Failed waiting for '{0}': {1}")]
    CommandWait(String, io::Error),

    #[error("'{cmd}' failed with {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("'{0}' timed out after {1:?}")]
    Timeout(String, Duration),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout kun-core.
pub type CoreResult<T> = Result<T, CoreError>;

pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}

pub(crate) fn unsupported(kind: &'static str, value: &str) -> CoreError {
    CoreError::Unsupported {
        kind,
        value: value.to_string(),
    }
}
