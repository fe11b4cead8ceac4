// ============================================================================
// scenecut-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the scenecut core library
//
// Contract violations (negative radius, non-positive frame rate, inverted
// ranges) surface as `InvalidParameter`. Weak signals, empty candidate sets
// and missing detector metrics never become errors; the components fall back
// to conservative values instead.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors produced by the scenecut core library.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A caller supplied a value that violates a component contract.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, io::Error),

    #[error("Command '{0}' failed with status {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("Failed waiting for command '{0}': {1}")]
    CommandWait(String, io::Error),

    #[error("Required dependency '{0}' not found")]
    DependencyNotFound(String),

    #[error("Failed to parse ffprobe output: {0}")]
    FfprobeParse(String),

    #[error("Video info error: {0}")]
    VideoInfoError(String),

    /// A per-frame statistics file could not be turned into a series.
    #[error("Stats file error: {0}")]
    StatsParse(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type used throughout the core library.
pub type CoreResult<T> = Result<T, CoreError>;

pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}

pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Shorthand for building an `InvalidParameter` error.
pub(crate) fn invalid(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidParameter(msg.into())
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::JsonParseError(err.to_string())
    }
}
