//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! Zero denominators are not errors anywhere in the pipeline: every ratio is
//! guarded and evaluates to zero.

use thiserror::Error;

/// Errors that can occur while scanning diagnostic dumps
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The whole input matches neither the hot threads nor the task list shape
    #[error("Unrecognized input format: {0}")]
    DataFormat(String),

    /// A single record could not be read; scanners skip these
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

/// Errors that can occur during flamegraph generation
///
/// An empty frame list is a valid result and never an error.
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Invalid canvas: {0}")]
    InvalidCanvas(String),

    #[error("Invalid minimum width: {0}")]
    InvalidMinWidth(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
