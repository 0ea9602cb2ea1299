//! Error types for transcript conversion
//!
//! Every variant is fatal: the converter stops at the first error and propagates it to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting a transcript
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Reading an input or writing the output table failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to an output sink without a path failed
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Configuration could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A layout row has an unrecognized exclosure marker or too few columns
    #[error("incorrect format of layout file (line {line}): {message}")]
    Format { line: usize, message: String },

    /// The current metadata names an exclosure outside ex1/ex2/ex3
    #[error("unknown exclosure '{0}' (expected ex1, ex2 or ex3)")]
    UnknownExclosure(String),

    /// A position token has no plant in the resolved exclosure layout
    #[error("position '{position}' not found in layout for exclosure {exclosure}")]
    UnknownPosition { exclosure: String, position: String },

    /// An event references an insect index that was never declared
    #[error("insect '{0}' referenced before it was declared")]
    UndeclaredInsect(String),

    /// An entry needs observation metadata but no metadata block has been seen yet
    #[error("entry at {timestamp} requires observation metadata, but none has been declared")]
    MissingMetadata { timestamp: String },

    /// An entry matched a line type but lacks a token that line type requires
    #[error("malformed entry at {timestamp}: {reason}")]
    MalformedEntry { timestamp: String, reason: String },

    /// The transcript markup does not have the expected structure
    #[error("malformed transcript: {0}")]
    MalformedTranscript(String),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(timestamp: &str, reason: impl Into<String>) -> Self {
        ConvertError::MalformedEntry {
            timestamp: timestamp.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience Result type using [`ConvertError`]
pub type Result<T> = std::result::Result<T, ConvertError>;
