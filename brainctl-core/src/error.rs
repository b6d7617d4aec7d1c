//! Structured error types for brainctl-core.
//!
//! The library returns `BrainError` so callers can tell a missing input
//! (recoverable) apart from everything else. The binary wraps these in
//! `anyhow` for reporting.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for brainctl-core operations
#[derive(Error, Debug)]
pub enum BrainError {
    /// Input export does not exist
    #[error("{path:?} not found")]
    NotFound { path: PathBuf },

    /// Input is not a JSON array of conversation objects
    #[error("JSON error at {context}: {source}")]
    Parse {
        context: String,
        source: serde_json::Error,
    },

    /// A message node whose shape cannot be interpreted (e.g. no `author.role`)
    #[error("malformed message in conversation '{conversation}' node {node}: {reason}")]
    MalformedRecord {
        conversation: String,
        node: String,
        reason: String,
    },

    /// Epoch seconds that cannot be mapped onto a calendar date
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Archive or file that does not hold a conversations export
    #[error("Invalid format in file {path:?}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    /// Empty input file
    #[error("Empty input file: {path:?}")]
    EmptyFile { path: PathBuf },

    /// I/O failure on a specific file
    #[error("I/O error on {path:?}: {source}")]
    File { path: PathBuf, source: io::Error },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for brainctl-core operations
pub type Result<T> = std::result::Result<T, BrainError>;

impl BrainError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    pub fn malformed(
        conversation: impl Into<String>,
        node: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedRecord {
            conversation: conversation.into(),
            node: node.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_timestamp(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn empty_file(path: impl Into<PathBuf>) -> Self {
        Self::EmptyFile { path: path.into() }
    }

    /// Attach the offending path to an I/O error
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True when the input export is missing, the one condition the pipeline recovers from
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrainError::malformed("Trip Planning", "node-1", "missing author.role");
        assert_eq!(
            err.to_string(),
            "malformed message in conversation 'Trip Planning' node node-1: missing author.role"
        );

        let err = BrainError::invalid_format("/tmp/export.zip", "no conversations.json entry");
        assert!(err.to_string().contains("Invalid format"));
        assert!(err.to_string().contains("/tmp/export.zip"));
    }

    #[test]
    fn test_not_found_is_recoverable() {
        assert!(BrainError::not_found("conversations.json").is_not_found());
        assert!(!BrainError::config("bad").is_not_found());
    }

    #[test]
    fn test_file_error_names_path() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = BrainError::file("out/Brain_Part2.txt", io_err);

        assert!(matches!(err, BrainError::File { .. }));
        assert!(err.to_string().contains("Brain_Part2.txt"));
        assert!(err.to_string().contains("denied"));
    }
}
