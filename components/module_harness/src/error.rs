//! Error types for harness infrastructure
//!
//! Script failures never surface here; they become
//! [`LoadFailure`](crate::LoadFailure) or
//! [`RuntimeFailure`](crate::RuntimeFailure) records. `HarnessError` covers
//! what can stop a whole run: unreadable configuration, a test directory
//! that cannot be walked, a report that cannot be written.

use std::path::PathBuf;
use thiserror::Error;

/// Harness infrastructure errors
#[derive(Debug, Error)]
pub enum HarnessError {
    /// File I/O error
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Report output failed
    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),

    /// Configuration file is not valid YAML for [`HarnessConfig`](crate::HarnessConfig)
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// JSON report serialization failed
    #[error("report serialization failed: {0}")]
    Report(#[from] serde_json::Error),

    /// Test directory walk failed
    #[error("failed to walk test directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A configuration field holds an unsupported value
    #[error("invalid value for {field}: '{value}'")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: String,
    },
}

impl HarnessError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors reported by resource and browser collaborators
///
/// These reach scripts as `Error` exceptions carrying the display text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// `addHttpResource` was given a blank path
    #[error("resource path is empty")]
    EmptyResourcePath,

    /// The browser could not navigate to a URL
    #[error("Failed to open {url}")]
    OpenFailed {
        /// URL that failed
        url: String,
    },

    /// The page never finished loading
    #[error("page load failed: {0}")]
    PageLoad(String),
}
