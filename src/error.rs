//! Error types for the histline library
//!
//! This module defines all error types that can occur while scanning a
//! timeline history store, querying it, or reconstructing files from it.
//! Errors fall into a few categories:
//!
//! - **Configuration errors** abort before any scan happens (history root
//!   cannot be found, unsupported host)
//! - **Lookup misses** are reported to the caller (unknown file, version
//!   index out of range, nothing to reconstruct)
//! - **Per-entry errors** (missing snapshot blob, malformed index) are
//!   collected or logged by batch operations and never abort them

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the histline library
pub type Result<T> = std::result::Result<T, HistlineError>;

/// Main error type for all histline operations
#[derive(Debug, Error)]
pub enum HistlineError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// None of the default history locations exist on this machine
    #[error("No timeline history directory found. Tried: {tried:?}")]
    HistoryRootNotFound {
        /// Candidate locations that were checked
        tried: Vec<PathBuf>,
    },

    /// An explicitly configured history root does not exist
    #[error("Timeline directory not found: {0:?}")]
    HistoryRootMissing(PathBuf),

    /// The host operating system has no known default history location
    #[error("Unsupported operating system: {0}")]
    UnsupportedPlatform(String),

    /// A timestamp string could not be parsed
    #[error(
        "Unable to parse timestamp: {0}. Expected ISO format (2025-06-27T14:30:00), \
         date (2025-06-27), or Unix timestamp."
    )]
    InvalidTimestamp(String),

    /// The requested file has no entry in the catalog
    #[error("File not found in timeline: {0}")]
    FileNotFound(String),

    /// A directory filter matched no tracked files
    #[error("No files found for directory: {0}")]
    NothingToReconstruct(String),

    /// Version index outside of the available range
    #[error("Version index {index} out of range (valid range: 0..{available})")]
    VersionIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of versions the file has
        available: usize,
    },

    /// The content blob for a version is gone from the store
    #[error("Version file not found: {0:?}")]
    SnapshotMissing(PathBuf),

    /// An index file exists but cannot be used
    #[error("Invalid index file {path:?}: {reason}")]
    InvalidIndex {
        /// Path of the offending index file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HistlineError {
    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        HistlineError::Internal(msg.into())
    }

    /// Create an invalid index error
    pub fn invalid_index(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        HistlineError::InvalidIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error means the history root could not be resolved
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            HistlineError::HistoryRootNotFound { .. }
                | HistlineError::HistoryRootMissing(_)
                | HistlineError::UnsupportedPlatform(_)
        )
    }

    /// Check if this error is a "not found" style lookup miss
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            HistlineError::FileNotFound(_)
                | HistlineError::NothingToReconstruct(_)
                | HistlineError::VersionIndexOutOfRange { .. }
                | HistlineError::SnapshotMissing(_)
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            HistlineError::HistoryRootNotFound { .. } => {
                format!("{}. Pass the history location with --timeline-path.", self)
            }
            HistlineError::FileNotFound(path) => {
                format!(
                    "File '{}' not found in timeline. Use 'histline list' to see tracked files.",
                    path
                )
            }
            HistlineError::VersionIndexOutOfRange { available, .. } => {
                format!(
                    "{}. Use 'histline versions' to see the {} available version(s).",
                    self, available
                )
            }
            _ => self.to_string(),
        }
    }
}
