//! Error types for muninn-backup

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::Phase;

/// Result type alias using muninn-backup's error type
pub type Result<T> = std::result::Result<T, BackupError>;

/// Error taxonomy for a backup run.
///
/// Configuration errors and unrecoverable IO errors abort the operation
/// before any partial archive is left behind; a checksum mismatch is
/// reported but the archive stays on disk.
#[derive(Error, Debug)]
pub enum BackupError {
    /// Source directory missing or not a directory
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Ignore file contained a glob that failed to compile
    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Directory traversal failure
    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// A collected file disappeared before it could be processed
    #[error("File vanished during {phase}: {path}")]
    FileVanished { phase: Phase, path: PathBuf },

    /// A collected file was modified between scan and copy
    #[error("File changed between scan and copy: {path}")]
    FileChanged { path: PathBuf },

    /// IO error with phase and path context
    #[error("IO error during {phase} on '{path}': {source}")]
    Io {
        phase: Phase,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Worker pool could not be constructed
    #[error("Copy worker pool creation failed: {details}")]
    WorkerPool { details: String },

    /// Cancellation was requested while work was in flight
    #[error("Backup cancelled during {phase}")]
    Cancelled { phase: Phase },

    /// Recomputed archive digest did not match the expected value
    #[error("Archive checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Manifest serialization error
    #[error("Manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl BackupError {
    /// Create a source not found error
    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound { path: path.into() }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, source: globset::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create an IO error carrying phase and path context
    pub fn io(phase: Phase, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            phase,
            path: path.into(),
            source,
        }
    }

    /// Create a file vanished error
    pub fn file_vanished(phase: Phase, path: impl Into<PathBuf>) -> Self {
        Self::FileVanished {
            phase,
            path: path.into(),
        }
    }

    /// Create a file changed error
    pub fn file_changed(path: impl Into<PathBuf>) -> Self {
        Self::FileChanged { path: path.into() }
    }

    /// Map an IO failure on `path`, turning `NotFound` into `FileVanished`.
    pub fn from_copy_io(phase: Phase, path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::file_vanished(phase, path)
        } else {
            Self::io(phase, path, source)
        }
    }

    /// True for verification failures, which preserve the produced archive.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }
}
