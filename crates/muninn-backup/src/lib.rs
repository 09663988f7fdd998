//! Directory backup engine.
//!
//! Produces compressed, checksummed snapshots of a directory tree:
//! gitignore-style rules select what to exclude, survivors are copied in
//! parallel into a temporary staging area, and a single writer packs the
//! staged tree into a `.tar.gz` archive whose SHA-256 digest is recorded
//! in a JSON manifest and a plain-text report.
//!
//! # Example
//!
//! ```no_run
//! use muninn_backup::{run_backup, BackupConfig};
//!
//! let config = BackupConfig::new("/home/me/project", "/backups")
//!     .with_verify(true)
//!     .with_comment(Some("before the refactor".to_string()));
//! let outcome = run_backup(&config)?;
//! println!("archive: {}", outcome.archive_path.display());
//! # Ok::<(), muninn_backup::BackupError>(())
//! ```

pub mod archive;
pub mod digest;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod rules;
pub mod scan;
pub mod stage;

pub use archive::{write_archive, ArchiveStats};
pub use digest::{digest_file, verify_file, DIGEST_BLOCK_SIZE};
pub use error::{BackupError, Result};
pub use manifest::{
    BackupManifest, ChecksumInfo, MANIFEST_FILENAME, MANIFEST_VERSION, REPORT_FILENAME,
    TIMESTAMP_FORMAT,
};
pub use pipeline::{run_backup, run_backup_with_cancel, BackupConfig, BackupOutcome, Phase};
pub use rules::{IgnoreRule, RuleSet};
pub use scan::{scan, FileEntry, Scan};
pub use stage::{copy_to_staging, CancelToken};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(REPORT_FILENAME, "readme.txt");
        assert_eq!(MANIFEST_FILENAME, "manifest.json");
    }
}
