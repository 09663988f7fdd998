//! Backup manifest and report rendering.
//!
//! The manifest records one backup run: timestamp, archive name and size,
//! digest, counts, and an optional operator comment. It serializes to
//! JSON and renders the plain-text report artifact written next to the
//! archive. Written once, never mutated.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Version of the backup manifest format.
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Name of the report artifact written next to the archive.
pub const REPORT_FILENAME: &str = "readme.txt";

/// Name of the JSON manifest written next to the archive.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Timestamp format used in backup folder and archive names.
pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d-%H.%M.%S";

/// Checksum information for integrity verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumInfo {
    /// Hash algorithm (sha256)
    pub algorithm: String,

    /// Hex-encoded checksum value
    pub value: String,
}

impl ChecksumInfo {
    /// Create SHA-256 checksum info from a hex digest.
    pub fn sha256(value: impl Into<String>) -> Self {
        Self {
            algorithm: "sha256".to_string(),
            value: value.into(),
        }
    }
}

/// Metadata record describing one backup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupManifest {
    /// Manifest format version
    pub version: String,

    /// When the backup was created
    pub created_at: DateTime<Local>,

    /// File name of the produced archive
    pub archive_name: String,

    /// On-disk size of the archive in bytes
    pub archive_size_bytes: u64,

    /// Digest of the final archive bytes
    pub checksum: ChecksumInfo,

    /// Files copied into the archive
    pub files_copied: u64,

    /// Excluded entries (matched files plus pruned directories)
    pub files_ignored: u64,

    /// Free-text operator comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Duration of the backup run in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl BackupManifest {
    /// Creates a new manifest stamped with the current local time.
    pub fn new(
        archive_name: impl Into<String>,
        archive_size_bytes: u64,
        checksum: ChecksumInfo,
        files_copied: u64,
        files_ignored: u64,
        comment: Option<String>,
    ) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            created_at: Local::now(),
            archive_name: archive_name.into(),
            archive_size_bytes,
            checksum,
            files_copied,
            files_ignored,
            comment,
            duration_seconds: None,
        }
    }

    /// Sets the run duration.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Serializes the manifest to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a manifest from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renders the plain-text report artifact.
    pub fn render_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "Backup created on: {}\n",
            self.created_at.format(TIMESTAMP_FORMAT)
        ));
        report.push_str(&format!("Archive created: {}\n", self.archive_name));
        report.push_str(&format!("Archive size: {} bytes\n", self.archive_size_bytes));
        report.push_str(&format!(
            "SHA-256 hash of the archive: {}\n",
            self.checksum.value
        ));
        report.push_str(&format!("Files copied: {}\n", self.files_copied));
        report.push_str(&format!("Entries ignored: {}\n", self.files_ignored));
        if let Some(comment) = &self.comment {
            report.push_str(&format!("Comment: {}\n", comment));
        }
        report
    }
}
