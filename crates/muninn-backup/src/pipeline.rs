//! Backup pipeline orchestration.
//!
//! Drives one run through its phases: scan the source with ignore rules,
//! copy survivors into a staging area in parallel, write the archive with
//! a single serialized writer, digest it, and optionally re-verify. The
//! staging area lives in a temporary directory that is discarded on every
//! exit path; the backup folder itself is removed if the run fails before
//! producing a usable archive.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;

use crate::archive;
use crate::digest;
use crate::error::{BackupError, Result};
use crate::manifest::{BackupManifest, ChecksumInfo, MANIFEST_FILENAME, TIMESTAMP_FORMAT};
use crate::rules::RuleSet;
use crate::scan;
use crate::stage::{self, CancelToken};

/// Phases of a backup run. A run moves forward only; `Failed` is
/// reachable from any non-terminal phase and no phase is re-entered.
/// `Idle` is the state before `run_backup` is invoked; the pipeline
/// itself only ever reports the working phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Copying,
    Compressing,
    Verifying,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Scanning => "scanning",
            Phase::Copying => "copying",
            Phase::Compressing => "compressing",
            Phase::Verifying => "verifying",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Configuration for one backup run.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Directory tree to back up
    pub source: PathBuf,

    /// Directory receiving the timestamped backup folder
    pub destination: PathBuf,

    /// Re-verify the archive digest after creation
    pub verify: bool,

    /// Free-text comment recorded in the manifest
    pub comment: Option<String>,

    /// Copy worker count
    pub workers: usize,

    /// Ignore file name, resolved relative to the source root
    pub ignore_file: String,
}

impl BackupConfig {
    /// Creates a configuration with default workers and ignore file.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            verify: false,
            comment: None,
            workers: num_cpus::get(),
            ignore_file: ".gitignore".to_string(),
        }
    }

    /// Enables or disables post-creation verification.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Sets the operator comment.
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Sets the copy worker count (clamped to at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the ignore file name.
    pub fn with_ignore_file(mut self, name: impl Into<String>) -> Self {
        self.ignore_file = name.into();
        self
    }
}

/// Result of a completed backup run.
#[derive(Debug)]
pub struct BackupOutcome {
    /// Path to the produced archive
    pub archive_path: PathBuf,

    /// Timestamped folder holding the archive and report
    pub backup_dir: PathBuf,

    /// Manifest describing the run
    pub manifest: BackupManifest,
}

/// Removes a partially-created backup folder unless disarmed.
struct CleanupGuard {
    path: PathBuf,
    armed: bool,
}

impl CleanupGuard {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(path = %self.path.display(), "removing partial backup folder");
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

/// Run a backup to completion.
pub fn run_backup(config: &BackupConfig) -> Result<BackupOutcome> {
    run_backup_with_cancel(config, &CancelToken::new())
}

/// Run a backup, checking `cancel` between per-file copy steps.
pub fn run_backup_with_cancel(
    config: &BackupConfig,
    cancel: &CancelToken,
) -> Result<BackupOutcome> {
    match execute(config, cancel) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            tracing::error!(phase = %Phase::Failed, error = %err, "backup failed");
            Err(err)
        }
    }
}

fn execute(config: &BackupConfig, cancel: &CancelToken) -> Result<BackupOutcome> {
    let start = Instant::now();

    let source = config
        .source
        .canonicalize()
        .map_err(|_| BackupError::source_not_found(&config.source))?;
    if !source.is_dir() {
        return Err(BackupError::source_not_found(&config.source));
    }

    std::fs::create_dir_all(&config.destination)
        .map_err(|e| BackupError::io(Phase::Scanning, &config.destination, e))?;

    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let folder_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "backup".to_string());
    let backup_dir = config
        .destination
        .join(format!("{timestamp} - {folder_name}"));
    std::fs::create_dir_all(&backup_dir)
        .map_err(|e| BackupError::io(Phase::Scanning, &backup_dir, e))?;
    let mut guard = CleanupGuard::new(&backup_dir);

    let archive_name = format!("{timestamp} - {folder_name}.tar.gz");
    let archive_path = backup_dir.join(&archive_name);

    tracing::info!(phase = %Phase::Scanning, source = %source.display(), "backup started");
    let rules = RuleSet::load(&source.join(&config.ignore_file))?;
    let scan = scan::scan(&source, &rules)?;

    tracing::info!(phase = %Phase::Copying, files = scan.files.len(), "copying to staging");
    let staging = tempfile::tempdir()
        .map_err(|e| BackupError::io(Phase::Copying, &backup_dir, e))?;
    let copied = stage::copy_to_staging(&scan.files, staging.path(), config.workers, cancel)?;

    // All workers have joined; the staging tree is complete and frozen.
    tracing::info!(phase = %Phase::Compressing, archive = %archive_name, "writing archive");
    let stats = archive::write_archive(staging.path(), &scan.files, &archive_path)?;
    let checksum = digest::digest_file(&archive_path)?;

    if config.verify {
        tracing::info!(phase = %Phase::Verifying, "verifying archive digest");
        // The archive is finished at this point; a verification failure
        // reports the mismatch but keeps the file on disk.
        guard.disarm();
        let recomputed = digest::digest_file(&archive_path)?;
        if recomputed != checksum {
            return Err(BackupError::ChecksumMismatch {
                expected: checksum,
                actual: recomputed,
            });
        }
    }

    let manifest = BackupManifest::new(
        archive_name,
        stats.bytes_written,
        ChecksumInfo::sha256(checksum),
        copied,
        scan.ignored,
        config.comment.clone(),
    )
    .with_duration(start.elapsed().as_secs_f64());

    let manifest_path = backup_dir.join(MANIFEST_FILENAME);
    std::fs::write(&manifest_path, manifest.to_json()?)
        .map_err(|e| BackupError::io(Phase::Compressing, &manifest_path, e))?;

    guard.disarm();
    tracing::info!(
        phase = %Phase::Done,
        copied,
        ignored = scan.ignored,
        bytes = stats.bytes_written,
        "backup complete"
    );

    Ok(BackupOutcome {
        archive_path,
        backup_dir,
        manifest,
    })
}
