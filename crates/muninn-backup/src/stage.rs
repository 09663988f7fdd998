//! Parallel staging copy.
//!
//! Each worker copies one source file into the staging tree and owns that
//! destination path exclusively; the only shared state is an atomic
//! counter of completed copies. Directory creation races are absorbed by
//! `create_dir_all`'s create-if-absent semantics. The function returns
//! only once every worker has finished, which is the barrier the archive
//! writer relies on.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{BackupError, Result};
use crate::pipeline::Phase;
use crate::scan::FileEntry;

/// Cooperative cancellation signal for the copy phase.
///
/// Cloned tokens share one flag; cancelling any clone stops in-flight work
/// at the next per-file checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Copy every collected file into `staging_root`, using a bounded pool of
/// `workers` threads. Returns the number of files copied.
pub fn copy_to_staging(
    entries: &[FileEntry],
    staging_root: &Path,
    workers: usize,
    cancel: &CancelToken,
) -> Result<u64> {
    let copied = AtomicU64::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| BackupError::WorkerPool {
            details: e.to_string(),
        })?;

    pool.install(|| {
        entries.par_iter().try_for_each(|entry| {
            if cancel.is_cancelled() {
                return Err(BackupError::Cancelled {
                    phase: Phase::Copying,
                });
            }
            copy_one(entry, staging_root)?;
            copied.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    })?;

    let total = copied.load(Ordering::Relaxed);
    tracing::info!(copied = total, workers = workers.max(1), "staging copy complete");
    Ok(total)
}

fn copy_one(entry: &FileEntry, staging_root: &Path) -> Result<()> {
    // Fail fast if the source mutated since the scan snapshot.
    let metadata = std::fs::symlink_metadata(&entry.path)
        .map_err(|e| BackupError::from_copy_io(Phase::Copying, &entry.path, e))?;
    if metadata.len() != entry.size || metadata.modified().ok() != entry.modified {
        return Err(BackupError::file_changed(&entry.path));
    }

    let dest = staging_root.join(&entry.rel_path);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| BackupError::io(Phase::Copying, parent, e))?;
    }
    std::fs::copy(&entry.path, &dest)
        .map_err(|e| BackupError::from_copy_io(Phase::Copying, &entry.path, e))?;
    tracing::debug!(path = %entry.rel_path.display(), "copied");
    Ok(())
}
