//! Tar.gz archive writing.
//!
//! A single serialized writer streams staged files into a gzip-compressed
//! tar container; entry names are the paths relative to the source root.
//! Concurrent writers to one archive stream are not safe, so this runs
//! strictly after the copy barrier.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder as TarBuilder;

use crate::error::{BackupError, Result};
use crate::pipeline::Phase;
use crate::scan::FileEntry;

/// Size and entry count of a finished archive.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveStats {
    /// On-disk size of the compressed archive in bytes
    pub bytes_written: u64,

    /// Number of file entries in the archive
    pub file_count: u64,
}

/// Write the staged files into a compressed archive at `archive_path`.
///
/// Compression uses the fixed default level; it is deliberately not
/// configurable. The archive file is flushed and closed before this
/// returns, so a digest taken afterwards reflects final on-disk bytes.
pub fn write_archive(
    staging_root: &Path,
    entries: &[FileEntry],
    archive_path: &Path,
) -> Result<ArchiveStats> {
    let file = File::create(archive_path)
        .map_err(|e| BackupError::io(Phase::Compressing, archive_path, e))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut tar = TarBuilder::new(encoder);

    for entry in entries {
        let staged = staging_root.join(&entry.rel_path);
        tar.append_path_with_name(&staged, &entry.rel_path)
            .map_err(|e| BackupError::from_copy_io(Phase::Compressing, &staged, e))?;
    }

    let encoder = tar
        .into_inner()
        .map_err(|e| BackupError::io(Phase::Compressing, archive_path, e))?;
    let mut writer = encoder
        .finish()
        .map_err(|e| BackupError::io(Phase::Compressing, archive_path, e))?;
    writer
        .flush()
        .map_err(|e| BackupError::io(Phase::Compressing, archive_path, e))?;
    drop(writer);

    let bytes_written = std::fs::metadata(archive_path)
        .map_err(|e| BackupError::io(Phase::Compressing, archive_path, e))?
        .len();
    tracing::info!(
        archive = %archive_path.display(),
        bytes = bytes_written,
        entries = entries.len(),
        "archive written"
    );

    Ok(ArchiveStats {
        bytes_written,
        file_count: entries.len() as u64,
    })
}
