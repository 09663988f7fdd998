//! Backup command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use muninn_backup::{run_backup, BackupConfig, BackupError, REPORT_FILENAME};

use crate::output;

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Directory to back up
    pub source: PathBuf,

    /// Directory receiving the timestamped backup folder
    pub destination: PathBuf,

    /// Re-verify the archive checksum after creation
    #[arg(long)]
    pub verify: bool,

    /// Comment recorded in the backup report
    #[arg(short, long)]
    pub comment: Option<String>,

    /// Number of parallel copy workers (defaults to CPU count)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Ignore file name, resolved relative to the source root
    #[arg(long, default_value = ".gitignore")]
    pub ignore_file: String,
}

pub async fn run(args: BackupArgs) -> Result<()> {
    output::header("Backup");
    output::kv("Source", &args.source.display().to_string());
    output::kv("Destination", &args.destination.display().to_string());
    if let Some(comment) = &args.comment {
        output::kv("Comment", comment);
    }
    println!();

    let mut config = BackupConfig::new(&args.source, &args.destination)
        .with_verify(args.verify)
        .with_comment(args.comment.clone())
        .with_ignore_file(&args.ignore_file);
    if let Some(jobs) = args.jobs {
        config = config.with_workers(jobs);
    }

    let spinner = output::spinner("Creating backup...");
    let result = run_backup(&config);
    spinner.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err @ BackupError::ChecksumMismatch { .. }) => {
            output::warning(&format!("{err}"));
            output::warning("The archive has been kept on disk for inspection");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    // Write the plain-text report next to the archive.
    let report_path = outcome.backup_dir.join(REPORT_FILENAME);
    std::fs::write(&report_path, outcome.manifest.render_report())?;

    output::success("Backup complete");
    output::kv("Archive", &outcome.archive_path.display().to_string());
    output::kv(
        "Size",
        &format!("{} bytes", outcome.manifest.archive_size_bytes),
    );
    output::kv("SHA-256", &outcome.manifest.checksum.value);
    output::kv("Files copied", &outcome.manifest.files_copied.to_string());
    output::kv(
        "Entries ignored",
        &outcome.manifest.files_ignored.to_string(),
    );
    if args.verify {
        output::info("Checksum verified");
    }

    Ok(())
}
