//! Verify command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use muninn_backup::verify_file;

use crate::output;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the archive to verify
    pub archive: PathBuf,

    /// Expected hex-encoded SHA-256 checksum
    pub checksum: String,
}

pub async fn run(args: VerifyArgs) -> Result<()> {
    let spinner = output::spinner("Computing checksum...");
    let matches = verify_file(&args.archive, &args.checksum);
    spinner.finish_and_clear();

    if matches? {
        output::success(&format!(
            "Checksum verified: {}",
            args.archive.display()
        ));
        Ok(())
    } else {
        anyhow::bail!("checksum mismatch for {}", args.archive.display())
    }
}
