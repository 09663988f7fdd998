//! Streaming SHA-256 digests for integrity verification.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{BackupError, Result};
use crate::pipeline::Phase;

/// Block size for streaming reads. Archives are unbounded, so the file is
/// never loaded into memory whole.
pub const DIGEST_BLOCK_SIZE: usize = 4096;

/// Compute the hex-encoded SHA-256 digest of a file.
pub fn digest_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).map_err(|e| BackupError::io(Phase::Verifying, path, e))?;
    let mut hasher = Sha256::new();
    let mut block = [0u8; DIGEST_BLOCK_SIZE];
    loop {
        let n = file
            .read(&mut block)
            .map_err(|e| BackupError::io(Phase::Verifying, path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Recompute the digest of `path` and compare it with `expected` for
/// equality. The expected value is normalized first (surrounding
/// whitespace trimmed, hex lowercased); computed digests are always
/// lowercase.
pub fn verify_file(path: &Path, expected: &str) -> Result<bool> {
    let actual = digest_file(path)?;
    let expected = expected.trim().to_ascii_lowercase();
    let matches = actual == expected;
    if !matches {
        tracing::warn!(
            path = %path.display(),
            expected = %expected,
            actual = %actual,
            "checksum mismatch"
        );
    }
    Ok(matches)
}
