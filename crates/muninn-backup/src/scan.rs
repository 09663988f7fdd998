//! Source-tree collection with ignore-rule pruning.
//!
//! The walker never descends into an excluded directory, so large ignored
//! trees (dependency caches, VCS metadata) cost nothing. A pruned
//! directory is tallied as a single ignored entry; excluded files are
//! tallied individually.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::error::Result;
use crate::rules::RuleSet;

/// Directories never descended into, even without a matching rule.
const ALWAYS_PRUNE: &[&str] = &[".git"];

/// One file selected for backup.
///
/// Size and mtime are snapshotted at scan time; the copy phase fails fast
/// if either changes before the file is staged.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute path of the source file
    pub path: PathBuf,

    /// Path relative to the source root, used as the in-archive name
    pub rel_path: PathBuf,

    /// File length at scan time
    pub size: u64,

    /// Modification time at scan time, where the platform reports one
    pub modified: Option<SystemTime>,
}

/// Outcome of a source-tree scan.
#[derive(Debug, Default)]
pub struct Scan {
    /// Files selected for backup, in traversal order
    pub files: Vec<FileEntry>,

    /// Excluded entries: matched files plus pruned directories
    pub ignored: u64,
}

/// Walk `root` and collect every file not excluded by `rules`.
pub fn scan(root: &Path, rules: &RuleSet) -> Result<Scan> {
    let pruned = Cell::new(0u64);
    let mut files = Vec::new();
    let mut ignored_files = 0u64;

    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if rules.is_match(rel) {
            tracing::debug!(path = %rel.display(), "pruned ignored directory");
            pruned.set(pruned.get() + 1);
            return false;
        }
        // VCS metadata is skipped even without a rule, but only rule
        // matches count as ignored.
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| ALWAYS_PRUNE.contains(&name))
        {
            return false;
        }
        true
    }) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        if rules.is_match(&rel) {
            tracing::debug!(path = %rel.display(), "ignored file");
            ignored_files += 1;
            continue;
        }
        let metadata = entry.metadata()?;
        files.push(FileEntry {
            path: entry.path().to_path_buf(),
            rel_path: rel,
            size: metadata.len(),
            modified: metadata.modified().ok(),
        });
    }

    let scan = Scan {
        files,
        ignored: ignored_files + pruned.get(),
    };
    tracing::info!(
        included = scan.files.len(),
        ignored = scan.ignored,
        "scan complete"
    );
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rel_paths(scan: &Scan) -> Vec<String> {
        let mut paths: Vec<String> = scan
            .files
            .iter()
            .map(|f| f.rel_path.to_string_lossy().replace('\\', "/"))
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_gitignore_scenario_counts() {
        // Source tree {a.txt, b.log, .git/config} with rules `*.log` and
        // `.git/` collects exactly {a.txt} with two ignored entries.
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.log"), "b").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "[core]").unwrap();

        let rules = RuleSet::parse("*.log\n.git/\n").unwrap();
        let scan = scan(dir.path(), &rules).unwrap();

        assert_eq!(rel_paths(&scan), vec!["a.txt"]);
        assert_eq!(scan.ignored, 2);
    }

    #[test]
    fn test_pruned_directory_counts_once() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("cache/deep/deeper")).unwrap();
        fs::write(dir.path().join("cache/one"), "1").unwrap();
        fs::write(dir.path().join("cache/deep/two"), "2").unwrap();
        fs::write(dir.path().join("cache/deep/deeper/three"), "3").unwrap();
        fs::write(dir.path().join("kept.txt"), "kept").unwrap();

        let rules = RuleSet::parse("cache/\n").unwrap();
        let scan = scan(dir.path(), &rules).unwrap();

        assert_eq!(rel_paths(&scan), vec!["kept.txt"]);
        // The whole subtree is one pruned entry; descendants were never
        // visited, let alone counted.
        assert_eq!(scan.ignored, 1);
    }

    #[test]
    fn test_git_pruned_without_rule_not_counted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let scan = scan(dir.path(), &RuleSet::default()).unwrap();

        assert_eq!(rel_paths(&scan), vec!["main.rs"]);
        assert_eq!(scan.ignored, 0);
    }

    #[test]
    fn test_empty_source_directory() {
        let dir = TempDir::new().unwrap();
        let scan = scan(dir.path(), &RuleSet::default()).unwrap();
        assert!(scan.files.is_empty());
        assert_eq!(scan.ignored, 0);
    }

    #[test]
    fn test_metadata_snapshot_taken() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data.bin"), "12345").unwrap();

        let scan = scan(dir.path(), &RuleSet::default()).unwrap();
        assert_eq!(scan.files.len(), 1);
        assert_eq!(scan.files[0].size, 5);
        assert!(scan.files[0].modified.is_some());
        assert!(scan.files[0].path.is_absolute());
    }

    #[test]
    fn test_nested_files_keep_relative_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/bin")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::write(dir.path().join("src/bin/main.rs"), "").unwrap();

        let scan = scan(dir.path(), &RuleSet::default()).unwrap();
        assert_eq!(rel_paths(&scan), vec!["src/bin/main.rs", "src/lib.rs"]);
    }
}
