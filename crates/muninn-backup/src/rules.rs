//! Ignore-rule parsing and matching.
//!
//! Rules come from a newline-separated ignore file with version-control
//! semantics: `#` comments and blank lines are skipped, a trailing `/`
//! marks a directory rule, everything else is a glob matched against both
//! the relative path and the base name. Matching is case-sensitive and
//! first-match-wins; negation is not supported.

use std::path::Path;

use globset::{Glob, GlobMatcher};

use crate::error::{BackupError, Result};

/// Characters that make a pattern a glob rather than a literal name.
const WILDCARD_CHARS: &[char] = &['*', '?', '['];

/// One compiled exclusion rule.
///
/// A bare name without wildcards or a dot in its final segment expands into
/// both variants, so `build` excludes a file called `build` as well as a
/// `build/` directory tree. The expansion is deterministic and happens at
/// parse time instead of being re-derived during matching.
#[derive(Debug, Clone)]
pub enum IgnoreRule {
    /// Glob matched against the full relative path or the base name.
    File { pattern: String, matcher: GlobMatcher },

    /// Matches a directory and everything beneath it.
    Directory { pattern: String, matcher: GlobMatcher },
}

impl IgnoreRule {
    fn file(pattern: &str) -> Result<Self> {
        Ok(Self::File {
            pattern: pattern.to_string(),
            matcher: compile(pattern)?,
        })
    }

    fn directory(pattern: &str) -> Result<Self> {
        Ok(Self::Directory {
            pattern: pattern.to_string(),
            matcher: compile(pattern)?,
        })
    }

    /// The original pattern text, without any trailing separator.
    pub fn pattern(&self) -> &str {
        match self {
            Self::File { pattern, .. } | Self::Directory { pattern, .. } => pattern,
        }
    }

    /// Whether this rule excludes `rel_path` (a path relative to the
    /// source root).
    fn matches(&self, rel_path: &Path) -> bool {
        match self {
            Self::File { matcher, .. } => {
                matcher.is_match(rel_path)
                    || rel_path
                        .file_name()
                        .is_some_and(|name| matcher.is_match(Path::new(name)))
            }
            Self::Directory { matcher, .. } => {
                // The directory itself, by path or base name, or any
                // ancestor directory of the candidate path.
                matcher.is_match(rel_path)
                    || rel_path
                        .file_name()
                        .is_some_and(|name| matcher.is_match(Path::new(name)))
                    || rel_path
                        .ancestors()
                        .skip(1)
                        .filter(|a| !a.as_os_str().is_empty())
                        .any(|a| {
                            matcher.is_match(a)
                                || a.file_name()
                                    .is_some_and(|name| matcher.is_match(Path::new(name)))
                        })
            }
        }
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| BackupError::invalid_pattern(pattern, e))
}

/// A bare name with no wildcard and no dot in its final segment may denote
/// a directory; such lines additionally produce a `Directory` rule.
fn expands_to_directory(line: &str) -> bool {
    if line.contains(WILDCARD_CHARS) {
        return false;
    }
    let last_segment = line.rsplit('/').next().unwrap_or(line);
    !last_segment.contains('.')
}

/// An ordered set of exclusion rules loaded from one ignore file.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<IgnoreRule>,
}

impl RuleSet {
    /// Load rules from an ignore file. A missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| BackupError::io(crate::pipeline::Phase::Scanning, path, e))?;
        let set = Self::parse(&text)?;
        tracing::debug!(
            path = %path.display(),
            rules = set.len(),
            "loaded ignore rules"
        );
        Ok(set)
    }

    /// Parse ignore-file text into a rule set.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(dir) = line.strip_suffix('/') {
                rules.push(IgnoreRule::directory(dir)?);
            } else {
                rules.push(IgnoreRule::file(line)?);
                if expands_to_directory(line) {
                    rules.push(IgnoreRule::directory(line)?);
                }
            }
        }
        Ok(Self { rules })
    }

    /// Whether `rel_path` is excluded. Evaluation stops at the first
    /// matching rule.
    pub fn is_match(&self, rel_path: &Path) -> bool {
        self.rules.iter().any(|rule| rule.matches(rel_path))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let set = RuleSet::parse("# comment\n\n   \n*.log\n").unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.is_match(Path::new("app.log")));
        assert!(!set.is_match(Path::new("app.txt")));
    }

    #[test]
    fn test_glob_matches_path_and_base_name() {
        let set = RuleSet::parse("*.log\n").unwrap();
        assert!(set.is_match(Path::new("deep/nested/trace.log")));
        assert!(set.is_match(Path::new("trace.log")));
        assert!(!set.is_match(Path::new("trace.log.txt")));
    }

    #[test]
    fn test_directory_rule_matches_everything_beneath() {
        let set = RuleSet::parse(".git/\n").unwrap();
        assert!(set.is_match(Path::new(".git")));
        assert!(set.is_match(Path::new(".git/config")));
        assert!(set.is_match(Path::new(".git/objects/ab/cdef")));
        assert!(!set.is_match(Path::new("src/main.rs")));
    }

    #[test]
    fn test_nested_directory_rule_matches_by_name() {
        let set = RuleSet::parse("node_modules/\n").unwrap();
        assert!(set.is_match(Path::new("web/node_modules")));
        assert!(set.is_match(Path::new("web/node_modules/left-pad/index.js")));
    }

    #[test]
    fn test_bare_name_expands_to_both_variants() {
        let set = RuleSet::parse("build\n").unwrap();
        assert_eq!(set.len(), 2);
        // As a file.
        assert!(set.is_match(Path::new("build")));
        // As a directory tree.
        assert!(set.is_match(Path::new("build/output.bin")));
    }

    #[test]
    fn test_name_with_dot_stays_a_file_rule() {
        let set = RuleSet::parse("notes.txt\n").unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.is_match(Path::new("notes.txt")));
        assert!(!set.is_match(Path::new("notes.txt/weird-nested")));
    }

    #[test]
    fn test_wildcard_pattern_stays_a_file_rule() {
        let set = RuleSet::parse("tmp*\n").unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.is_match(Path::new("tmpfile")));
    }

    #[test]
    fn test_question_mark_and_char_class() {
        let set = RuleSet::parse("data.?\nv[0-9].dump\n").unwrap();
        assert!(set.is_match(Path::new("data.1")));
        assert!(!set.is_match(Path::new("data.10")));
        assert!(set.is_match(Path::new("v3.dump")));
        assert!(!set.is_match(Path::new("vx.dump")));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let set = RuleSet::parse("*.LOG\n").unwrap();
        assert!(set.is_match(Path::new("app.LOG")));
        assert!(!set.is_match(Path::new("app.log")));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = RuleSet::parse("[invalid\n").unwrap_err();
        assert!(matches!(err, BackupError::InvalidPattern { .. }));
    }

    #[test]
    fn test_load_missing_file_yields_empty_set() {
        let dir = tempfile::TempDir::new().unwrap();
        let set = RuleSet::load(&dir.path().join(".gitignore")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".gitignore");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# build artifacts").unwrap();
        writeln!(file, "*.o").unwrap();
        writeln!(file, "target/").unwrap();
        drop(file);

        let set = RuleSet::load(&path).unwrap();
        assert!(set.is_match(Path::new("main.o")));
        assert!(set.is_match(Path::new("target/debug/muninn")));
        assert!(!set.is_match(Path::new("main.rs")));
    }
}
