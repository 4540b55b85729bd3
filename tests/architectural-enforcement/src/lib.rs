//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The session core stays free of terminal UI crates
//! - No blocking sleep or blocking I/O on the event loop
//! - No panicking shortcuts in production code
//!
//! The helpers here collect production sources (test modules stripped) so the
//! tests in `tests/` can scan them.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source file with its test module removed
#[derive(Debug)]
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// File contents up to the first `#[cfg(test)]`
    pub code: String,
}

impl SourceFile {
    /// Non-comment lines with their 1-based line numbers
    pub fn code_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.code
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line)))
            .filter(|(_, code)| !code.trim().is_empty())
    }

    /// File name, e.g. `config.rs`
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

/// Workspace root (two levels above this package)
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from("../.."))
}

/// Every `.rs` file under `dir` (relative to the workspace root)
pub fn production_sources(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root();
    let base = root.join(dir);
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(&base)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        let code = match content.find("#[cfg(test)]") {
            Some(cut) => content[..cut].to_string(),
            None => content,
        };
        files.push(SourceFile {
            path: path.strip_prefix(&root).unwrap_or(path).to_path_buf(),
            code,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Format violations for a failing assertion
pub fn report(violations: &[String]) -> String {
    let mut out = format!("\nFound {} violation(s):\n", violations.len());
    for violation in violations {
        out.push_str("  - ");
        out.push_str(violation);
        out.push('\n');
    }
    out
}
