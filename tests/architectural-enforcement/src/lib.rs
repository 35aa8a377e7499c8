//! Architectural Enforcement
//!
//! Source scans shared by the integration tests in `tests/`:
//! - No blocking calls in async production code
//! - The headless core stays free of terminal crates

use std::fs;
use std::path::{Path, PathBuf};

/// Production source trees, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["monitor/core/src", "monitor/post/src", "tui/src"];

/// Workspace root, resolved from this package's manifest
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from("../.."))
}

/// Every `.rs` file under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Lines of `path` that belong to production code, with 1-based line numbers.
///
/// Comments are stripped and everything from the first `#[cfg(test)]` on is
/// skipped; test modules sit at the bottom of each file.
#[must_use]
pub fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .filter_map(|(idx, line)| {
            let code = line.split("//").next().unwrap_or(line).trim();
            (!code.is_empty()).then(|| (idx + 1, code.to_string()))
        })
        .collect()
}

/// Find lines in production code containing any of `patterns`
#[must_use]
pub fn find_violations(patterns: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for dir in PRODUCTION_DIRS {
        for file in rust_sources(dir) {
            for (line_number, code) in production_lines(&file) {
                if let Some(pattern) = patterns.iter().find(|p| code.contains(*p)) {
                    violations.push(format!(
                        "{}:{} - {}: {}",
                        file.display(),
                        line_number,
                        pattern,
                        code
                    ));
                }
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let dir = std::env::temp_dir().join(format!("arch-enforce-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("sample.rs");
        fs::write(
            &file,
            "fn a() {} // trailing\n// only a comment\n\n#[cfg(test)]\nmod tests { fn b() {} }\n",
        )
        .unwrap();

        let lines = production_lines(&file);
        assert_eq!(lines, vec![(1, "fn a() {}".to_string())]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_workspace_root_holds_every_production_dir() {
        for dir in PRODUCTION_DIRS {
            assert!(workspace_root().join(dir).is_dir(), "missing {dir}");
        }
    }
}
