//! Integration Test: Core Layering
//!
//! `monitor-core` is headless. Terminal crates belong to the TUI only, so
//! the coordinator and boot player stay testable without a terminal.

use std::fs;

use architectural_enforcement::{production_lines, rust_sources, workspace_root};

const TERMINAL_CRATES: &[&str] = &["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_terminal_crates() {
    let manifest = fs::read_to_string(workspace_root().join("monitor/core/Cargo.toml"))
        .expect("core manifest should be readable");

    for krate in TERMINAL_CRATES {
        let declared = manifest
            .lines()
            .map(str::trim)
            .any(|line| line.starts_with(&format!("{krate} ")) || line.starts_with(&format!("{krate}=")));
        assert!(!declared, "monitor-core must not depend on {krate}");
    }
}

#[test]
fn test_core_sources_do_not_import_terminal_crates() {
    let mut violations = Vec::new();
    for file in rust_sources("monitor/core/src") {
        for (line_number, code) in production_lines(&file) {
            if TERMINAL_CRATES
                .iter()
                .any(|krate| code.contains(&format!("{krate}::")))
            {
                violations.push(format!("{}:{} - {}", file.display(), line_number, code));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "terminal crate used in monitor-core:\n{}",
        violations.join("\n")
    );
}

#[test]
fn test_tui_depends_on_core() {
    let manifest = fs::read_to_string(workspace_root().join("tui/Cargo.toml"))
        .expect("tui manifest should be readable");
    assert!(manifest.contains("monitor-core"));
}
