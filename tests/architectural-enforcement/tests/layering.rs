//! Integration Test: Layering and Event Loop Hygiene
//!
//! **Policy**:
//! - `canvas/core` is headless. It must not import or depend on ratatui or
//!   crossterm.
//! - Code reachable from the event loop must not block: no
//!   `std::thread::sleep`, no `std::fs`/`std::net`, no `reqwest::blocking`.
//!   Config loading and `main` run before the loop starts and may read files.
//! - Production code propagates errors instead of calling `unwrap()`/`expect()`.

use std::fs;

use architectural_enforcement::{production_sources, report, workspace_root};

const SOURCE_DIRS: [&str; 2] = ["canvas/core/src", "tui/src"];

/// Files that run before the async event loop
const PRE_LOOP_FILES: [&str; 2] = ["config.rs", "main.rs"];

#[test]
fn test_core_has_no_ui_imports() {
    let mut violations = Vec::new();
    for file in production_sources("canvas/core/src") {
        for (line_number, code) in file.code_lines() {
            if code.contains("ratatui") || code.contains("crossterm") {
                violations.push(format!("{}:{} - {}", file.path.display(), line_number, code.trim()));
            }
        }
    }
    assert!(violations.is_empty(), "{}", report(&violations));
}

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("canvas/core/Cargo.toml"))
        .expect("canvas/core/Cargo.toml should be readable");
    for forbidden in ["ratatui", "crossterm"] {
        assert!(
            !manifest.contains(forbidden),
            "canvas-core must not depend on {forbidden}"
        );
    }
}

#[test]
fn test_no_blocking_sleep() {
    let mut violations = Vec::new();
    for dir in SOURCE_DIRS {
        for file in production_sources(dir) {
            for (line_number, code) in file.code_lines() {
                if code.contains("thread::sleep") {
                    violations.push(format!("{}:{} - {}", file.path.display(), line_number, code.trim()));
                }
            }
        }
    }
    assert!(violations.is_empty(), "{}", report(&violations));
}

#[test]
fn test_no_blocking_io_on_event_loop() {
    let mut violations = Vec::new();
    for dir in SOURCE_DIRS {
        for file in production_sources(dir) {
            if PRE_LOOP_FILES.contains(&file.file_name()) {
                continue;
            }
            for (line_number, code) in file.code_lines() {
                let blocking = code.contains("std::fs")
                    || code.contains("std::net")
                    || code.contains("reqwest::blocking");
                if blocking {
                    violations.push(format!("{}:{} - {}", file.path.display(), line_number, code.trim()));
                }
            }
        }
    }
    assert!(violations.is_empty(), "{}", report(&violations));
}

#[test]
fn test_no_unwrap_in_production_code() {
    let mut violations = Vec::new();
    for dir in SOURCE_DIRS {
        for file in production_sources(dir) {
            for (line_number, code) in file.code_lines() {
                if code.contains(".unwrap()") || code.contains(".expect(") {
                    violations.push(format!("{}:{} - {}", file.path.display(), line_number, code.trim()));
                }
            }
        }
    }
    assert!(violations.is_empty(), "{}", report(&violations));
}

#[test]
fn test_sources_were_found() {
    for dir in SOURCE_DIRS {
        assert!(
            !production_sources(dir).is_empty(),
            "expected Rust sources under {dir}"
        );
    }
}
