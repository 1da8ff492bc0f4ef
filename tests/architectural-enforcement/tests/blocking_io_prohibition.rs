//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions in production code MUST NOT use blocking I/O.
//! **Required**: `tokio::fs`, `tokio::net`, `tokio::io::stdin`, not their
//! `std` counterparts.
//! **Exceptions**: non-async functions (config loading runs before the first
//! request), test code, and terminal output in the `surface` crate.

use architectural_enforcement::{production_sources, SourceFile};

/// Test that production code does not use blocking I/O in async functions
#[test]
fn test_no_blocking_io_in_production_code() {
    let violations: Vec<String> = production_sources()
        .iter()
        .flat_map(blocking_io_violations)
        .collect();

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking I/O calls found in async production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n❌ FORBIDDEN in async fn:");
        eprintln!("  - std::fs::*, std::net::*, std::process::Command");
        eprintln!("  - reqwest::blocking::*");
        eprintln!("  - std::io::stdin()");
        eprintln!("\n✅ REQUIRED async I/O:");
        eprintln!("  - tokio::fs, tokio::net, tokio::process");
        eprintln!("  - tokio::io::stdin() with AsyncBufReadExt");

        panic!(
            "\nFound {} blocking I/O violation(s) in production code.",
            violations.len()
        );
    }
}

fn blocking_io_violations(file: &SourceFile) -> Vec<String> {
    let terminal_surface = file.path.starts_with("surface");
    let mut violations = Vec::new();

    for idx in 0..file.lines.len() {
        if file.in_test_code(idx) {
            continue;
        }
        let code = file.code(idx);

        // Anywhere: the blocking HTTP client must never be used
        if code.contains("reqwest::blocking") {
            violations.push(file.violation(idx, "Blocking HTTP client"));
        }

        if !file.in_async_fn(idx) {
            continue;
        }

        if code.contains("std::fs::") {
            violations.push(file.violation(idx, "Blocking file I/O"));
        }
        if code.contains("std::net::") {
            violations.push(file.violation(idx, "Blocking network I/O"));
        }
        if code.contains("std::process::Command") {
            violations.push(file.violation(idx, "Blocking process I/O"));
        }
        if code.contains("std::io::stdin()") {
            violations.push(file.violation(idx, "Blocking stdin"));
        }
        if code.contains("std::io::stdout()") && !terminal_surface {
            violations.push(file.violation(idx, "Terminal output outside the surface"));
        }
    }

    violations
}

fn file(path: &str, lines: &[&str]) -> SourceFile {
    SourceFile {
        path: path.into(),
        lines: lines.iter().map(|l| (*l).to_string()).collect(),
    }
}

#[test]
fn test_detector_flags_async_file_read() {
    let source = file(
        "conductor/core/src/example.rs",
        &[
            "pub async fn load() {",
            "    let contents = std::fs::read_to_string(\"file.txt\");",
            "}",
        ],
    );
    assert_eq!(blocking_io_violations(&source).len(), 1);
}

#[test]
fn test_detector_allows_sync_config_read() {
    let source = file(
        "conductor/core/src/config.rs",
        &[
            "pub fn load_config_from_path(path: &Path) {",
            "    let contents = std::fs::read_to_string(path);",
            "}",
        ],
    );
    assert!(blocking_io_violations(&source).is_empty());
}

#[test]
fn test_detector_allows_stdout_in_surface_only() {
    let lines = [
        "async fn ask() {",
        "    let renderer = TerminalRenderer::new(std::io::stdout());",
        "}",
    ];
    assert!(blocking_io_violations(&file("surface/src/main.rs", &lines)).is_empty());
    assert_eq!(
        blocking_io_violations(&file("conductor/core/src/exchange.rs", &lines)).len(),
        1
    );
}
