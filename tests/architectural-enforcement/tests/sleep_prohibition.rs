//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. The client only
//! ever waits on I/O: the response body, stdin, or a signal.
//! **Exceptions**: test code.

use architectural_enforcement::{production_sources, SourceFile};

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations: Vec<String> = production_sources()
        .iter()
        .flat_map(sleep_violations)
        .collect();

    if !violations.is_empty() {
        eprintln!("\n❌ Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Wait on the stream, the channel, or the signal instead.");
        eprintln!("✅ Timeouts belong in the HTTP client configuration.");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}

fn sleep_violations(file: &SourceFile) -> Vec<String> {
    (0..file.lines.len())
        .filter(|&idx| {
            let code = file.code(idx);
            (code.contains("::sleep(") || code.contains(".sleep(")) && !file.in_test_code(idx)
        })
        .map(|idx| file.violation(idx, "sleep"))
        .collect()
}

#[test]
fn test_detector_flags_sleep() {
    let file = SourceFile {
        path: "conductor/core/src/example.rs".into(),
        lines: vec![
            "async fn poll() {".to_string(),
            "    tokio::time::sleep(Duration::from_millis(10)).await;".to_string(),
            "    // std::thread::sleep(d) in a comment is fine".to_string(),
            "}".to_string(),
        ],
    };
    let violations = sleep_violations(&file);
    assert_eq!(violations.len(), 1);
    assert!(violations[0].starts_with("conductor/core/src/example.rs:2"));
}
