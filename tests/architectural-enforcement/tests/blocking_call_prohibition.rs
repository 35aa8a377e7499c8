//! Integration Test: Blocking Call Prohibition
//!
//! Animation pacing and network waits must go through tokio. A blocking
//! sleep or a blocking HTTP client stalls every task on the worker thread,
//! which freezes the typewriter and the event loop together.

use architectural_enforcement::find_violations;

#[test]
fn test_no_blocking_sleep_in_production_code() {
    let violations = find_violations(&["std::thread::sleep", "thread::sleep("]);

    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use tokio::time::sleep or animation::pause instead");
        panic!("Found {} blocking sleep call(s)", violations.len());
    }
}

#[test]
fn test_no_blocking_http_client() {
    let violations = find_violations(&["reqwest::blocking"]);

    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        panic!("Found {} blocking HTTP call(s)", violations.len());
    }
}

#[test]
fn test_no_blocking_process_spawn() {
    let violations = find_violations(&["std::process::Command"]);

    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use tokio::process::Command");
        panic!("Found {} blocking process call(s)", violations.len());
    }
}
