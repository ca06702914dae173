//! CLI integration tests

use std::process::Command;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "podpulse", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("saturation"),
        "Should show app description"
    );
    assert!(stdout.contains("--namespace"), "Should show namespace flag");
    assert!(
        stdout.contains("--label-selector"),
        "Should show label selector flag"
    );
    assert!(
        stdout.contains("--deployment-name"),
        "Should show deployment flag"
    );
    assert!(stdout.contains("--interval"), "Should show interval flag");
    assert!(stdout.contains("--duration"), "Should show duration flag");
    assert!(stdout.contains("--format"), "Should show format flag");
    assert!(stdout.contains("ndjson"), "Should list ndjson format");
    assert!(stdout.contains("csv"), "Should list csv format");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "podpulse", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("podpulse"), "Should show binary name");
}

/// Test that an unknown format is rejected
#[test]
fn test_cli_rejects_unknown_format() {
    let output = Command::new("cargo")
        .args(["run", "-p", "podpulse", "--", "--format", "xml"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Unknown format should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid value") || stderr.contains("possible values"),
        "Should explain the valid formats"
    );
}
