//! E2E tests for CLI flag handling
//! Tests the entire application through the command-line interface

use std::process::Command;

const CLI_BINARY: &str = "target/debug/ravm-cli";

fn run_command(args: &[&str]) -> std::process::Output {
    Command::new(CLI_BINARY)
        .args(args)
        .output()
        .unwrap_or_else(|_| panic!("Failed to execute {}", CLI_BINARY))
}

fn run_program(program: &str) -> std::process::Output {
    run_command(&["-c", program])
}

#[test]
fn test_basic_run_dumps_registers() {
    let output = run_program("1: 5;\nADD 1, 6;");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Registers:"));
    assert!(stdout.contains("  1: 6"));
}

#[test]
fn test_memory_dump_only_when_populated() {
    let without = run_program("ADD 1, 6;");
    assert!(!String::from_utf8_lossy(&without.stdout).contains("Memory:"));

    let with = run_program("1: 100;\n2: 42;\nSW 1, 2;");
    let stdout = String::from_utf8_lossy(&with.stdout);
    assert!(stdout.contains("Memory:"));
    assert!(stdout.contains("[100]: 42"));
}

#[test]
fn test_signed_display_is_default() {
    let output = run_program("1: -1;");
    assert!(String::from_utf8_lossy(&output.stdout).contains("  1: -1"));
}

#[test]
fn test_unsigned_display() {
    let output = run_command(&["-u", "-c", "1: -1;"]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("  1: 4294967295"));
}

#[test]
fn test_binary_display() {
    let output = run_command(&["-b", "-c", "1: 5;"]);
    assert!(
        String::from_utf8_lossy(&output.stdout)
            .contains("  1: 0b00000000000000000000000000000101")
    );
}

#[test]
fn test_json_state() {
    let output = run_command(&["--json", "-c", "1: 5;"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"registers\""));
    assert!(stdout.contains("\"flags\""));
    assert!(!stdout.contains("Registers:"));
}

#[test]
fn test_syntax_error_exit_code() {
    let output = run_program("ADD 1, 2");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_SYNTAX"));
}

#[test]
fn test_unknown_operation_reported() {
    let output = run_program("FROB 1, 2;");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_UNKNOWN_OP"));
    assert!(stderr.contains("'FROB'"));
}

#[test]
fn test_undefined_label_reported() {
    let output = run_program("GO nowhere;");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_UNDEF_LABEL"));
}

#[test]
fn test_max_steps_guard() {
    let output = run_command(&["--max-steps", "100", "-c", "LBL loop;\nGO loop;"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_STEP_LIMIT"));
}

#[test]
fn test_no_program_given() {
    let output = run_command(&[]);
    assert!(!output.status.success());
}
