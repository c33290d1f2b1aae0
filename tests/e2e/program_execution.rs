//! E2E tests for assembly file execution
//! Tests running programs from files through the CLI binary

use std::fs;
use std::process::Command;
use tempfile::NamedTempFile;

const CLI_BINARY: &str = "target/debug/ravm-cli";

fn run_file(path: &str, extra_args: &[&str]) -> std::process::Output {
    Command::new(CLI_BINARY)
        .args(extra_args)
        .arg(path)
        .output()
        .unwrap_or_else(|_| panic!("Failed to execute {}", CLI_BINARY))
}

#[test]
fn test_program_file_execution() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(
        &temp_file,
        "# count down from three\n1: 3;\nLBL loop;\nADD 2, 6;\nADD 1, 7;\nSF 1;\nBIZ done;\nGO loop;\nLBL done;\n",
    )
    .unwrap();

    let output = run_file(temp_file.path().to_str().unwrap(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  1: 0"));
    assert!(stdout.contains("  2: 3"));
}

#[test]
fn test_print_instruction_output() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(&temp_file, "1: 9;\nPRINT;\n").unwrap();

    let output = run_file(temp_file.path().to_str().unwrap(), &[]);

    assert!(output.status.success());
    // One dump from PRINT plus the final state report.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Registers:").count(), 2);
}

#[test]
fn test_file_errors_name_the_file() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(&temp_file, "GO nowhere;").unwrap();

    let path = temp_file.path().to_str().unwrap().to_string();
    let output = run_file(&path, &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_UNDEF_LABEL"));
    assert!(stderr.contains(&path));
}

#[test]
fn test_missing_file() {
    let output = run_file("no_such_program.rasm", &[]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no_such_program.rasm"));
}

#[test]
fn test_memory_gap_markers() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(&temp_file, "[1]: 5;\n[4]: 7;\n").unwrap();

    let output = run_file(temp_file.path().to_str().unwrap(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[1]: 5"));
    assert!(stdout.contains("... 2 empty locations ..."));
    assert!(stdout.contains("[4]: 7"));
}
