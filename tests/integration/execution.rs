//! Integration tests for the assembler + VM pipeline
//! Tests that assembled programs run with the expected machine state

use ravm_asm::Assembler;
use ravm_vm::{Machine, RunOptions};

fn run(source: &str) -> Machine {
    let assembly = Assembler::new(source).unwrap().assemble().unwrap();
    let mut machine = Machine::from_assembly(&assembly);
    machine
        .run(&assembly.instructions, &RunOptions::default())
        .unwrap();
    machine
}

#[test]
fn test_arithmetic_program() {
    let machine = run("1: 10;\n2: 20;\nADD 1, 2;");
    assert_eq!(machine.registers[1], 30);
}

#[test]
fn test_jump_skips_instruction() {
    let machine = run("1: 5;\nGO end;\nADD 1, 1;\nLBL end;\nADD 1, 6;");
    assert_eq!(machine.registers[1], 6);
}

#[test]
fn test_countdown_loop() {
    // R6 is pinned to 1 and R7 to all ones, so ADD r,6 increments and
    // ADD r,7 decrements modulo 2^32.
    let source = "\
1: 3;
LBL loop;
ADD 2, 6;
ADD 1, 7;
SF 1;
BIZ done;
GO loop;
LBL done;
";
    let machine = run(source);
    assert_eq!(machine.registers[1], 0);
    assert_eq!(machine.registers[2], 3);
}

#[test]
fn test_memory_store_and_dump_state() {
    let machine = run("1: 100;\n2: 42;\nSW 1, 2;");
    assert_eq!(machine.memory[&100], 42);
    assert_eq!(machine.mar, 100);
    assert_eq!(machine.mbr, 42);
}

#[test]
fn test_memory_initializer_read() {
    let machine = run("[50]: 7;\n1: 50;\nSA 1;\nRD;");
    assert_eq!(machine.mbr, 7);
}

#[test]
fn test_print_collects_output() {
    let source = "1: 9;\nPRINT;";
    let assembly = Assembler::new(source).unwrap().assemble().unwrap();
    let mut machine = Machine::from_assembly(&assembly);
    let summary = machine
        .run(&assembly.instructions, &RunOptions::default())
        .unwrap();

    assert!(summary.output.contains("Registers:"));
    assert!(summary.output.contains("  1: 9"));
}

#[test]
fn test_step_limit_stops_infinite_loop() {
    let assembly = Assembler::new("LBL loop;\nGO loop;")
        .unwrap()
        .assemble()
        .unwrap();
    let mut machine = Machine::from_assembly(&assembly);
    let opts = RunOptions {
        max_steps: Some(100),
        ..RunOptions::default()
    };

    let err = machine.run(&assembly.instructions, &opts).unwrap_err();
    assert!(format!("{err}").contains("ERR_STEP_LIMIT"));
}

#[test]
fn test_negative_initializer_wraps() {
    let machine = run("1: -1;\nADD 1, 6;");
    assert_eq!(machine.registers[1], 0);
}
