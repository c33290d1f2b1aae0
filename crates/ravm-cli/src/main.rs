//! ravm CLI
//!
//! Command-line front end: assembles a program from a file or an inline
//! string, runs it (optionally under the interactive debugger), and reports
//! the final machine state.

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use ravm_asm::Assembler;
use ravm_vm::debug::{DebugOutcome, Debugger};
use ravm_vm::render::{self, Style, ValueStyle};
use ravm_vm::{Machine, RunOptions};
use std::process;

#[derive(Debug, Clone, Copy)]
struct CliOptions {
    debug: bool,
    json: bool,
    style: Style,
    max_steps: Option<u64>,
}

fn main() {
    let matches = Command::new("ravm")
        .version("0.1.0")
        .about("Assembler and virtual machine for register-transfer assembly")
        .arg(
            Arg::new("command")
                .short('c')
                .long("command")
                .value_name("STRING")
                .help("Assemble and run a program string")
                .num_args(1),
        )
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Assembly file to run")
                .index(1),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Run under the interactive debugger"),
        )
        .arg(
            Arg::new("unsigned")
                .short('u')
                .long("unsigned")
                .action(ArgAction::SetTrue)
                .help("Show words as unsigned integers"),
        )
        .arg(
            Arg::new("binary")
                .short('b')
                .long("binary")
                .action(ArgAction::SetTrue)
                .help("Show words in binary"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the final machine state as JSON"),
        )
        .arg(
            Arg::new("max-steps")
                .long("max-steps")
                .value_name("N")
                .value_parser(clap::value_parser!(u64))
                .help("Abort after N executed instructions"),
        )
        .get_matches();

    let values = if matches.get_flag("unsigned") {
        ValueStyle::Unsigned
    } else {
        ValueStyle::Signed
    };
    let opts = CliOptions {
        debug: matches.get_flag("debug"),
        json: matches.get_flag("json"),
        style: Style {
            values,
            binary: matches.get_flag("binary"),
        },
        max_steps: matches.get_one::<u64>("max-steps").copied(),
    };

    let result = if let Some(program) = matches.get_one::<String>("command") {
        run_string(program, "<command>", &opts)
    } else if let Some(file) = matches.get_one::<String>("file") {
        run_file(file, &opts)
    } else {
        eprintln!("ravm: no program given (expected FILE or -c STRING)");
        process::exit(2);
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn run_string(source: &str, filename: &str, opts: &CliOptions) -> Result<i32, anyhow::Error> {
    let assembler = Assembler::with_filename(source, filename)?;
    let assembly = assembler.assemble()?;

    let mut machine = Machine::from_assembly(&assembly);
    let run_opts = RunOptions {
        max_steps: opts.max_steps,
        style: opts.style,
    };

    if opts.debug {
        println!("\nAssembled Code:");
        print!("{}", render::listing(&assembly.instructions));

        let mut output = String::new();
        let mut debugger = Debugger::new();
        let outcome = debugger
            .run(&mut machine, &assembly.instructions, &run_opts, &mut output)
            .context("debugger I/O failed")?;
        if !output.is_empty() {
            print!("{output}");
        }
        if outcome == DebugOutcome::Quit {
            report_state(&machine, opts);
            return Ok(130);
        }
    } else {
        let summary = machine.run(&assembly.instructions, &run_opts)?;
        if !summary.output.is_empty() {
            print!("{}", summary.output);
        }
    }

    report_state(&machine, opts);
    Ok(0)
}

fn run_file(path: &str, opts: &CliOptions) -> Result<i32, anyhow::Error> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("cannot read '{path}'"))?;
    run_string(&source, path, opts)
}

fn report_state(machine: &Machine, opts: &CliOptions) {
    if opts.json {
        println!("{:#}", render::state_json(machine));
        return;
    }
    println!();
    print!("{}", render::registers(machine, opts.style));
    if !machine.memory.is_empty() {
        println!();
        print!("{}", render::memory(machine, opts.style));
    }
}
