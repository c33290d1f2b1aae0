//! Interactive single-step debugger
//!
//! Drives the same step function as a normal run, pausing before each
//! instruction for a command: `n` steps (the default on an empty line),
//! `b` toggles a breakpoint at the current instruction, `c` toggles
//! run-to-breakpoint mode, `r` finishes the program without further
//! prompts, `q` aborts the session. The transcript between pauses is
//! erased with ANSI line clearing so the register view stays in place.

use crate::{Machine, RunOptions, render};
use ravm_ast::{Instruction, Spanned};
use std::collections::HashSet;
use std::io::{self, BufRead, Write, stdin, stdout};

/// Outcome of a debugging session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugOutcome {
    /// Program ran to completion
    Finished,
    /// Session ended early with `q`
    Quit,
}

enum Command {
    Step,
    Continue,
    Run,
    Quit,
}

fn clear_lines(count: usize) -> io::Result<()> {
    let mut stdout = stdout();
    for i in 0..count {
        write!(
            stdout,
            "\u{001B}[2K{}",
            if i < count - 1 { "\u{001B}[1A" } else { "" }
        )?;
    }
    if count > 0 {
        write!(stdout, "\u{001B}[G")?;
    }
    stdout.flush()
}

/// Interactive stepper around a [`Machine`]
pub struct Debugger {
    breakpoints: HashSet<i64>,
    to_breakpoint: bool,
    prompting: bool,
    linecount: usize,
}

impl Debugger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            breakpoints: HashSet::new(),
            to_breakpoint: false,
            prompting: true,
            linecount: 0,
        }
    }

    /// Run the program under the debugger
    ///
    /// # Errors
    ///
    /// Returns `io::Error` when terminal I/O fails
    pub fn run(
        &mut self,
        machine: &mut Machine,
        code: &[Spanned<Instruction>],
        opts: &RunOptions,
        output: &mut String,
    ) -> io::Result<DebugOutcome> {
        while machine.pc() >= 0 && (machine.pc() as usize) < code.len() {
            self.linecount = 0;
            let op = code[machine.pc() as usize].node;
            let on_breakpoint = self.breakpoints.contains(&machine.pc());

            if self.prompting && (!self.to_breakpoint || on_breakpoint) {
                self.show_state(machine, op, on_breakpoint, opts)?;
                match self.prompt(machine.pc())? {
                    Command::Step => {}
                    Command::Continue => self.to_breakpoint = !self.to_breakpoint,
                    Command::Run => self.prompting = false,
                    Command::Quit => return Ok(DebugOutcome::Quit),
                }
                clear_lines(self.linecount + 1)?;
            }

            machine.step(op, opts, output);
            machine.registers[0] += 1;
        }
        println!();
        Ok(DebugOutcome::Finished)
    }

    fn show_state(
        &mut self,
        machine: &Machine,
        op: Instruction,
        on_breakpoint: bool,
        opts: &RunOptions,
    ) -> io::Result<()> {
        let mut stdout = stdout();

        let dump = render::registers(machine, opts.style);
        write!(stdout, "\n{dump}")?;
        self.linecount += dump.lines().count() + 1;

        writeln!(stdout, "Flags:")?;
        writeln!(stdout, "  N: {}", machine.flag_n)?;
        writeln!(stdout, "  Z: {}", machine.flag_z)?;
        writeln!(stdout)?;
        self.linecount += 4;

        if self.to_breakpoint {
            writeln!(stdout, "Continue till Breakpoint")?;
            self.linecount += 1;
        }
        if on_breakpoint {
            writeln!(stdout, "BREAKPOINT")?;
            self.linecount += 1;
        }
        writeln!(stdout, "Operation: {op}")?;
        self.linecount += 1;
        stdout.flush()
    }

    fn prompt(&mut self, pc: i64) -> io::Result<Command> {
        loop {
            print!("Debug (n,b,c,r,q): ");
            stdout().flush()?;

            let mut line = String::new();
            stdin().lock().read_line(&mut line)?;
            self.linecount += 1;

            let choice = line
                .trim()
                .chars()
                .next()
                .map_or('n', |c| c.to_ascii_lowercase());
            match choice {
                'n' => return Ok(Command::Step),
                'b' => {
                    if self.breakpoints.remove(&pc) {
                        println!("Turning Breakpoint OFF");
                    } else {
                        self.breakpoints.insert(pc);
                        println!("Turning Breakpoint ON");
                    }
                    self.linecount += 1;
                }
                'c' => return Ok(Command::Continue),
                'r' => return Ok(Command::Run),
                'q' => return Ok(Command::Quit),
                other => {
                    println!("unknown command '{other}'");
                    self.linecount += 1;
                }
            }
        }
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new()
    }
}
