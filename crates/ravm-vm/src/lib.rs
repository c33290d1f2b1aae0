//! The ravm virtual machine
//!
//! Sixteen 32-bit registers, MAR/MBR memory latches, N/Z condition flags,
//! and a sparse word-addressed memory. Register 0 is the program counter.

pub mod debug;
pub mod render;

use ravm_ast::{Assembly, Instruction, RavmError, REGISTER_COUNT, Reg, SIGN_BIT, Spanned, WORD_MASK};
use std::collections::BTreeMap;

/// Execution switches for a run
#[derive(Debug, Default, Clone, Copy)]
pub struct RunOptions {
    /// Abort with an error after this many executed instructions
    pub max_steps: Option<u64>,
    /// How PRINT dumps render words
    pub style: render::Style,
}

/// What a finished run produced
#[derive(Debug)]
pub struct RunSummary {
    /// Number of instructions executed
    pub steps: u64,
    /// Output accumulated by PRINT instructions
    pub output: String,
}

/// Machine state
#[derive(Debug)]
pub struct Machine {
    /// General-purpose registers; register 0 is the program counter
    pub registers: [i64; REGISTER_COUNT],
    /// Sparse word-addressed memory, masked values
    pub memory: BTreeMap<i64, i64>,
    /// Memory address register
    pub mar: i64,
    /// Memory buffer register
    pub mbr: i64,
    /// Set by SF when the sign bit of the tested register is clear
    pub flag_n: bool,
    /// Set by SF when the tested register is zero
    pub flag_z: bool,
}

impl Machine {
    /// Build a machine from initializers. User values are masked; pinned
    /// registers win over user initializers: R0 = 0, R5 = 0, R6 = 1,
    /// R7 = all ones.
    #[must_use]
    pub fn new(reg_inits: &[(Reg, i64)], mem_inits: &[(i64, i64)]) -> Self {
        let mut machine = Self {
            registers: [0; REGISTER_COUNT],
            memory: BTreeMap::new(),
            mar: 0,
            mbr: 0,
            flag_n: false,
            flag_z: false,
        };

        for &(reg, value) in reg_inits {
            machine.registers[reg as usize] = value & WORD_MASK;
        }

        machine.registers[0] = 0;
        machine.registers[5] = 0;
        machine.registers[6] = 1;
        machine.registers[7] = WORD_MASK;

        for &(addr, value) in mem_inits {
            machine.memory.insert(addr, value & WORD_MASK);
        }

        machine
    }

    #[must_use]
    pub fn from_assembly(assembly: &Assembly) -> Self {
        Self::new(&assembly.reg_inits, &assembly.mem_inits)
    }

    #[must_use]
    pub const fn pc(&self) -> i64 {
        self.registers[0]
    }

    fn reg(&self, reg: Reg) -> i64 {
        self.registers[reg as usize]
    }

    fn set_reg(&mut self, reg: Reg, value: i64) {
        self.registers[reg as usize] = value & WORD_MASK;
    }

    /// Execute a single instruction. The program counter is not advanced
    /// here; the run loop increments it after every step.
    pub fn step(&mut self, instruction: Instruction, opts: &RunOptions, output: &mut String) {
        match instruction {
            Instruction::Sa(r) => self.mar = self.reg(r),
            Instruction::Rb(r) => self.set_reg(r, self.mar),
            Instruction::Rd => self.mbr = self.memory.get(&self.mar).copied().unwrap_or(0),
            Instruction::Wr => {
                self.memory.insert(self.mar, self.mbr & WORD_MASK);
            }
            Instruction::Sb(r) => self.mbr = self.reg(r),
            Instruction::Sf(r) => {
                self.flag_z = self.reg(r) == 0;
                // N is set when the sign bit is CLEAR.
                self.flag_n = self.reg(r) & SIGN_BIT == 0;
            }
            Instruction::Go(t) => self.registers[0] = t,
            Instruction::Bin(t) => {
                if self.flag_n {
                    self.registers[0] = t;
                }
            }
            Instruction::Biz(t) => {
                if self.flag_z {
                    self.registers[0] = t;
                }
            }
            Instruction::Add(a, b) => self.set_reg(a, self.reg(a) + self.reg(b)),
            Instruction::And(a, b) => self.set_reg(a, self.reg(a) & self.reg(b)),
            Instruction::Mv(a, b) => self.set_reg(a, self.reg(b)),
            Instruction::Not(a, b) => self.set_reg(a, !self.reg(b)),
            Instruction::Ls(a, b) => self.set_reg(a, self.reg(b) << 1),
            Instruction::Rs(a, b) => self.set_reg(a, self.reg(b) >> 1),
            Instruction::Sw(a, b) => {
                self.mar = self.reg(a);
                self.mbr = self.reg(b);
                self.memory.insert(self.mar, self.mbr);
            }
            Instruction::Print => output.push_str(&render::registers(self, opts.style)),
        }
    }

    /// Run the program to completion
    ///
    /// # Errors
    ///
    /// Returns `RavmError::StepLimit` when `opts.max_steps` is exceeded
    pub fn run(
        &mut self,
        code: &[Spanned<Instruction>],
        opts: &RunOptions,
    ) -> Result<RunSummary, RavmError> {
        let mut summary = RunSummary {
            steps: 0,
            output: String::new(),
        };

        while self.pc() >= 0 && (self.pc() as usize) < code.len() {
            if let Some(limit) = opts.max_steps {
                if summary.steps >= limit {
                    return Err(RavmError::StepLimit {
                        limit,
                        index: self.pc(),
                    });
                }
            }
            let op = code[self.pc() as usize].node;
            self.step(op, opts, &mut summary.output);
            self.registers[0] += 1;
            summary.steps += 1;
        }

        Ok(summary)
    }
}
