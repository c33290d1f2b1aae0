//! Textual and JSON rendering of machine state

use crate::Machine;
use ravm_ast::{Instruction, SIGN_BIT, Spanned, WORD_MASK};
use std::fmt::Write;

/// How register and memory words are displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueStyle {
    /// 32-bit two's complement
    #[default]
    Signed,
    /// Raw masked value
    Unsigned,
}

/// Display settings shared by all dumps
#[derive(Debug, Clone, Copy, Default)]
pub struct Style {
    pub values: ValueStyle,
    pub binary: bool,
}

/// Interpret a masked word as 32-bit two's complement
#[must_use]
pub const fn as_signed(word: i64) -> i64 {
    if word & SIGN_BIT == 0 {
        word
    } else {
        word - (WORD_MASK + 1)
    }
}

/// Render a single word in the given style
#[must_use]
pub fn word(value: i64, style: Style) -> String {
    if style.binary {
        return format!("0b{:032b}", value & WORD_MASK);
    }
    match style.values {
        ValueStyle::Signed => as_signed(value).to_string(),
        ValueStyle::Unsigned => value.to_string(),
    }
}

/// Register dump, one `X: value` line per register
#[must_use]
pub fn registers(machine: &Machine, style: Style) -> String {
    let mut out = String::from("Registers:\n");
    for (i, value) in machine.registers.iter().enumerate() {
        let _ = writeln!(out, "  {i:X}: {}", word(*value, style));
    }
    out
}

/// Memory dump in address order, compressing runs of unset cells
#[must_use]
pub fn memory(machine: &Machine, style: Style) -> String {
    let mut out = String::from("Memory:\n");
    let mut last: Option<i64> = None;
    for (&addr, &value) in &machine.memory {
        if let Some(prev) = last {
            if addr - prev > 1 {
                let _ = writeln!(out, "  ... {} empty locations ...", addr - prev - 1);
            }
        }
        let _ = writeln!(out, "  [{addr}]: {}", word(value, style));
        last = Some(addr);
    }
    out
}

/// Assembled code listing, one instruction per line
#[must_use]
pub fn listing(code: &[Spanned<Instruction>]) -> String {
    let mut out = String::new();
    for (i, op) in code.iter().enumerate() {
        let _ = writeln!(out, "{i:>4}: {}", op.node);
    }
    out
}

/// Machine state as a JSON document
#[must_use]
pub fn state_json(machine: &Machine) -> serde_json::Value {
    let memory: serde_json::Map<String, serde_json::Value> = machine
        .memory
        .iter()
        .map(|(addr, value)| (addr.to_string(), serde_json::Value::from(*value)))
        .collect();

    serde_json::json!({
        "registers": machine.registers.to_vec(),
        "mar": machine.mar,
        "mbr": machine.mbr,
        "flags": { "n": machine.flag_n, "z": machine.flag_z },
        "memory": memory,
    })
}
