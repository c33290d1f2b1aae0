//! Shared definitions for the ravm toolchain
//!
//! Spans, source mapping, the instruction set, and the error type used by
//! every stage of the pipeline.

use std::fmt;

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 16;

/// Machine words are 32 bits, stored masked inside a host `i64`.
pub const WORD_MASK: i64 = 0xFFFF_FFFF;

/// Sign bit of a machine word.
pub const SIGN_BIT: i64 = 0x8000_0000;

/// A register index, always in `0..=15`.
pub type Reg = u8;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }
}

/// Line and column position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Convert byte spans to line/column positions
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(pos + 1);
            }
        }
        Self { line_starts }
    }

    #[must_use]
    pub fn position(&self, byte_offset: usize) -> Position {
        match self.line_starts.binary_search(&byte_offset) {
            Ok(line) => Position::new(line + 1, 1),
            Err(line) => {
                let line_start = self.line_starts[line - 1];
                Position::new(line, byte_offset - line_start + 1)
            }
        }
    }
}

/// Node with location information
#[derive(Debug, Clone, Copy)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    #[must_use]
    pub const fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A machine instruction with jump targets resolved to instruction indices.
///
/// Jump targets store the index of the instruction *before* the labeled one:
/// the run loop increments the program counter after every instruction, which
/// lands execution on the labeled instruction itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// MAR <- R[r]
    Sa(Reg),
    /// R[r] <- MAR
    Rb(Reg),
    /// MBR <- mem[MAR], 0 when the cell is unset
    Rd,
    /// mem[MAR] <- MBR
    Wr,
    /// MBR <- R[r]
    Sb(Reg),
    /// Z <- R[r] == 0; N <- sign bit of R[r] clear
    Sf(Reg),
    /// pc <- t
    Go(i64),
    /// pc <- t when N is set
    Bin(i64),
    /// pc <- t when Z is set
    Biz(i64),
    /// R[a] <- R[a] + R[b]
    Add(Reg, Reg),
    /// R[a] <- R[a] & R[b]
    And(Reg, Reg),
    /// R[a] <- R[b]
    Mv(Reg, Reg),
    /// R[a] <- !R[b]
    Not(Reg, Reg),
    /// R[a] <- R[b] << 1
    Ls(Reg, Reg),
    /// R[a] <- R[b] >> 1
    Rs(Reg, Reg),
    /// mem[R[a]] <- R[b], latching MAR and MBR
    Sw(Reg, Reg),
    /// Append a register dump to the program output
    Print,
}

impl fmt::Display for Instruction {
    /// Jump targets are shown as the landing index, not the stored offset.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sa(r) => write!(f, "SA {r:X}"),
            Self::Rb(r) => write!(f, "RB {r:X}"),
            Self::Rd => write!(f, "RD"),
            Self::Wr => write!(f, "WR"),
            Self::Sb(r) => write!(f, "SB {r:X}"),
            Self::Sf(r) => write!(f, "SF {r:X}"),
            Self::Go(t) => write!(f, "GO {:X}", t + 1),
            Self::Bin(t) => write!(f, "BIN {:X}", t + 1),
            Self::Biz(t) => write!(f, "BIZ {:X}", t + 1),
            Self::Add(a, b) => write!(f, "ADD {a:X}, {b:X}"),
            Self::And(a, b) => write!(f, "AND {a:X}, {b:X}"),
            Self::Mv(a, b) => write!(f, "MV {a:X}, {b:X}"),
            Self::Not(a, b) => write!(f, "NOT {a:X}, {b:X}"),
            Self::Ls(a, b) => write!(f, "LS {a:X}, {b:X}"),
            Self::Rs(a, b) => write!(f, "RS {a:X}, {b:X}"),
            Self::Sw(a, b) => write!(f, "SW {a:X}, {b:X}"),
            Self::Print => write!(f, "PRINT"),
        }
    }
}

/// The output of a successful assembly
#[derive(Debug, Default)]
pub struct Assembly {
    /// Register initializers in source order, applied before execution
    pub reg_inits: Vec<(Reg, i64)>,
    /// Memory initializers in source order
    pub mem_inits: Vec<(i64, i64)>,
    /// The resolved program
    pub instructions: Vec<Spanned<Instruction>>,
}

/// Error types with location information
#[derive(thiserror::Error, Debug)]
pub enum RavmError {
    #[error("ravm:{filename}:{line}:{column}: ERR_SYNTAX: {message}")]
    Syntax {
        message: String,
        span: Span,
        filename: String,
        line: usize,
        column: usize,
    },

    #[error("ravm:{filename}:{line}:{column}: ERR_UNKNOWN_OP: unknown operation '{op}'")]
    UnknownOp {
        op: String,
        span: Span,
        filename: String,
        line: usize,
        column: usize,
    },

    #[error("ravm:{filename}:{line}:{column}: ERR_DUP_LABEL: label '{label}' already defined")]
    DuplicateLabel {
        label: String,
        span: Span,
        filename: String,
        line: usize,
        column: usize,
    },

    #[error("ravm:{filename}:{line}:{column}: ERR_UNDEF_LABEL: undefined label reference '{label}'")]
    UndefinedLabel {
        label: String,
        span: Span,
        filename: String,
        line: usize,
        column: usize,
    },

    #[error("ravm: ERR_STEP_LIMIT: exceeded {limit} steps at instruction {index}")]
    StepLimit { limit: u64, index: i64 },
}

impl RavmError {
    #[must_use]
    pub fn syntax(message: String, span: Span, source_map: &SourceMap, filename: &str) -> Self {
        let pos = source_map.position(span.start);
        Self::Syntax {
            message,
            span,
            filename: filename.to_string(),
            line: pos.line,
            column: pos.column,
        }
    }

    #[must_use]
    pub fn unknown_op(op: String, span: Span, source_map: &SourceMap, filename: &str) -> Self {
        let pos = source_map.position(span.start);
        Self::UnknownOp {
            op,
            span,
            filename: filename.to_string(),
            line: pos.line,
            column: pos.column,
        }
    }

    #[must_use]
    pub fn duplicate_label(
        label: String,
        span: Span,
        source_map: &SourceMap,
        filename: &str,
    ) -> Self {
        let pos = source_map.position(span.start);
        Self::DuplicateLabel {
            label,
            span,
            filename: filename.to_string(),
            line: pos.line,
            column: pos.column,
        }
    }

    #[must_use]
    pub fn undefined_label(
        label: String,
        span: Span,
        source_map: &SourceMap,
        filename: &str,
    ) -> Self {
        let pos = source_map.position(span.start);
        Self::UndefinedLabel {
            label,
            span,
            filename: filename.to_string(),
            line: pos.line,
            column: pos.column,
        }
    }

    /// The source span this error points at, when it has one.
    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::Syntax { span, .. }
            | Self::UnknownOp { span, .. }
            | Self::DuplicateLabel { span, .. }
            | Self::UndefinedLabel { span, .. } => Some(*span),
            Self::StepLimit { .. } => None,
        }
    }
}
