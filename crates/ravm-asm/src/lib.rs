//! Two-pass assembler for ravm assembly
//!
//! Pass one walks the token stream line by line, classifying each statement
//! as an initializer, a label definition, or an operation, and emits
//! pre-instructions whose jump targets may still be label names. Pass two
//! resolves those names to instruction indices.

use once_cell::sync::Lazy;
use ravm_ast::{Assembly, Instruction, RavmError, Reg, SourceMap, Span, Spanned};
use ravm_lexer::{Lexer, SpannedToken, Token};
use std::collections::HashMap;

/// Operand shape of a mnemonic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    /// `LBL name;`
    LabelDef,
    /// `GO|BIN|BIZ name;`
    Jump,
    /// `RD; WR; PRINT;`
    ZeroArg,
    /// `SA|RB|SB|SF reg;`
    OneReg,
    /// `ADD|AND|MV|NOT|RS|LS|SW reg, reg;`
    TwoReg,
}

static OP_TABLE: Lazy<HashMap<&'static str, OpKind>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("LBL", OpKind::LabelDef);
    map.insert("GO", OpKind::Jump);
    map.insert("BIN", OpKind::Jump);
    map.insert("BIZ", OpKind::Jump);
    map.insert("RD", OpKind::ZeroArg);
    map.insert("WR", OpKind::ZeroArg);
    map.insert("PRINT", OpKind::ZeroArg);
    map.insert("SA", OpKind::OneReg);
    map.insert("RB", OpKind::OneReg);
    map.insert("SB", OpKind::OneReg);
    map.insert("SF", OpKind::OneReg);
    map.insert("ADD", OpKind::TwoReg);
    map.insert("AND", OpKind::TwoReg);
    map.insert("MV", OpKind::TwoReg);
    map.insert("NOT", OpKind::TwoReg);
    map.insert("RS", OpKind::TwoReg);
    map.insert("LS", OpKind::TwoReg);
    map.insert("SW", OpKind::TwoReg);
    map
});

/// Instruction whose jump target is still a label name
#[derive(Debug)]
enum PreInstruction {
    Resolved(Instruction),
    Go(String),
    Bin(String),
    Biz(String),
}

/// Line-oriented assembler over a lexed token stream
pub struct Assembler {
    source_map: SourceMap,
    filename: String,
    tokens: Vec<SpannedToken>,
}

impl Assembler {
    /// Create an assembler for the given source
    ///
    /// # Errors
    ///
    /// Returns `RavmError` if the source contains unlexable characters
    pub fn new(input: &str) -> Result<Self, RavmError> {
        Self::with_filename(input, "<input>")
    }

    /// Create an assembler for the given source, naming it in diagnostics
    ///
    /// # Errors
    ///
    /// Returns `RavmError` if the source contains unlexable characters
    pub fn with_filename(input: &str, filename: &str) -> Result<Self, RavmError> {
        let source_map = SourceMap::new(input);

        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize();

        for token in &tokens {
            if token.token == Token::Error {
                return Err(RavmError::syntax(
                    format!("unexpected character '{}'", token.text),
                    token.span,
                    &source_map,
                    filename,
                ));
            }
        }

        Ok(Self {
            source_map,
            filename: filename.to_string(),
            tokens,
        })
    }

    /// Assemble the source into initializers and a resolved program
    ///
    /// # Errors
    ///
    /// Returns the first `RavmError` encountered: malformed statements,
    /// unknown operations, bad operands, or label problems
    pub fn assemble(&self) -> Result<Assembly, RavmError> {
        let mut assembly = Assembly::default();
        let mut pending: Vec<(PreInstruction, Span)> = Vec::new();
        let mut labels: HashMap<String, i64> = HashMap::new();

        for line in self.lines() {
            if line.is_empty() {
                continue;
            }
            let stmt = self.strip_terminator(&line)?;
            if stmt.is_empty() {
                return Err(self.syntax("empty statement before ';'", line[0].span));
            }
            if stmt.iter().any(|t| t.token == Token::Colon) {
                self.parse_initializer(stmt, &mut assembly)?;
            } else {
                self.parse_operation(stmt, &mut pending, &mut labels)?;
            }
        }

        for (pre, span) in pending {
            let instruction = match pre {
                PreInstruction::Resolved(op) => op,
                PreInstruction::Go(label) => Instruction::Go(self.lookup(&labels, &label, span)?),
                PreInstruction::Bin(label) => Instruction::Bin(self.lookup(&labels, &label, span)?),
                PreInstruction::Biz(label) => Instruction::Biz(self.lookup(&labels, &label, span)?),
            };
            assembly.instructions.push(Spanned::new(instruction, span));
        }

        Ok(assembly)
    }

    /// Statement lines: the token stream split at newlines, EOF dropped
    fn lines(&self) -> Vec<Vec<SpannedToken>> {
        self.tokens
            .split(|t| t.token == Token::Newline)
            .map(|line| {
                line.iter()
                    .filter(|t| t.token != Token::Eof)
                    .cloned()
                    .collect()
            })
            .collect()
    }

    /// Every statement ends with `;` and nothing may follow it on the line
    fn strip_terminator<'a>(
        &self,
        line: &'a [SpannedToken],
    ) -> Result<&'a [SpannedToken], RavmError> {
        match line.iter().position(|t| t.token == Token::Semicolon) {
            None => {
                let last = &line[line.len() - 1];
                Err(self.syntax("missing ';'", last.span))
            }
            Some(i) if i + 1 < line.len() => Err(self.syntax(
                format!("unexpected input after ';' - '{}'", line[i + 1].text),
                line[i + 1].span,
            )),
            Some(i) => Ok(&line[..i]),
        }
    }

    fn parse_initializer(
        &self,
        stmt: &[SpannedToken],
        assembly: &mut Assembly,
    ) -> Result<(), RavmError> {
        match stmt {
            [loc, colon, value] if colon.token == Token::Colon => {
                let Some(reg) = register_digit(&loc.text) else {
                    return Err(self.syntax(
                        format!("invalid register in register initializer - '{}'", loc.text),
                        loc.span,
                    ));
                };
                let value = self.parse_number(value)?;
                assembly.reg_inits.push((reg, value));
                Ok(())
            }
            [open, addr, close, colon, value]
                if open.token == Token::LeftBracket
                    && close.token == Token::RightBracket
                    && colon.token == Token::Colon =>
            {
                let addr = self.parse_number(addr)?;
                let value = self.parse_number(value)?;
                assembly.mem_inits.push((addr, value));
                Ok(())
            }
            _ => Err(self.syntax(
                "invalid syntax for register/memory initializer",
                stmt[0].span,
            )),
        }
    }

    fn parse_operation(
        &self,
        stmt: &[SpannedToken],
        pending: &mut Vec<(PreInstruction, Span)>,
        labels: &mut HashMap<String, i64>,
    ) -> Result<(), RavmError> {
        let head = &stmt[0];
        if head.token != Token::Ident {
            return Err(self.syntax(
                format!("expected an operation, found '{}'", head.text),
                head.span,
            ));
        }
        let mnemonic = head.text.to_uppercase();
        let Some(&kind) = OP_TABLE.get(mnemonic.as_str()) else {
            return Err(RavmError::unknown_op(
                head.text.clone(),
                head.span,
                &self.source_map,
                &self.filename,
            ));
        };

        let operands = &stmt[1..];
        let span = Span::new(head.span.start, stmt[stmt.len() - 1].span.end);

        match kind {
            OpKind::LabelDef => {
                let label = self.expect_label(&mnemonic, operands, span)?;
                if labels.contains_key(&label) {
                    return Err(RavmError::duplicate_label(
                        label,
                        span,
                        &self.source_map,
                        &self.filename,
                    ));
                }
                // Targets point one before the labeled instruction; the run
                // loop's post-increment lands on it.
                labels.insert(label, pending.len() as i64 - 1);
            }
            OpKind::Jump => {
                let label = self.expect_label(&mnemonic, operands, span)?;
                let pre = match mnemonic.as_str() {
                    "GO" => PreInstruction::Go(label),
                    "BIN" => PreInstruction::Bin(label),
                    "BIZ" => PreInstruction::Biz(label),
                    _ => unreachable!(),
                };
                pending.push((pre, span));
            }
            OpKind::ZeroArg => {
                if !operands.is_empty() {
                    return Err(self.arity(&mnemonic, "no arguments", span));
                }
                let op = match mnemonic.as_str() {
                    "RD" => Instruction::Rd,
                    "WR" => Instruction::Wr,
                    "PRINT" => Instruction::Print,
                    _ => unreachable!(),
                };
                pending.push((PreInstruction::Resolved(op), span));
            }
            OpKind::OneReg => {
                let [operand] = operands else {
                    return Err(self.arity(&mnemonic, "1 register", span));
                };
                let reg = self.expect_register(operand)?;
                let op = match mnemonic.as_str() {
                    "SA" => Instruction::Sa(reg),
                    "RB" => Instruction::Rb(reg),
                    "SB" => Instruction::Sb(reg),
                    "SF" => Instruction::Sf(reg),
                    _ => unreachable!(),
                };
                pending.push((PreInstruction::Resolved(op), span));
            }
            OpKind::TwoReg => {
                let [first, comma, second] = operands else {
                    return Err(self.arity(&mnemonic, "2 registers", span));
                };
                if comma.token != Token::Comma {
                    return Err(self.syntax(
                        format!("expected ',' between registers, found '{}'", comma.text),
                        comma.span,
                    ));
                }
                let a = self.expect_register(first)?;
                let b = self.expect_register(second)?;
                let op = match mnemonic.as_str() {
                    "ADD" => Instruction::Add(a, b),
                    "AND" => Instruction::And(a, b),
                    "MV" => Instruction::Mv(a, b),
                    "NOT" => Instruction::Not(a, b),
                    "RS" => Instruction::Rs(a, b),
                    "LS" => Instruction::Ls(a, b),
                    "SW" => Instruction::Sw(a, b),
                    _ => unreachable!(),
                };
                pending.push((PreInstruction::Resolved(op), span));
            }
        }
        Ok(())
    }

    fn expect_label(
        &self,
        mnemonic: &str,
        operands: &[SpannedToken],
        span: Span,
    ) -> Result<String, RavmError> {
        match operands {
            [name] if name.token == Token::Ident => Ok(name.text.clone()),
            [name] => Err(self.syntax(
                format!("label name is not a valid identifier - '{}'", name.text),
                name.span,
            )),
            _ => Err(self.arity(mnemonic, "1 label", span)),
        }
    }

    fn expect_register(&self, token: &SpannedToken) -> Result<Reg, RavmError> {
        register_digit(&token.text).ok_or_else(|| {
            self.syntax(
                format!("invalid register specifier '{}'", token.text),
                token.span,
            )
        })
    }

    fn parse_number(&self, token: &SpannedToken) -> Result<i64, RavmError> {
        let parsed = match token.token {
            Token::Hex => i64::from_str_radix(&token.text[2..], 16).map_err(|_| "hexadecimal"),
            Token::Binary => i64::from_str_radix(&token.text[2..], 2).map_err(|_| "binary"),
            Token::Decimal => token.text.parse::<i64>().map_err(|_| "decimal"),
            _ => Err("number"),
        };
        parsed.map_err(|kind| {
            self.syntax(
                format!("invalid {kind} literal - '{}'", token.text),
                token.span,
            )
        })
    }

    fn lookup(
        &self,
        labels: &HashMap<String, i64>,
        label: &str,
        span: Span,
    ) -> Result<i64, RavmError> {
        labels.get(label).copied().ok_or_else(|| {
            RavmError::undefined_label(label.to_string(), span, &self.source_map, &self.filename)
        })
    }

    fn syntax(&self, message: impl Into<String>, span: Span) -> RavmError {
        RavmError::syntax(message.into(), span, &self.source_map, &self.filename)
    }

    fn arity(&self, mnemonic: &str, expected: &str, span: Span) -> RavmError {
        self.syntax(
            format!("wrong arguments for {mnemonic} operation (expected {expected})"),
            span,
        )
    }
}

/// A register operand is a single hex digit
fn register_digit(text: &str) -> Option<Reg> {
    if text.len() != 1 {
        return None;
    }
    Reg::from_str_radix(text, 16).ok()
}
