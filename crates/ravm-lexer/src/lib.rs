//! Lexical analysis for ravm assembly source
//!
//! Tokenizes register-transfer assembly using logos. Comments (`#` to end
//! of line) and horizontal whitespace are skipped; newlines are kept
//! because the assembler is line-oriented.

use logos::Logos;
use ravm_ast::Span;

/// Assembly tokens
#[derive(Logos, Debug, PartialEq, Eq, Clone)]
pub enum Token {
    /// Mnemonic or label name
    #[regex(r"[_a-zA-Z][_a-zA-Z0-9]*")]
    Ident,

    /// Hexadecimal number literal - must come before Decimal so `0x1D`
    /// is not split at the `x`
    #[regex(r"0x[0-9a-fA-F]+", priority = 3)]
    Hex,

    /// Binary number literal
    #[regex(r"0b[01]+", priority = 3)]
    Binary,

    /// Decimal number literal, optionally negative
    #[regex(r"-?[0-9]+")]
    Decimal,

    /// Initializer separator (:)
    #[token(":")]
    Colon,

    /// Statement terminator (;)
    #[token(";")]
    Semicolon,

    /// Operand separator (,)
    #[token(",")]
    Comma,

    /// Memory address bracket ([)
    #[token("[")]
    LeftBracket,

    /// Memory address bracket (])
    #[token("]")]
    RightBracket,

    /// Newline ends a statement line
    #[token("\n")]
    Newline,

    /// Line comment (ignored)
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    /// Whitespace (ignored)
    #[regex(r"[ \t\r\f]+", logos::skip)]
    Whitespace,

    /// End of input
    Eof,

    /// Lexer error
    Error,
}

/// Token with location information
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    pub text: String,
}

/// Lexer that produces tokens with spans
pub struct Lexer<'input> {
    lexer: logos::Lexer<'input, Token>,
    input: &'input str,
}

impl<'input> Lexer<'input> {
    #[must_use]
    pub fn new(input: &'input str) -> Self {
        Self {
            lexer: Token::lexer(input),
            input,
        }
    }

    /// Get the next token with span information
    pub fn next_token(&mut self) -> SpannedToken {
        match self.lexer.next() {
            Some(Ok(token)) => {
                let span = self.lexer.span();
                let text = self.input[span.clone()].to_string();
                SpannedToken {
                    token,
                    span: Span::new(span.start, span.end),
                    text,
                }
            }
            Some(Err(())) => {
                let span = self.lexer.span();
                let text = self.input[span.clone()].to_string();
                SpannedToken {
                    token: Token::Error,
                    span: Span::new(span.start, span.end),
                    text,
                }
            }
            None => SpannedToken {
                token: Token::Eof,
                span: Span::new(self.input.len(), self.input.len()),
                text: String::new(),
            },
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Vec<SpannedToken> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.token == Token::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
