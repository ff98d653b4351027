//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing
//! infrastructure, including error types, helper methods, and the main
//! parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following
//! organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: Parsing enum, record, typedef, and forward declarations
//! - `declarators`: Parsing the declarator sub-grammar (pointers, arrays,
//!   member pointers, function pointers)
//!
//! Constant expressions inside declarations (enumerator values, array
//! lengths, bit-field widths) are collected as token spans and handed to the
//! evaluator; each evaluated enumerator is registered in the parser's symbol
//! table so later expressions can reference it.
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser`
//! blocks, allowing each module to extend the Parser with related
//! functionality while maintaining access to the shared parser state.
//!
//! Any grammar mismatch fails with [`DeclarationSyntaxError`] carrying the
//! source offset and expected/found token descriptions; there is no error
//! recovery and no partial result for a malformed declaration.

use crate::eval::{
    evaluate, ConstantValue, DivisionByZeroError, EvalError, SymbolTable,
    UndefinedIdentifierError,
};
use crate::parser::ast::{ParsedDecl, SourceLocation};
use crate::parser::lexer::{LexError, Lexer, Token};
use tracing::trace;

/// Error for any declaration grammar mismatch
#[derive(Debug, Clone, thiserror::Error)]
#[error("syntax error at {location}: expected {expected}, found {found}")]
pub struct DeclarationSyntaxError {
    pub location: SourceLocation,
    pub expected: String,
    pub found: String,
}

/// Parser error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] DeclarationSyntaxError),
    #[error(transparent)]
    DivisionByZero(#[from] DivisionByZeroError),
    #[error(transparent)]
    UndefinedIdentifier(#[from] UndefinedIdentifierError),
    #[error(transparent)]
    Lex(#[from] LexError),
}

impl From<EvalError> for ParseError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::DivisionByZero(e) => ParseError::DivisionByZero(e),
            EvalError::UndefinedIdentifier(e) => {
                ParseError::UndefinedIdentifier(e)
            }
            // a grammar mismatch inside an expression is a syntax error
            // like any other
            EvalError::Unexpected {
                expected,
                found,
                location,
            } => ParseError::Syntax(DeclarationSyntaxError {
                location,
                expected,
                found,
            }),
        }
    }
}

/// Recursive descent parser for declaration streams
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) symbols: SymbolTable,
}

impl Parser {
    /// Create a parser over an already lexed (and macro-expanded) token
    /// stream. The stream must end with an `Eof` token, as
    /// [`Lexer::tokenize`] guarantees.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            symbols: SymbolTable::new(),
        }
    }

    /// Convenience constructor that lexes `source` first. No macro
    /// expansion is applied.
    pub fn from_source(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self::new(tokens))
    }

    /// Parse every declaration in the stream.
    pub fn parse_declarations(
        &mut self,
    ) -> Result<Vec<ParsedDecl>, ParseError> {
        let mut declarations = Vec::new();

        while !self.is_at_end() {
            declarations.push(self.parse_declaration()?);
        }

        Ok(declarations)
    }

    fn parse_declaration(&mut self) -> Result<ParsedDecl, ParseError> {
        if matches!(self.peek(), Token::Typedef(_)) {
            trace!("parsing typedef declaration");
            self.parse_typedef()
        } else if matches!(self.peek(), Token::Enum(_)) {
            trace!("parsing enum declaration");
            self.parse_enum_declaration()
        } else if matches!(
            self.peek(),
            Token::Struct(_) | Token::Class(_) | Token::Union(_)
        ) {
            trace!("parsing record declaration");
            self.parse_record_declaration()
        } else {
            Err(self.syntax_error(
                "'enum', 'struct', 'class', 'union', or 'typedef'",
            ))
        }
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> &Token {
        let pos = (self.position + n).min(self.tokens.len() - 1);
        &self.tokens[pos]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position - 1]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    /// Build a syntax error from the current token.
    pub(crate) fn syntax_error(
        &self,
        expected: impl Into<String>,
    ) -> ParseError {
        DeclarationSyntaxError {
            location: self.current_location(),
            expected: expected.into(),
            found: self.peek().to_string(),
        }
        .into()
    }

    pub(crate) fn expect_token(
        &mut self,
        token: &Token,
        expected: &str,
    ) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.syntax_error(expected))
        }
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LBrace(self.current_location()),
            &format!("'{{' {ctx}"),
        )
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RBrace(self.current_location()),
            &format!("'}}' {ctx}"),
        )
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RParen(self.current_location()),
            &format!("')' {ctx}"),
        )
    }

    pub(crate) fn expect_rbracket(
        &mut self,
        ctx: &str,
    ) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RBracket(self.current_location()),
            &format!("']' {ctx}"),
        )
    }

    pub(crate) fn expect_semicolon(
        &mut self,
        ctx: &str,
    ) -> Result<(), ParseError> {
        self.expect_token(
            &Token::Semicolon(self.current_location()),
            &format!("';' {ctx}"),
        )
    }

    pub(crate) fn expect_identifier(
        &mut self,
        expected: &str,
    ) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.syntax_error(expected))
        }
    }

    // ===== Constant expression spans =====

    /// Collect tokens up to (not including) the first terminator at paren
    /// depth zero, and evaluate them as a constant expression. An empty span
    /// fails with a syntax error naming `expected`.
    pub(crate) fn evaluate_until(
        &mut self,
        is_terminator: fn(&Token) -> bool,
        expected: &str,
    ) -> Result<ConstantValue, ParseError> {
        let start = self.position;
        let mut depth = 0usize;

        loop {
            match self.peek() {
                Token::Eof(_) => break,
                Token::LParen(_) => {
                    depth += 1;
                    self.advance();
                }
                Token::RParen(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.advance();
                }
                token if depth == 0 && is_terminator(token) => break,
                _ => {
                    self.advance();
                }
            }
        }

        let span = &self.tokens[start..self.position];
        if span.is_empty() {
            return Err(self.syntax_error(expected));
        }

        Ok(evaluate(span, &self.symbols)?)
    }

    /// Check an evaluated count (array length, bit-field width) for
    /// non-negativity and widen it to `u64`.
    pub(crate) fn to_unsigned_size(
        &self,
        value: ConstantValue,
        expected: &str,
    ) -> Result<u64, ParseError> {
        if value.is_signed() && value.as_i64() < 0 {
            return Err(DeclarationSyntaxError {
                location: self.current_location(),
                expected: expected.to_string(),
                found: value.to_string(),
            }
            .into());
        }
        Ok(value.as_u64())
    }
}
