//! Lexer (tokenizer) for C/C++ header declarations
//!
//! Converts raw declaration text into a flat [`Token`] stream consumed by the
//! macro table and the parser. Preprocessor directive lines are silently
//! skipped here; `#define` lines are read separately by the macro scanner.
//! Lexing is lenient: the full declaration-level operator set is classified
//! even where the grammar never accepts it, so that syntax errors can name
//! the offending token. Only malformed tokens (unterminated literals and
//! comments, oversized integers, invalid characters) fail.

use super::ast::SourceLocation;
use std::fmt;

/// Suffix flags on an integer literal (`100u`, `7L`, `42ull`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntSuffix {
    pub has_unsigned: bool,
    pub has_long: bool,
}

/// Numeral base of an integer literal (`100`, `017`, `0x1F`)
///
/// The evaluator needs it because an unsuffixed hex or octal constant may
/// type as `unsigned int`, which a decimal constant never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntBase {
    Decimal,
    Octal,
    Hex,
}

impl IntBase {
    fn radix(self) -> u32 {
        match self {
            IntBase::Decimal => 10,
            IntBase::Octal => 8,
            IntBase::Hex => 16,
        }
    }
}

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that errors can report an
/// accurate byte offset without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(u64, IntBase, IntSuffix, SourceLocation),
    /// Raw character literal body; classified only so the lexer skips it
    /// correctly, the declaration grammar never accepts one
    CharLiteral(String, SourceLocation),
    /// Raw string literal body, likewise skip-only
    StringLiteral(String, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),

    // Keywords
    Enum(SourceLocation),
    Struct(SourceLocation),
    Class(SourceLocation),
    Union(SourceLocation),
    Typedef(SourceLocation),
    Const(SourceLocation),
    Volatile(SourceLocation),
    Unsigned(SourceLocation),
    Signed(SourceLocation),
    Long(SourceLocation),
    Short(SourceLocation),
    Int(SourceLocation),
    Char(SourceLocation),
    Float(SourceLocation),
    Double(SourceLocation),
    Bool(SourceLocation),
    Void(SourceLocation),
    WCharT(SourceLocation),
    Char8T(SourceLocation),
    Char16T(SourceLocation),
    Char32T(SourceLocation),
    Public(SourceLocation),
    Private(SourceLocation),
    Protected(SourceLocation),

    // Operators (single and multi-character)
    // Arithmetic
    Plus(SourceLocation),    // +
    Minus(SourceLocation),   // -
    Star(SourceLocation),    // *
    Slash(SourceLocation),   // /
    Percent(SourceLocation), // %

    // Comparison
    EqEq(SourceLocation),  // ==
    NotEq(SourceLocation), // !=
    Lt(SourceLocation),    // <
    Le(SourceLocation),    // <=
    Gt(SourceLocation),    // >
    Ge(SourceLocation),    // >=

    // Logical
    AndAnd(SourceLocation), // &&
    OrOr(SourceLocation),   // ||
    Bang(SourceLocation),   // !

    // Bitwise
    Amp(SourceLocation),   // &
    Pipe(SourceLocation),  // |
    Caret(SourceLocation), // ^
    Tilde(SourceLocation), // ~
    LtLt(SourceLocation),  // <<
    GtGt(SourceLocation),  // >>

    // Assignment
    Eq(SourceLocation),        // =
    PlusEq(SourceLocation),    // +=
    MinusEq(SourceLocation),   // -=
    StarEq(SourceLocation),    // *=
    SlashEq(SourceLocation),   // /=
    PercentEq(SourceLocation), // %=
    AmpEq(SourceLocation),     // &=
    PipeEq(SourceLocation),    // |=
    CaretEq(SourceLocation),   // ^=
    LtLtEq(SourceLocation),    // <<=
    GtGtEq(SourceLocation),    // >>=

    // Increment/Decrement
    PlusPlus(SourceLocation),   // ++
    MinusMinus(SourceLocation), // --

    // Member access
    Dot(SourceLocation),      // .
    Arrow(SourceLocation),    // ->
    Ellipsis(SourceLocation), // ...

    // Scope and labels
    Question(SourceLocation),   // ?
    Colon(SourceLocation),      // :
    ColonColon(SourceLocation), // ::

    // Punctuation
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    Semicolon(SourceLocation), // ;
    Comma(SourceLocation),     // ,

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, _, _, loc) => *loc,
            Token::CharLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Enum(loc)
            | Token::Struct(loc)
            | Token::Class(loc)
            | Token::Union(loc)
            | Token::Typedef(loc)
            | Token::Const(loc)
            | Token::Volatile(loc)
            | Token::Unsigned(loc)
            | Token::Signed(loc)
            | Token::Long(loc)
            | Token::Short(loc)
            | Token::Int(loc)
            | Token::Char(loc)
            | Token::Float(loc)
            | Token::Double(loc)
            | Token::Bool(loc)
            | Token::Void(loc)
            | Token::WCharT(loc)
            | Token::Char8T(loc)
            | Token::Char16T(loc)
            | Token::Char32T(loc)
            | Token::Public(loc)
            | Token::Private(loc)
            | Token::Protected(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::Slash(loc)
            | Token::Percent(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::AndAnd(loc)
            | Token::OrOr(loc)
            | Token::Bang(loc)
            | Token::Amp(loc)
            | Token::Pipe(loc)
            | Token::Caret(loc)
            | Token::Tilde(loc)
            | Token::LtLt(loc)
            | Token::GtGt(loc)
            | Token::Eq(loc)
            | Token::PlusEq(loc)
            | Token::MinusEq(loc)
            | Token::StarEq(loc)
            | Token::SlashEq(loc)
            | Token::PercentEq(loc)
            | Token::AmpEq(loc)
            | Token::PipeEq(loc)
            | Token::CaretEq(loc)
            | Token::LtLtEq(loc)
            | Token::GtGtEq(loc)
            | Token::PlusPlus(loc)
            | Token::MinusMinus(loc)
            | Token::Dot(loc)
            | Token::Arrow(loc)
            | Token::Ellipsis(loc)
            | Token::Question(loc)
            | Token::Colon(loc)
            | Token::ColonColon(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::Eof(loc) => *loc,
        }
    }

    /// Returns the same token relocated to `loc`.
    ///
    /// Used when macro replacement tokens are spliced into a stream: the
    /// spliced copies take the use site's location so errors point into the
    /// declaration text rather than at the definition.
    pub fn with_location(&self, loc: SourceLocation) -> Token {
        match self {
            Token::IntLiteral(v, b, s, _) => {
                Token::IntLiteral(*v, *b, *s, loc)
            }
            Token::CharLiteral(s, _) => Token::CharLiteral(s.clone(), loc),
            Token::StringLiteral(s, _) => Token::StringLiteral(s.clone(), loc),
            Token::Ident(s, _) => Token::Ident(s.clone(), loc),
            Token::Enum(_) => Token::Enum(loc),
            Token::Struct(_) => Token::Struct(loc),
            Token::Class(_) => Token::Class(loc),
            Token::Union(_) => Token::Union(loc),
            Token::Typedef(_) => Token::Typedef(loc),
            Token::Const(_) => Token::Const(loc),
            Token::Volatile(_) => Token::Volatile(loc),
            Token::Unsigned(_) => Token::Unsigned(loc),
            Token::Signed(_) => Token::Signed(loc),
            Token::Long(_) => Token::Long(loc),
            Token::Short(_) => Token::Short(loc),
            Token::Int(_) => Token::Int(loc),
            Token::Char(_) => Token::Char(loc),
            Token::Float(_) => Token::Float(loc),
            Token::Double(_) => Token::Double(loc),
            Token::Bool(_) => Token::Bool(loc),
            Token::Void(_) => Token::Void(loc),
            Token::WCharT(_) => Token::WCharT(loc),
            Token::Char8T(_) => Token::Char8T(loc),
            Token::Char16T(_) => Token::Char16T(loc),
            Token::Char32T(_) => Token::Char32T(loc),
            Token::Public(_) => Token::Public(loc),
            Token::Private(_) => Token::Private(loc),
            Token::Protected(_) => Token::Protected(loc),
            Token::Plus(_) => Token::Plus(loc),
            Token::Minus(_) => Token::Minus(loc),
            Token::Star(_) => Token::Star(loc),
            Token::Slash(_) => Token::Slash(loc),
            Token::Percent(_) => Token::Percent(loc),
            Token::EqEq(_) => Token::EqEq(loc),
            Token::NotEq(_) => Token::NotEq(loc),
            Token::Lt(_) => Token::Lt(loc),
            Token::Le(_) => Token::Le(loc),
            Token::Gt(_) => Token::Gt(loc),
            Token::Ge(_) => Token::Ge(loc),
            Token::AndAnd(_) => Token::AndAnd(loc),
            Token::OrOr(_) => Token::OrOr(loc),
            Token::Bang(_) => Token::Bang(loc),
            Token::Amp(_) => Token::Amp(loc),
            Token::Pipe(_) => Token::Pipe(loc),
            Token::Caret(_) => Token::Caret(loc),
            Token::Tilde(_) => Token::Tilde(loc),
            Token::LtLt(_) => Token::LtLt(loc),
            Token::GtGt(_) => Token::GtGt(loc),
            Token::Eq(_) => Token::Eq(loc),
            Token::PlusEq(_) => Token::PlusEq(loc),
            Token::MinusEq(_) => Token::MinusEq(loc),
            Token::StarEq(_) => Token::StarEq(loc),
            Token::SlashEq(_) => Token::SlashEq(loc),
            Token::PercentEq(_) => Token::PercentEq(loc),
            Token::AmpEq(_) => Token::AmpEq(loc),
            Token::PipeEq(_) => Token::PipeEq(loc),
            Token::CaretEq(_) => Token::CaretEq(loc),
            Token::LtLtEq(_) => Token::LtLtEq(loc),
            Token::GtGtEq(_) => Token::GtGtEq(loc),
            Token::PlusPlus(_) => Token::PlusPlus(loc),
            Token::MinusMinus(_) => Token::MinusMinus(loc),
            Token::Dot(_) => Token::Dot(loc),
            Token::Arrow(_) => Token::Arrow(loc),
            Token::Ellipsis(_) => Token::Ellipsis(loc),
            Token::Question(_) => Token::Question(loc),
            Token::Colon(_) => Token::Colon(loc),
            Token::ColonColon(_) => Token::ColonColon(loc),
            Token::LParen(_) => Token::LParen(loc),
            Token::RParen(_) => Token::RParen(loc),
            Token::LBrace(_) => Token::LBrace(loc),
            Token::RBrace(_) => Token::RBrace(loc),
            Token::LBracket(_) => Token::LBracket(loc),
            Token::RBracket(_) => Token::RBracket(loc),
            Token::Semicolon(_) => Token::Semicolon(loc),
            Token::Comma(_) => Token::Comma(loc),
            Token::Eof(_) => Token::Eof(loc),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _, _, _) => {
                write!(f, "integer literal {}", n)
            }
            Token::CharLiteral(s, _) => write!(f, "character literal '{}'", s),
            Token::StringLiteral(s, _) => {
                write!(f, "string literal \"{}\"", s)
            }
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Enum(_) => write!(f, "'enum'"),
            Token::Struct(_) => write!(f, "'struct'"),
            Token::Class(_) => write!(f, "'class'"),
            Token::Union(_) => write!(f, "'union'"),
            Token::Typedef(_) => write!(f, "'typedef'"),
            Token::Const(_) => write!(f, "'const'"),
            Token::Volatile(_) => write!(f, "'volatile'"),
            Token::Unsigned(_) => write!(f, "'unsigned'"),
            Token::Signed(_) => write!(f, "'signed'"),
            Token::Long(_) => write!(f, "'long'"),
            Token::Short(_) => write!(f, "'short'"),
            Token::Int(_) => write!(f, "'int'"),
            Token::Char(_) => write!(f, "'char'"),
            Token::Float(_) => write!(f, "'float'"),
            Token::Double(_) => write!(f, "'double'"),
            Token::Bool(_) => write!(f, "'bool'"),
            Token::Void(_) => write!(f, "'void'"),
            Token::WCharT(_) => write!(f, "'wchar_t'"),
            Token::Char8T(_) => write!(f, "'char8_t'"),
            Token::Char16T(_) => write!(f, "'char16_t'"),
            Token::Char32T(_) => write!(f, "'char32_t'"),
            Token::Public(_) => write!(f, "'public'"),
            Token::Private(_) => write!(f, "'private'"),
            Token::Protected(_) => write!(f, "'protected'"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::Percent(_) => write!(f, "'%'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::Lt(_) => write!(f, "'<'"),
            Token::Le(_) => write!(f, "'<='"),
            Token::Gt(_) => write!(f, "'>'"),
            Token::Ge(_) => write!(f, "'>='"),
            Token::AndAnd(_) => write!(f, "'&&'"),
            Token::OrOr(_) => write!(f, "'||'"),
            Token::Bang(_) => write!(f, "'!'"),
            Token::Amp(_) => write!(f, "'&'"),
            Token::Pipe(_) => write!(f, "'|'"),
            Token::Caret(_) => write!(f, "'^'"),
            Token::Tilde(_) => write!(f, "'~'"),
            Token::LtLt(_) => write!(f, "'<<'"),
            Token::GtGt(_) => write!(f, "'>>'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::PlusEq(_) => write!(f, "'+='"),
            Token::MinusEq(_) => write!(f, "'-='"),
            Token::StarEq(_) => write!(f, "'*='"),
            Token::SlashEq(_) => write!(f, "'/='"),
            Token::PercentEq(_) => write!(f, "'%='"),
            Token::AmpEq(_) => write!(f, "'&='"),
            Token::PipeEq(_) => write!(f, "'|='"),
            Token::CaretEq(_) => write!(f, "'^='"),
            Token::LtLtEq(_) => write!(f, "'<<='"),
            Token::GtGtEq(_) => write!(f, "'>>='"),
            Token::PlusPlus(_) => write!(f, "'++'"),
            Token::MinusMinus(_) => write!(f, "'--'"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Arrow(_) => write!(f, "'->'"),
            Token::Ellipsis(_) => write!(f, "'...'"),
            Token::Question(_) => write!(f, "'?'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::ColonColon(_) => write!(f, "'::'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, thiserror::Error)]
#[error("lex error at {location}: {message}")]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for declaration text
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    offset: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            // Directive lines are not tokens; #define lines are read by the
            // macro scanner before lexing
            if self.peek() == Some('#') {
                self.skip_preprocessor_directive();
                continue;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            // String literals
            '"' => self.string_literal(loc),

            // Character literals
            '\'' => self.char_literal(loc),

            // Numeric literals
            '0'..='9' => self.number_literal(ch, loc),

            // Identifiers and keywords
            'a'..='z' | 'A'..='Z' | '_' => {
                Ok(self.identifier_or_keyword(ch, loc))
            }

            // Operators and punctuation
            '+' => {
                if self.peek() == Some('+') {
                    self.advance();
                    Ok(Token::PlusPlus(loc))
                } else if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::PlusEq(loc))
                } else {
                    Ok(Token::Plus(loc))
                }
            }
            '-' => {
                if self.peek() == Some('-') {
                    self.advance();
                    Ok(Token::MinusMinus(loc))
                } else if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::MinusEq(loc))
                } else if self.peek() == Some('>') {
                    self.advance();
                    Ok(Token::Arrow(loc))
                } else {
                    Ok(Token::Minus(loc))
                }
            }
            '*' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::StarEq(loc))
                } else {
                    Ok(Token::Star(loc))
                }
            }
            '/' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::SlashEq(loc))
                } else {
                    Ok(Token::Slash(loc))
                }
            }
            '%' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::PercentEq(loc))
                } else {
                    Ok(Token::Percent(loc))
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::EqEq(loc))
                } else {
                    Ok(Token::Eq(loc))
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::NotEq(loc))
                } else {
                    Ok(Token::Bang(loc))
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::Le(loc))
                } else if self.peek() == Some('<') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Ok(Token::LtLtEq(loc))
                    } else {
                        Ok(Token::LtLt(loc))
                    }
                } else {
                    Ok(Token::Lt(loc))
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::Ge(loc))
                } else if self.peek() == Some('>') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Ok(Token::GtGtEq(loc))
                    } else {
                        Ok(Token::GtGt(loc))
                    }
                } else {
                    Ok(Token::Gt(loc))
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    Ok(Token::AndAnd(loc))
                } else if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::AmpEq(loc))
                } else {
                    Ok(Token::Amp(loc))
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    Ok(Token::OrOr(loc))
                } else if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::PipeEq(loc))
                } else {
                    Ok(Token::Pipe(loc))
                }
            }
            '^' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::CaretEq(loc))
                } else {
                    Ok(Token::Caret(loc))
                }
            }
            '~' => Ok(Token::Tilde(loc)),
            '.' => {
                if self.peek() == Some('.') && self.peek_ahead(1) == Some('.')
                {
                    self.advance();
                    self.advance();
                    Ok(Token::Ellipsis(loc))
                } else {
                    Ok(Token::Dot(loc))
                }
            }
            '?' => Ok(Token::Question(loc)),
            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    Ok(Token::ColonColon(loc))
                } else {
                    Ok(Token::Colon(loc))
                }
            }
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            '{' => Ok(Token::LBrace(loc)),
            '}' => Ok(Token::RBrace(loc)),
            '[' => Ok(Token::LBracket(loc)),
            ']' => Ok(Token::RBracket(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            ',' => Ok(Token::Comma(loc)),

            _ => Err(LexError {
                message: format!("unexpected character '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Skip over a string literal, keeping its raw body.
    ///
    /// Escapes are not interpreted; only `\"` and `\\` matter for finding
    /// the terminator.
    fn string_literal(
        &mut self,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let mut body = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(Token::StringLiteral(body, loc));
                }
                '\n' => break,
                '\\' => {
                    body.push(ch);
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        body.push(escaped);
                    }
                }
                _ => {
                    body.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError {
            message: "unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Skip over a character literal, keeping its raw body.
    fn char_literal(
        &mut self,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let mut body = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '\'' => {
                    self.advance();
                    return Ok(Token::CharLiteral(body, loc));
                }
                '\n' => break,
                '\\' => {
                    body.push(ch);
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        body.push(escaped);
                    }
                }
                _ => {
                    body.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError {
            message: "unterminated character literal".to_string(),
            location: loc,
        })
    }

    /// Parse an integer literal: decimal, hex (`0x`), or octal (leading `0`),
    /// with optional `u`/`l`/`ll` suffixes in either order and case.
    fn number_literal(
        &mut self,
        first_digit: char,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let mut digits = String::new();
        let base;

        if first_digit == '0'
            && matches!(self.peek(), Some('x') | Some('X'))
        {
            self.advance();
            base = IntBase::Hex;
            while let Some(ch) = self.peek() {
                if ch.is_ascii_hexdigit() {
                    digits.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(LexError {
                    message: "hex literal has no digits".to_string(),
                    location: loc,
                });
            }
        } else if first_digit == '0'
            && matches!(self.peek(), Some('0'..='9'))
        {
            base = IntBase::Octal;
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    if !('0'..='7').contains(&ch) {
                        return Err(LexError {
                            message: format!(
                                "invalid digit '{}' in octal literal",
                                ch
                            ),
                            location: loc,
                        });
                    }
                    digits.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        } else {
            base = IntBase::Decimal;
            digits.push(first_digit);
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    digits.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let value = u64::from_str_radix(&digits, base.radix()).map_err(
            |_| LexError {
                message: format!("integer literal too large: {}", digits),
                location: loc,
            },
        )?;

        let suffix = self.int_suffix(loc)?;
        Ok(Token::IntLiteral(value, base, suffix, loc))
    }

    /// Parse the optional `u`/`l` suffix cluster after an integer literal.
    fn int_suffix(
        &mut self,
        loc: SourceLocation,
    ) -> Result<IntSuffix, LexError> {
        let mut suffix = IntSuffix::default();
        let mut long_count = 0;

        while let Some(ch) = self.peek() {
            match ch {
                'u' | 'U' => {
                    if suffix.has_unsigned {
                        return Err(LexError {
                            message: "invalid integer literal suffix"
                                .to_string(),
                            location: loc,
                        });
                    }
                    suffix.has_unsigned = true;
                    self.advance();
                }
                'l' | 'L' => {
                    long_count += 1;
                    if long_count > 2 {
                        return Err(LexError {
                            message: "invalid integer literal suffix"
                                .to_string(),
                            location: loc,
                        });
                    }
                    suffix.has_long = true;
                    self.advance();
                }
                'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => {
                    return Err(LexError {
                        message: format!(
                            "invalid character '{}' in integer literal",
                            ch
                        ),
                        location: loc,
                    });
                }
                _ => break,
            }
        }

        Ok(suffix)
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(
        &mut self,
        first_char: char,
        loc: SourceLocation,
    ) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "enum" => Token::Enum(loc),
            "struct" => Token::Struct(loc),
            "class" => Token::Class(loc),
            "union" => Token::Union(loc),
            "typedef" => Token::Typedef(loc),
            "const" => Token::Const(loc),
            "volatile" => Token::Volatile(loc),
            "unsigned" => Token::Unsigned(loc),
            "signed" => Token::Signed(loc),
            "long" => Token::Long(loc),
            "short" => Token::Short(loc),
            "int" => Token::Int(loc),
            "char" => Token::Char(loc),
            "float" => Token::Float(loc),
            "double" => Token::Double(loc),
            "bool" => Token::Bool(loc),
            "void" => Token::Void(loc),
            "wchar_t" => Token::WCharT(loc),
            "char8_t" => Token::Char8T(loc),
            "char16_t" => Token::Char16T(loc),
            "char32_t" => Token::Char32T(loc),
            "public" => Token::Public(loc),
            "private" => Token::Private(loc),
            "protected" => Token::Protected(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    /// Skip a preprocessor directive line, honoring backslash continuations.
    fn skip_preprocessor_directive(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\\' && self.peek_ahead(1) == Some('\n') {
                self.advance();
                self.advance();
                continue;
            }
            if ch == '\\'
                && self.peek_ahead(1) == Some('\r')
                && self.peek_ahead(2) == Some('\n')
            {
                self.advance();
                self.advance();
                self.advance();
                continue;
            }
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        if self.position < self.input.len() {
            Some(self.input[self.position])
        } else {
            None
        }
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        let pos = self.position + n;
        if pos < self.input.len() {
            Some(self.input[pos])
        } else {
            None
        }
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        if self.position >= self.input.len() {
            return None;
        }

        let ch = self.input[self.position];
        self.position += 1;
        self.offset += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.offset, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_tokens() {
        let mut lexer = Lexer::new("enum Color { Red = 1, };");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Enum(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "Color"));
        assert!(matches!(tokens[2], Token::LBrace(_)));
        assert!(matches!(tokens[3], Token::Ident(ref s, _) if s == "Red"));
        assert!(matches!(tokens[4], Token::Eq(_)));
        assert!(matches!(tokens[5], Token::IntLiteral(1, _, _, _)));
        assert!(matches!(tokens[6], Token::Comma(_)));
        assert!(matches!(tokens[7], Token::RBrace(_)));
        assert!(matches!(tokens[8], Token::Semicolon(_)));
        assert!(matches!(tokens[9], Token::Eof(_)));
    }

    #[test]
    fn test_operators() {
        let mut lexer = Lexer::new(":: << >> -> *= ... <<= &= ++");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::ColonColon(_)));
        assert!(matches!(tokens[1], Token::LtLt(_)));
        assert!(matches!(tokens[2], Token::GtGt(_)));
        assert!(matches!(tokens[3], Token::Arrow(_)));
        assert!(matches!(tokens[4], Token::StarEq(_)));
        assert!(matches!(tokens[5], Token::Ellipsis(_)));
        assert!(matches!(tokens[6], Token::LtLtEq(_)));
        assert!(matches!(tokens[7], Token::AmpEq(_)));
        assert!(matches!(tokens[8], Token::PlusPlus(_)));
    }

    #[test]
    fn test_int_literals() {
        let mut lexer = Lexer::new("100 0x1F 017 0 42u 7l 9ull");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(
            tokens[0],
            Token::IntLiteral(100, IntBase::Decimal, _, _)
        ));
        assert!(matches!(
            tokens[1],
            Token::IntLiteral(31, IntBase::Hex, _, _)
        ));
        assert!(matches!(
            tokens[2],
            Token::IntLiteral(15, IntBase::Octal, _, _)
        ));
        assert!(matches!(tokens[3], Token::IntLiteral(0, _, _, _)));
        assert!(matches!(
            tokens[4],
            Token::IntLiteral(
                42,
                _,
                IntSuffix {
                    has_unsigned: true,
                    has_long: false
                },
                _
            )
        ));
        assert!(matches!(
            tokens[5],
            Token::IntLiteral(
                7,
                _,
                IntSuffix {
                    has_unsigned: false,
                    has_long: true
                },
                _
            )
        ));
        assert!(matches!(
            tokens[6],
            Token::IntLiteral(
                9,
                _,
                IntSuffix {
                    has_unsigned: true,
                    has_long: true
                },
                _
            )
        ));
    }

    #[test]
    fn test_offsets() {
        let mut lexer = Lexer::new("int  x;\nint y;");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens[0].location().offset, 0);
        assert_eq!(tokens[1].location().offset, 5);
        assert_eq!(tokens[2].location().offset, 6);
        assert_eq!(tokens[3].location().offset, 8);
        assert_eq!(tokens[3].location().line, 2);
        assert_eq!(tokens[3].location().column, 1);
    }

    #[test]
    fn test_comments() {
        let mut lexer = Lexer::new(
            "int x; // comment\nint y; /* block\ncomment */ int z;",
        );
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Int(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[2], Token::Semicolon(_)));
        assert!(matches!(tokens[3], Token::Int(_)));
        assert!(matches!(tokens[4], Token::Ident(ref s, _) if s == "y"));
        assert!(matches!(tokens[5], Token::Semicolon(_)));
        assert!(matches!(tokens[6], Token::Int(_)));
        assert!(matches!(tokens[7], Token::Ident(ref s, _) if s == "z"));
    }

    #[test]
    fn test_string_and_char_skip() {
        let mut lexer = Lexer::new(r#""hello \"there\"" 'a' '\n'"#);
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(
            tokens[0],
            Token::StringLiteral(ref s, _) if s == r#"hello \"there\""#
        ));
        assert!(matches!(tokens[1], Token::CharLiteral(ref s, _) if s == "a"));
        assert!(
            matches!(tokens[2], Token::CharLiteral(ref s, _) if s == r"\n")
        );
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"never closed");
        let err = lexer.tokenize().unwrap_err();
        assert!(err.message.contains("unterminated string"));
        assert_eq!(err.location.offset, 0);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut lexer = Lexer::new("int x; /* oops");
        let err = lexer.tokenize().unwrap_err();
        assert!(err.message.contains("unterminated block comment"));
    }

    #[test]
    fn test_invalid_character() {
        let mut lexer = Lexer::new("int @ x;");
        let err = lexer.tokenize().unwrap_err();
        assert!(err.message.contains("unexpected character"));
        assert_eq!(err.location.offset, 4);
    }

    #[test]
    fn test_preprocessor_skip() {
        let mut lexer =
            Lexer::new("#pragma once\n#define X \\\n  1\nint x;");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Int(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "x"));
    }
}
