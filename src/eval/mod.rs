//! Constant expression evaluator
//!
//! Evaluates integer constant expressions over a token span, as needed for
//! enumerator values and array lengths. Values model the C integer lattice
//! `{int, unsigned int, long long, unsigned long long}` as two widths with a
//! signedness flag; binary operators apply the usual arithmetic conversions,
//! overflow wraps in two's complement, and shift results take the promoted
//! left operand's type with the count masked to the width.
//!
//! Identifier operands are resolved through a caller-supplied
//! [`SymbolTable`]; the declaration parser feeds previously evaluated
//! enumerators into it so later enumerators can reference earlier ones.

use crate::parser::ast::SourceLocation;
use crate::parser::lexer::{IntBase, IntSuffix, Token};
use rustc_hash::FxHashMap;
use std::fmt;

/// Width tier of a constant: `int` sized or `long long` sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    Bits32,
    Bits64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::Bits32 => 32,
            IntWidth::Bits64 => 64,
        }
    }
}

/// An evaluated integer constant with its C type.
///
/// Bits are stored truncated to `width` and zero-extended into the `u64`;
/// [`as_i64`](Self::as_i64) reads them back under the signedness flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstantValue {
    bits: u64,
    width: IntWidth,
    signed: bool,
}

impl ConstantValue {
    fn new_masked(bits: u64, width: IntWidth, signed: bool) -> Self {
        let bits = match width {
            IntWidth::Bits32 => bits & 0xFFFF_FFFF,
            IntWidth::Bits64 => bits,
        };
        Self {
            bits,
            width,
            signed,
        }
    }

    /// Type an integer literal from its value, base, and suffix.
    ///
    /// Unsuffixed decimal literals take the first of `int`, `long long`,
    /// `unsigned long long` that fits; unsuffixed hex and octal literals
    /// also try `unsigned int` before widening. A `u` suffix starts the
    /// search at the unsigned types and an `l`/`ll` suffix at the 64-bit
    /// ones.
    pub fn from_literal(value: u64, base: IntBase, suffix: IntSuffix) -> Self {
        match (suffix.has_unsigned, suffix.has_long) {
            (true, true) => Self::from(value),
            (true, false) => {
                if value <= u32::MAX as u64 {
                    Self::from(value as u32)
                } else {
                    Self::from(value)
                }
            }
            (false, true) => {
                if value <= i64::MAX as u64 {
                    Self::from(value as i64)
                } else {
                    Self::from(value)
                }
            }
            (false, false) => {
                if value <= i32::MAX as u64 {
                    Self::from(value as i32)
                } else if base != IntBase::Decimal
                    && value <= u32::MAX as u64
                {
                    Self::from(value as u32)
                } else if value <= i64::MAX as u64 {
                    Self::from(value as i64)
                } else {
                    Self::from(value)
                }
            }
        }
    }

    /// Raw bits, zero-extended.
    pub fn as_u64(&self) -> u64 {
        self.bits
    }

    /// Numeric value read under the signedness flag, sign-extending 32-bit
    /// signed values.
    pub fn as_i64(&self) -> i64 {
        match (self.width, self.signed) {
            (IntWidth::Bits32, true) => self.bits as u32 as i32 as i64,
            _ => self.bits as i64,
        }
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Usual arithmetic conversions over the two-width lattice: the wider
    /// operand's type wins, and at equal width unsigned wins.
    fn usual_arithmetic_conversions(a: Self, b: Self) -> (IntWidth, bool) {
        match (a.width, b.width) {
            (IntWidth::Bits64, IntWidth::Bits32) => (IntWidth::Bits64, a.signed),
            (IntWidth::Bits32, IntWidth::Bits64) => (IntWidth::Bits64, b.signed),
            (w, _) => (w, a.signed && b.signed),
        }
    }

    /// Convert to the given type: widening sign-extends signed sources and
    /// zero-extends unsigned ones, same-width conversion reinterprets bits.
    fn convert(self, width: IntWidth, signed: bool) -> Self {
        let bits = if self.signed {
            self.as_i64() as u64
        } else {
            self.bits
        };
        Self::new_masked(bits, width, signed)
    }

    fn binary_wrapping(self, other: Self, op: fn(u64, u64) -> u64) -> Self {
        let (width, signed) = Self::usual_arithmetic_conversions(self, other);
        let a = self.convert(width, signed);
        let b = other.convert(width, signed);
        Self::new_masked(op(a.bits, b.bits), width, signed)
    }

    pub fn add(self, other: Self) -> Self {
        self.binary_wrapping(other, u64::wrapping_add)
    }

    pub fn sub(self, other: Self) -> Self {
        self.binary_wrapping(other, u64::wrapping_sub)
    }

    pub fn mul(self, other: Self) -> Self {
        self.binary_wrapping(other, u64::wrapping_mul)
    }

    pub fn bit_and(self, other: Self) -> Self {
        self.binary_wrapping(other, |a, b| a & b)
    }

    pub fn bit_or(self, other: Self) -> Self {
        self.binary_wrapping(other, |a, b| a | b)
    }

    pub fn bit_xor(self, other: Self) -> Self {
        self.binary_wrapping(other, |a, b| a ^ b)
    }

    pub fn div(
        self,
        other: Self,
        location: SourceLocation,
    ) -> Result<Self, DivisionByZeroError> {
        let (width, signed) = Self::usual_arithmetic_conversions(self, other);
        let a = self.convert(width, signed);
        let b = other.convert(width, signed);
        if b.bits == 0 {
            return Err(DivisionByZeroError { location });
        }
        let bits = if signed {
            a.as_i64().wrapping_div(b.as_i64()) as u64
        } else {
            a.bits / b.bits
        };
        Ok(Self::new_masked(bits, width, signed))
    }

    pub fn rem(
        self,
        other: Self,
        location: SourceLocation,
    ) -> Result<Self, DivisionByZeroError> {
        let (width, signed) = Self::usual_arithmetic_conversions(self, other);
        let a = self.convert(width, signed);
        let b = other.convert(width, signed);
        if b.bits == 0 {
            return Err(DivisionByZeroError { location });
        }
        let bits = if signed {
            a.as_i64().wrapping_rem(b.as_i64()) as u64
        } else {
            a.bits % b.bits
        };
        Ok(Self::new_masked(bits, width, signed))
    }

    /// Left shift. The result keeps the left operand's type; the count is
    /// masked to the operand width so oversized counts cannot panic.
    pub fn shl(self, count: Self) -> Self {
        let shift = count.as_u64() & (self.width.bits() as u64 - 1);
        Self::new_masked(self.bits << shift, self.width, self.signed)
    }

    /// Right shift: arithmetic for signed operands, logical for unsigned.
    pub fn shr(self, count: Self) -> Self {
        let shift = (count.as_u64() & (self.width.bits() as u64 - 1)) as u32;
        let bits = if self.signed {
            (self.as_i64() >> shift) as u64
        } else {
            self.bits >> shift
        };
        Self::new_masked(bits, self.width, self.signed)
    }

    pub fn neg(self) -> Self {
        Self::new_masked(0u64.wrapping_sub(self.bits), self.width, self.signed)
    }

    pub fn bit_not(self) -> Self {
        Self::new_masked(!self.bits, self.width, self.signed)
    }
}

impl From<i32> for ConstantValue {
    fn from(value: i32) -> Self {
        Self::new_masked(value as u32 as u64, IntWidth::Bits32, true)
    }
}

impl From<u32> for ConstantValue {
    fn from(value: u32) -> Self {
        Self::new_masked(value as u64, IntWidth::Bits32, false)
    }
}

impl From<i64> for ConstantValue {
    fn from(value: i64) -> Self {
        Self::new_masked(value as u64, IntWidth::Bits64, true)
    }
}

impl From<u64> for ConstantValue {
    fn from(value: u64) -> Self {
        Self::new_masked(value, IntWidth::Bits64, false)
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signed {
            write!(f, "{}", self.as_i64())
        } else {
            write!(f, "{}", self.as_u64())
        }
    }
}

impl serde::Serialize for ConstantValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if self.signed {
            serializer.serialize_i64(self.as_i64())
        } else {
            serializer.serialize_u64(self.as_u64())
        }
    }
}

/// Error when a constant expression divides or takes remainder by zero
#[derive(Debug, Clone, thiserror::Error)]
#[error("division by zero at {location}")]
pub struct DivisionByZeroError {
    pub location: SourceLocation,
}

/// Error when a constant expression names an unknown identifier
#[derive(Debug, Clone, thiserror::Error)]
#[error("undefined identifier '{name}' at {location}")]
pub struct UndefinedIdentifierError {
    pub name: String,
    pub location: SourceLocation,
}

/// Evaluation error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    DivisionByZero(#[from] DivisionByZeroError),
    #[error(transparent)]
    UndefinedIdentifier(#[from] UndefinedIdentifierError),
    #[error("expected {expected}, found {found} at {location}")]
    Unexpected {
        expected: String,
        found: String,
        location: SourceLocation,
    },
}

/// Named constants visible to expressions being evaluated
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: FxHashMap<String, ConstantValue>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: ConstantValue) {
        self.symbols.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<ConstantValue> {
        self.symbols.get(name).copied()
    }
}

/// Evaluate the constant expression spanning `tokens`.
///
/// The whole span must be consumed; a trailing `Eof` token is tolerated so
/// callers can pass a full stream tail.
pub fn evaluate(
    tokens: &[Token],
    symbols: &SymbolTable,
) -> Result<ConstantValue, EvalError> {
    let mut evaluator = Evaluator {
        tokens,
        position: 0,
        symbols,
    };
    let value = evaluator.parse_bitwise_or()?;

    match evaluator.peek() {
        None | Some(Token::Eof(_)) => Ok(value),
        Some(token) => Err(EvalError::Unexpected {
            expected: "end of expression".to_string(),
            found: token.to_string(),
            location: token.location(),
        }),
    }
}

/// Direct evaluator over a token span, one method per precedence level
struct Evaluator<'a> {
    tokens: &'a [Token],
    position: usize,
    symbols: &'a SymbolTable,
}

impl Evaluator<'_> {
    fn parse_bitwise_or(&mut self) -> Result<ConstantValue, EvalError> {
        let mut left = self.parse_bitwise_xor()?;

        while matches!(self.peek(), Some(Token::Pipe(_))) {
            self.advance();
            let right = self.parse_bitwise_xor()?;
            left = left.bit_or(right);
        }

        Ok(left)
    }

    fn parse_bitwise_xor(&mut self) -> Result<ConstantValue, EvalError> {
        let mut left = self.parse_bitwise_and()?;

        while matches!(self.peek(), Some(Token::Caret(_))) {
            self.advance();
            let right = self.parse_bitwise_and()?;
            left = left.bit_xor(right);
        }

        Ok(left)
    }

    fn parse_bitwise_and(&mut self) -> Result<ConstantValue, EvalError> {
        let mut left = self.parse_shift()?;

        while matches!(self.peek(), Some(Token::Amp(_))) {
            self.advance();
            let right = self.parse_shift()?;
            left = left.bit_and(right);
        }

        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<ConstantValue, EvalError> {
        let mut left = self.parse_additive()?;

        loop {
            match self.peek() {
                Some(Token::LtLt(_)) => {
                    self.advance();
                    let right = self.parse_additive()?;
                    left = left.shl(right);
                }
                Some(Token::GtGt(_)) => {
                    self.advance();
                    let right = self.parse_additive()?;
                    left = left.shr(right);
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<ConstantValue, EvalError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            match self.peek() {
                Some(Token::Plus(_)) => {
                    self.advance();
                    let right = self.parse_multiplicative()?;
                    left = left.add(right);
                }
                Some(Token::Minus(_)) => {
                    self.advance();
                    let right = self.parse_multiplicative()?;
                    left = left.sub(right);
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<ConstantValue, EvalError> {
        let mut left = self.parse_unary()?;

        loop {
            match self.peek() {
                Some(Token::Star(_)) => {
                    self.advance();
                    let right = self.parse_unary()?;
                    left = left.mul(right);
                }
                Some(Token::Slash(loc)) => {
                    let loc = *loc;
                    self.advance();
                    let right = self.parse_unary()?;
                    left = left.div(right, loc)?;
                }
                Some(Token::Percent(loc)) => {
                    let loc = *loc;
                    self.advance();
                    let right = self.parse_unary()?;
                    left = left.rem(right, loc)?;
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ConstantValue, EvalError> {
        match self.peek() {
            Some(Token::Minus(_)) => {
                self.advance();
                Ok(self.parse_unary()?.neg())
            }
            Some(Token::Plus(_)) => {
                self.advance();
                self.parse_unary()
            }
            Some(Token::Tilde(_)) => {
                self.advance();
                Ok(self.parse_unary()?.bit_not())
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<ConstantValue, EvalError> {
        let Some(token) = self.peek().cloned() else {
            return Err(EvalError::Unexpected {
                expected: "integer literal, identifier, or '('".to_string(),
                found: "end of expression".to_string(),
                location: self.last_location(),
            });
        };

        match token {
            Token::IntLiteral(value, base, suffix, _) => {
                self.advance();
                Ok(ConstantValue::from_literal(value, base, suffix))
            }
            Token::Ident(name, location) => {
                self.advance();
                match self.symbols.lookup(&name) {
                    Some(value) => Ok(value),
                    None => {
                        Err(UndefinedIdentifierError { name, location }.into())
                    }
                }
            }
            Token::LParen(_) => {
                self.advance();
                let value = self.parse_bitwise_or()?;
                match self.peek() {
                    Some(Token::RParen(_)) => {
                        self.advance();
                        Ok(value)
                    }
                    Some(other) => Err(EvalError::Unexpected {
                        expected: "')'".to_string(),
                        found: other.to_string(),
                        location: other.location(),
                    }),
                    None => Err(EvalError::Unexpected {
                        expected: "')'".to_string(),
                        found: "end of expression".to_string(),
                        location: self.last_location(),
                    }),
                }
            }
            other => Err(EvalError::Unexpected {
                expected: "integer literal, identifier, or '('".to_string(),
                found: other.to_string(),
                location: other.location(),
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn last_location(&self) -> SourceLocation {
        self.tokens
            .last()
            .map(|t| t.location())
            .unwrap_or_else(|| SourceLocation::new(0, 1, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;

    fn eval_str(source: &str) -> Result<ConstantValue, EvalError> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        evaluate(&tokens, &SymbolTable::new())
    }

    fn eval_with(
        source: &str,
        symbols: &SymbolTable,
    ) -> Result<ConstantValue, EvalError> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        evaluate(&tokens, symbols)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval_str("2 + 3 * 4").unwrap().as_i64(), 14);
        assert_eq!(eval_str("1 << 2 + 1").unwrap().as_i64(), 8);
        assert_eq!(eval_str("16 >> 1 + 1").unwrap().as_i64(), 4);
        assert_eq!(eval_str("1 | 2 ^ 3 & 6").unwrap().as_i64(), 1 | (2 ^ (3 & 6)));
    }

    #[test]
    fn test_parens() {
        assert_eq!(eval_str("(2 + 3) * 4").unwrap().as_i64(), 20);
        assert_eq!(eval_str("((7))").unwrap().as_i64(), 7);
    }

    #[test]
    fn test_unary() {
        assert_eq!(eval_str("-5 + 8").unwrap().as_i64(), 3);
        assert_eq!(eval_str("~0").unwrap().as_i64(), -1);
        assert_eq!(eval_str("+7").unwrap().as_i64(), 7);
        assert_eq!(eval_str("-(3 - 5)").unwrap().as_i64(), 2);
    }

    #[test]
    fn test_division() {
        assert_eq!(eval_str("7 / 2").unwrap().as_i64(), 3);
        assert_eq!(eval_str("7 % 2").unwrap().as_i64(), 1);
        assert_eq!(eval_str("-7 / 2").unwrap().as_i64(), -3);

        assert!(matches!(
            eval_str("1 / 0").unwrap_err(),
            EvalError::DivisionByZero(_)
        ));
        assert!(matches!(
            eval_str("1 % (2 - 2)").unwrap_err(),
            EvalError::DivisionByZero(_)
        ));
    }

    #[test]
    fn test_unsigned_conversion() {
        let value = eval_str("0u - 1").unwrap();
        assert!(!value.is_signed());
        assert_eq!(value.as_u64(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_wrapping_overflow() {
        assert_eq!(
            eval_str("2147483647 + 1").unwrap().as_i64(),
            i32::MIN as i64
        );
    }

    #[test]
    fn test_shift_takes_left_type() {
        // count masked to the 32-bit left operand's width
        assert_eq!(eval_str("1 << 33").unwrap().as_i64(), 2);
        let wide = eval_str("1l << 33").unwrap();
        assert_eq!(wide.as_i64(), 1i64 << 33);
        assert_eq!(wide.width(), IntWidth::Bits64);
    }

    #[test]
    fn test_arithmetic_right_shift() {
        assert_eq!(eval_str("-8 >> 1").unwrap().as_i64(), -4);
        assert_eq!(
            eval_str("0x80000000u >> 31").unwrap().as_u64(),
            1
        );
    }

    #[test]
    fn test_literal_typing() {
        let small = eval_str("5").unwrap();
        assert!(small.is_signed());
        assert_eq!(small.width(), IntWidth::Bits32);

        let big = eval_str("2147483648").unwrap();
        assert!(big.is_signed());
        assert_eq!(big.width(), IntWidth::Bits64);

        let unsigned = eval_str("42u").unwrap();
        assert!(!unsigned.is_signed());
        assert_eq!(unsigned.width(), IntWidth::Bits32);
    }

    #[test]
    fn test_hex_literal_typing_takes_the_unsigned_tier() {
        // hex and octal constants above INT_MAX fit `unsigned int`
        let hex = eval_str("0xFFFFFFFF").unwrap();
        assert!(!hex.is_signed());
        assert_eq!(hex.width(), IntWidth::Bits32);

        let octal = eval_str("020000000000").unwrap();
        assert!(!octal.is_signed());
        assert_eq!(octal.width(), IntWidth::Bits32);

        // the same value written in decimal skips straight to `long long`
        let decimal = eval_str("4294967295").unwrap();
        assert!(decimal.is_signed());
        assert_eq!(decimal.width(), IntWidth::Bits64);

        let wide = eval_str("0x100000000").unwrap();
        assert!(wide.is_signed());
        assert_eq!(wide.width(), IntWidth::Bits64);
    }

    #[test]
    fn test_hex_arithmetic_wraps_at_unsigned_int() {
        let wrapped = eval_str("0xFFFFFFFF + 1").unwrap();
        assert!(!wrapped.is_signed());
        assert_eq!(wrapped.as_u64(), 0);

        let negated = eval_str("-0x80000000").unwrap();
        assert!(!negated.is_signed());
        assert_eq!(negated.as_i64(), 2147483648);
    }

    #[test]
    fn test_symbols() {
        let mut symbols = SymbolTable::new();
        symbols.define("GROUP_SIZE", ConstantValue::from(100i32));
        assert_eq!(
            eval_with("GROUP_SIZE * 2 + 1", &symbols).unwrap().as_i64(),
            201
        );
    }

    #[test]
    fn test_undefined_identifier() {
        let err = eval_str("MISSING + 1").unwrap_err();
        let EvalError::UndefinedIdentifier(err) = err else {
            panic!("expected undefined identifier error, got: {err:?}");
        };
        assert_eq!(err.name, "MISSING");
    }

    #[test]
    fn test_enum_shaped_expression() {
        let mut symbols = SymbolTable::new();
        symbols.define("Thing1", ConstantValue::from(100i32));
        symbols.define("Thing2", ConstantValue::from(200i32));
        symbols.define("Thing3a", ConstantValue::from(301i32));
        assert_eq!(
            eval_with("(Thing1 * 3 + Thing2 * 7 + Thing3a * 5) / 5", &symbols)
                .unwrap()
                .as_i64(),
            641
        );
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        assert!(matches!(
            eval_str("1 2").unwrap_err(),
            EvalError::Unexpected { .. }
        ));
        assert!(matches!(
            eval_str("(1").unwrap_err(),
            EvalError::Unexpected { .. }
        ));
    }
}
