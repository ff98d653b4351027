// Parse-tree definitions for header declarations

use crate::eval::ConstantValue;
use crate::types::RecordKind;
use std::fmt;

/// Source position for error reporting: byte offset plus 1-based line/column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "offset {} (line {}, column {})",
            self.offset, self.line, self.column
        )
    }
}

/// Primitive type keywords as they appear in the source.
///
/// The parser collects them in spelling order without interpreting the
/// combination; canonicalization (`long long unsigned int` vs
/// `unsigned long long`) happens in the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKeyword {
    Unsigned,
    Signed,
    Long,
    Short,
    Int,
    Char,
    Float,
    Double,
    Bool,
    Void,
    WCharT,
    Char8T,
    Char16T,
    Char32T,
}

impl fmt::Display for PrimitiveKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveKeyword::Unsigned => "unsigned",
            PrimitiveKeyword::Signed => "signed",
            PrimitiveKeyword::Long => "long",
            PrimitiveKeyword::Short => "short",
            PrimitiveKeyword::Int => "int",
            PrimitiveKeyword::Char => "char",
            PrimitiveKeyword::Float => "float",
            PrimitiveKeyword::Double => "double",
            PrimitiveKeyword::Bool => "bool",
            PrimitiveKeyword::Void => "void",
            PrimitiveKeyword::WCharT => "wchar_t",
            PrimitiveKeyword::Char8T => "char8_t",
            PrimitiveKeyword::Char16T => "char16_t",
            PrimitiveKeyword::Char32T => "char32_t",
        };
        write!(f, "{}", s)
    }
}

/// The keyword introducing a tag: `enum`, `struct`, `class`, or `union`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Enum,
    Record(RecordKind),
}

/// The base-type part of a member or typedef declaration
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpecifier {
    /// One or more primitive keywords in spelling order
    Primitive {
        keywords: Vec<PrimitiveKeyword>,
        location: SourceLocation,
    },
    /// A bare tag or typedef name
    Named {
        name: String,
        location: SourceLocation,
    },
    /// An elaborated reference such as `struct Node` without a body
    Elaborated {
        kind: TagKind,
        name: String,
        location: SourceLocation,
    },
    /// An inline `enum [tag] { ... }` definition
    InlineEnum(ParsedEnum),
    /// An inline `struct`/`class`/`union` `[tag] { ... }` definition
    InlineRecord(ParsedRecord),
}

impl TypeSpecifier {
    pub fn location(&self) -> SourceLocation {
        match self {
            TypeSpecifier::Primitive { location, .. }
            | TypeSpecifier::Named { location, .. }
            | TypeSpecifier::Elaborated { location, .. } => *location,
            TypeSpecifier::InlineEnum(e) => e.location,
            TypeSpecifier::InlineRecord(r) => r.location,
        }
    }
}

/// One layer of declarator shape.
///
/// A declarator's layers are stored in the order they are read from the
/// identifier outward: suffixes before prefixes within one nesting level,
/// inner parenthesized levels before outer ones. `int *a[3]` therefore
/// stores `[Array(3), Pointer]` ("a is an array of 3 pointers to int"),
/// while `int (*p)[3]` stores `[Pointer, Array(3)]`. The resolver folds
/// the list from the end, wrapping the base type one layer at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaratorOp {
    Pointer,
    Reference,
    /// `ClassName::*` prefix
    MemberPointer { class_name: String },
    /// `[N]` suffix; `None` for an incomplete `[]`
    Array { length: Option<u64> },
    /// `(params)` suffix of a function-pointer declarator
    Function {
        params: Vec<ParamDecl>,
        variadic: bool,
    },
}

/// A declarator: optional identifier plus its shape layers
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Option<String>,
    pub ops: Vec<DeclaratorOp>,
    pub location: SourceLocation,
}

impl Declarator {
    /// An empty declarator for members declared without one
    /// (anonymous nested aggregates)
    pub fn anonymous(location: SourceLocation) -> Self {
        Declarator {
            name: None,
            ops: Vec::new(),
            location,
        }
    }
}

/// A parameter inside a function-pointer declarator's list
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub specifier: TypeSpecifier,
    pub declarator: Declarator,
}

/// One enumerator with its resolved value.
///
/// Values are evaluated during parsing so that later enumerators can
/// reference earlier ones by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEnumerator {
    pub name: String,
    pub value: ConstantValue,
    pub location: SourceLocation,
}

/// A parsed `enum [tag] { ... }` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEnum {
    pub name: Option<String>,
    pub enumerators: Vec<ParsedEnumerator>,
    pub location: SourceLocation,
}

/// A parsed record member: base type, declarator, optional bit-field width
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMember {
    pub specifier: TypeSpecifier,
    pub declarator: Declarator,
    pub bit_width: Option<u64>,
    pub location: SourceLocation,
}

/// A parsed `struct`/`class`/`union` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub name: Option<String>,
    pub kind: RecordKind,
    pub bases: Vec<String>,
    pub members: Vec<ParsedMember>,
    pub location: SourceLocation,
}

/// A parsed `typedef <specifier> <declarator>;` declaration.
///
/// The new name is the declarator's identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTypedef {
    pub specifier: TypeSpecifier,
    pub declarator: Declarator,
    pub is_const: bool,
    pub is_volatile: bool,
    pub location: SourceLocation,
}

/// A top-level declaration in the input fragment
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDecl {
    Enum(ParsedEnum),
    Record(ParsedRecord),
    Typedef(ParsedTypedef),
    /// `struct X;` and friends: registers the tag, produces no IR entry
    Forward {
        kind: TagKind,
        name: String,
        location: SourceLocation,
    },
}
