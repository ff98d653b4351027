//! Canonical type model
//!
//! The structural vocabulary of the IR: primitive kinds with their fixed or
//! platform-defined widths, record kinds, and the recursive
//! [`TypeDescriptor`] tree built by the resolver. Descriptors compare and
//! hash structurally, so every spelling of a primitive type (`unsigned long
//! int` vs `long unsigned`) lands on the same value and two identically
//! shaped descriptors are equal regardless of how they were written.

pub mod resolve;

use crate::eval::ConstantValue;
use serde::Serialize;
use std::fmt;

/// Bit width of a primitive kind.
///
/// `Exact` where the standard plus all mainstream ABIs pin the width;
/// `AtLeast` where the platform chooses (`long`, `wchar_t`, `long double`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Width {
    Exact(u16),
    AtLeast(u16),
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Width::Exact(bits) => write!(f, "{} bits", bits),
            Width::AtLeast(bits) => {
                write!(f, "platform-defined, >= {} bits", bits)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// Canonical primitive type kinds.
///
/// One variant per distinct C/C++ primitive type; the resolver maps every
/// keyword ordering onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Char8,
    Char16,
    Char32,
    WChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
}

impl PrimitiveKind {
    /// Canonical spelling, used for rendering and diagnostics.
    pub fn spelling(&self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::SignedChar => "signed char",
            PrimitiveKind::UnsignedChar => "unsigned char",
            PrimitiveKind::Char8 => "char8_t",
            PrimitiveKind::Char16 => "char16_t",
            PrimitiveKind::Char32 => "char32_t",
            PrimitiveKind::WChar => "wchar_t",
            PrimitiveKind::Short => "short",
            PrimitiveKind::UnsignedShort => "unsigned short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::UnsignedInt => "unsigned int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::UnsignedLong => "unsigned long",
            PrimitiveKind::LongLong => "long long",
            PrimitiveKind::UnsignedLongLong => "unsigned long long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::LongDouble => "long double",
        }
    }

    /// Bit width, `None` for `void`.
    pub fn width(&self) -> Option<Width> {
        match self {
            PrimitiveKind::Void => None,
            PrimitiveKind::Bool
            | PrimitiveKind::Char
            | PrimitiveKind::SignedChar
            | PrimitiveKind::UnsignedChar
            | PrimitiveKind::Char8 => Some(Width::Exact(8)),
            PrimitiveKind::Char16 => Some(Width::Exact(16)),
            PrimitiveKind::Char32 => Some(Width::Exact(32)),
            PrimitiveKind::WChar => Some(Width::AtLeast(16)),
            PrimitiveKind::Short | PrimitiveKind::UnsignedShort => {
                Some(Width::Exact(16))
            }
            PrimitiveKind::Int | PrimitiveKind::UnsignedInt => {
                Some(Width::Exact(32))
            }
            PrimitiveKind::Long | PrimitiveKind::UnsignedLong => {
                Some(Width::AtLeast(32))
            }
            PrimitiveKind::LongLong | PrimitiveKind::UnsignedLongLong => {
                Some(Width::Exact(64))
            }
            PrimitiveKind::Float => Some(Width::Exact(32)),
            PrimitiveKind::Double => Some(Width::Exact(64)),
            PrimitiveKind::LongDouble => Some(Width::AtLeast(64)),
        }
    }

    /// Signedness, `None` where the standard leaves it to the platform
    /// (`char`, `wchar_t`) or it does not apply (`void`, floating kinds).
    pub fn signedness(&self) -> Option<Signedness> {
        match self {
            PrimitiveKind::Void
            | PrimitiveKind::Char
            | PrimitiveKind::WChar
            | PrimitiveKind::Float
            | PrimitiveKind::Double
            | PrimitiveKind::LongDouble => None,
            PrimitiveKind::SignedChar
            | PrimitiveKind::Short
            | PrimitiveKind::Int
            | PrimitiveKind::Long
            | PrimitiveKind::LongLong => Some(Signedness::Signed),
            PrimitiveKind::Bool
            | PrimitiveKind::UnsignedChar
            | PrimitiveKind::Char8
            | PrimitiveKind::Char16
            | PrimitiveKind::Char32
            | PrimitiveKind::UnsignedShort
            | PrimitiveKind::UnsignedInt
            | PrimitiveKind::UnsignedLong
            | PrimitiveKind::UnsignedLongLong => Some(Signedness::Unsigned),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

/// Record flavor: `struct`, `class`, or `union`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Struct,
    Class,
    Union,
}

impl RecordKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RecordKind::Struct => "struct",
            RecordKind::Class => "class",
            RecordKind::Union => "union",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Reference to an enum type: by name, or an owned anonymous definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumRef {
    Named(String),
    Inline(Box<EnumType>),
}

/// Reference to a record type: by name, or an owned anonymous definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordRef {
    Named(String),
    Inline(Box<RecordType>),
}

/// The recursive type shape of a declarator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    /// Reference to a typedef by name
    Named(String),
    Pointer(Box<TypeDescriptor>),
    Reference(Box<TypeDescriptor>),
    Array {
        element: Box<TypeDescriptor>,
        /// `None` for an incomplete array (`[]`)
        length: Option<u64>,
    },
    MemberPointer {
        owner: String,
        pointee: Box<TypeDescriptor>,
    },
    FunctionPointer {
        return_type: Box<TypeDescriptor>,
        params: Vec<TypeDescriptor>,
        variadic: bool,
    },
    Enum(EnumRef),
    Record(RecordRef),
}

/// A named enum constant with its resolved value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Enumerator {
    pub name: String,
    pub value: ConstantValue,
}

/// An enum declaration: ordered enumerators with resolved values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnumType {
    /// `None` for an anonymous enum
    pub name: Option<String>,
    pub enumerators: Vec<Enumerator>,
}

impl EnumType {
    /// Look up an enumerator by name.
    pub fn get(&self, name: &str) -> Option<&Enumerator> {
        self.enumerators.iter().find(|e| e.name == name)
    }
}

/// One record member.
///
/// `name` is `None` for anonymous aggregate members and unnamed bit-fields;
/// an unnamed member's type is then an inline enum/record or the bit-field's
/// primitive type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Member {
    pub name: Option<String>,
    pub ty: TypeDescriptor,
    pub bit_width: Option<u64>,
}

/// A struct/class/union declaration with its ordered members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordType {
    /// `None` for an anonymous record
    pub name: Option<String>,
    pub kind: RecordKind,
    /// Base type names, in declaration order
    pub bases: Vec<String>,
    pub members: Vec<Member>,
}

impl RecordType {
    /// Look up a directly named member.
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.name.as_deref() == Some(name))
    }
}

/// A typedef alias with its qualifier flags
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypedefDecl {
    pub name: String,
    pub underlying: TypeDescriptor,
    pub is_const: bool,
    pub is_volatile: bool,
}
