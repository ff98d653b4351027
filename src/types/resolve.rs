//! Type descriptor resolution
//!
//! Turns a parsed `(specifier, declarator)` pair into a canonical
//! [`TypeDescriptor`]: primitive keyword multisets collapse onto one
//! [`PrimitiveKind`] regardless of spelling order, named references are
//! classified against the run's [`TypeRegistry`], and declarator layers fold
//! into nested descriptors from the innermost binding outward.

use super::{
    EnumRef, EnumType, Enumerator, Member, PrimitiveKind, RecordRef,
    RecordType, TypeDescriptor,
};
use crate::parser::ast::{
    Declarator, DeclaratorOp, ParamDecl, ParsedEnum, ParsedRecord,
    PrimitiveKeyword, SourceLocation, TagKind, TypeSpecifier,
};
use crate::types::RecordKind;
use rustc_hash::FxHashMap;

/// Error when a bare type name cannot be resolved, or primitive keywords
/// form no valid type
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown type '{name}' at {location}")]
pub struct UnknownTypeError {
    pub name: String,
    pub location: SourceLocation,
}

/// What a registered name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKind {
    Enum,
    Record(RecordKind),
    Typedef,
}

/// Per-run table of declared type names.
///
/// Tags are registered as soon as their declaration starts, before member
/// resolution, so a record body can reference its own tag
/// (`bool BasicTypes::*memptr` inside `BasicTypes`).
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: FxHashMap<String, NamedKind>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, kind: NamedKind) {
        self.entries.insert(name.to_string(), kind);
    }

    pub fn lookup(&self, name: &str) -> Option<NamedKind> {
        self.entries.get(name).copied()
    }
}

/// Resolve a specifier and declarator into a canonical descriptor.
pub fn resolve(
    specifier: &TypeSpecifier,
    declarator: &Declarator,
    registry: &TypeRegistry,
) -> Result<TypeDescriptor, UnknownTypeError> {
    let base = resolve_specifier(specifier, registry)?;
    fold_declarator(base, declarator, registry)
}

fn resolve_specifier(
    specifier: &TypeSpecifier,
    registry: &TypeRegistry,
) -> Result<TypeDescriptor, UnknownTypeError> {
    match specifier {
        TypeSpecifier::Primitive { keywords, location } => Ok(
            TypeDescriptor::Primitive(canonicalize_primitive(keywords, *location)?),
        ),
        TypeSpecifier::Named { name, location } => {
            match registry.lookup(name) {
                Some(NamedKind::Enum) => {
                    Ok(TypeDescriptor::Enum(EnumRef::Named(name.clone())))
                }
                Some(NamedKind::Record(_)) => {
                    Ok(TypeDescriptor::Record(RecordRef::Named(name.clone())))
                }
                Some(NamedKind::Typedef) => {
                    Ok(TypeDescriptor::Named(name.clone()))
                }
                None => Err(UnknownTypeError {
                    name: name.clone(),
                    location: *location,
                }),
            }
        }
        // an elaborated reference to an undeclared tag acts as an implicit
        // forward declaration
        TypeSpecifier::Elaborated { kind, name, .. } => match kind {
            TagKind::Enum => {
                Ok(TypeDescriptor::Enum(EnumRef::Named(name.clone())))
            }
            TagKind::Record(_) => {
                Ok(TypeDescriptor::Record(RecordRef::Named(name.clone())))
            }
        },
        TypeSpecifier::InlineEnum(parsed) => Ok(TypeDescriptor::Enum(
            EnumRef::Inline(Box::new(lower_enum(parsed))),
        )),
        TypeSpecifier::InlineRecord(parsed) => Ok(TypeDescriptor::Record(
            RecordRef::Inline(Box::new(lower_record(parsed, registry)?)),
        )),
    }
}

/// Collapse a primitive keyword multiset onto its canonical kind.
///
/// Accepts every legal ordering (`long long unsigned int`,
/// `unsigned long long`, ...); rejects contradictory or repeated keywords
/// (`unsigned float`, `long long long`, `signed unsigned`).
fn canonicalize_primitive(
    keywords: &[PrimitiveKeyword],
    location: SourceLocation,
) -> Result<PrimitiveKind, UnknownTypeError> {
    let mut unsigned = 0usize;
    let mut signed = 0usize;
    let mut long_count = 0usize;
    let mut short = 0usize;
    let mut int = 0usize;
    let mut chars = 0usize;
    let mut float = 0usize;
    let mut double = 0usize;
    let mut bools = 0usize;
    let mut voids = 0usize;
    let mut wchar = 0usize;
    let mut char8 = 0usize;
    let mut char16 = 0usize;
    let mut char32 = 0usize;

    for keyword in keywords {
        match keyword {
            PrimitiveKeyword::Unsigned => unsigned += 1,
            PrimitiveKeyword::Signed => signed += 1,
            PrimitiveKeyword::Long => long_count += 1,
            PrimitiveKeyword::Short => short += 1,
            PrimitiveKeyword::Int => int += 1,
            PrimitiveKeyword::Char => chars += 1,
            PrimitiveKeyword::Float => float += 1,
            PrimitiveKeyword::Double => double += 1,
            PrimitiveKeyword::Bool => bools += 1,
            PrimitiveKeyword::Void => voids += 1,
            PrimitiveKeyword::WCharT => wchar += 1,
            PrimitiveKeyword::Char8T => char8 += 1,
            PrimitiveKeyword::Char16T => char16 += 1,
            PrimitiveKeyword::Char32T => char32 += 1,
        }
    }

    let invalid = || UnknownTypeError {
        name: keywords
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        location,
    };

    if unsigned > 1
        || signed > 1
        || (unsigned == 1 && signed == 1)
        || short > 1
        || int > 1
        || chars > 1
        || float > 1
        || double > 1
        || bools > 1
        || voids > 1
        || wchar > 1
        || char8 > 1
        || char16 > 1
        || char32 > 1
        || long_count > 2
    {
        return Err(invalid());
    }

    // keywords that stand alone
    let standalone = [
        (voids, PrimitiveKind::Void),
        (bools, PrimitiveKind::Bool),
        (wchar, PrimitiveKind::WChar),
        (char8, PrimitiveKind::Char8),
        (char16, PrimitiveKind::Char16),
        (char32, PrimitiveKind::Char32),
        (float, PrimitiveKind::Float),
    ];
    for (count, kind) in standalone {
        if count == 1 {
            if keywords.len() != 1 {
                return Err(invalid());
            }
            return Ok(kind);
        }
    }

    if double == 1 {
        if unsigned + signed + short + int + chars > 0 || long_count > 1 {
            return Err(invalid());
        }
        return Ok(if long_count == 1 {
            PrimitiveKind::LongDouble
        } else {
            PrimitiveKind::Double
        });
    }

    if chars == 1 {
        if long_count + short + int > 0 {
            return Err(invalid());
        }
        return Ok(if unsigned == 1 {
            PrimitiveKind::UnsignedChar
        } else if signed == 1 {
            PrimitiveKind::SignedChar
        } else {
            PrimitiveKind::Char
        });
    }

    if short == 1 {
        if long_count > 0 {
            return Err(invalid());
        }
        return Ok(if unsigned == 1 {
            PrimitiveKind::UnsignedShort
        } else {
            PrimitiveKind::Short
        });
    }

    if long_count == 2 {
        return Ok(if unsigned == 1 {
            PrimitiveKind::UnsignedLongLong
        } else {
            PrimitiveKind::LongLong
        });
    }

    if long_count == 1 {
        return Ok(if unsigned == 1 {
            PrimitiveKind::UnsignedLong
        } else {
            PrimitiveKind::Long
        });
    }

    if int == 1 || signed == 1 || unsigned == 1 {
        return Ok(if unsigned == 1 {
            PrimitiveKind::UnsignedInt
        } else {
            PrimitiveKind::Int
        });
    }

    Err(invalid())
}

/// Fold declarator layers around the base descriptor.
///
/// Layers are stored in read order from the identifier outward, so folding
/// walks them from the end. A `Function` layer absorbs the `Pointer` layer
/// directly inside it: `(*fp)(int)` is one `FunctionPointer` node, not a
/// pointer wrapping a function.
fn fold_declarator(
    base: TypeDescriptor,
    declarator: &Declarator,
    registry: &TypeRegistry,
) -> Result<TypeDescriptor, UnknownTypeError> {
    let ops = &declarator.ops;
    let mut descriptor = base;
    let mut index = ops.len();

    while index > 0 {
        index -= 1;
        descriptor = match &ops[index] {
            DeclaratorOp::Pointer => {
                TypeDescriptor::Pointer(Box::new(descriptor))
            }
            DeclaratorOp::Reference => {
                TypeDescriptor::Reference(Box::new(descriptor))
            }
            DeclaratorOp::MemberPointer { class_name } => {
                TypeDescriptor::MemberPointer {
                    owner: class_name.clone(),
                    pointee: Box::new(descriptor),
                }
            }
            DeclaratorOp::Array { length } => TypeDescriptor::Array {
                element: Box::new(descriptor),
                length: *length,
            },
            DeclaratorOp::Function { params, variadic } => {
                if index > 0
                    && matches!(ops[index - 1], DeclaratorOp::Pointer)
                {
                    index -= 1;
                }
                TypeDescriptor::FunctionPointer {
                    return_type: Box::new(descriptor),
                    params: resolve_params(params, registry)?,
                    variadic: *variadic,
                }
            }
        };
    }

    Ok(descriptor)
}

fn resolve_params(
    params: &[ParamDecl],
    registry: &TypeRegistry,
) -> Result<Vec<TypeDescriptor>, UnknownTypeError> {
    params
        .iter()
        .map(|param| resolve(&param.specifier, &param.declarator, registry))
        .collect()
}

/// Lower a parsed enum into its IR node.
pub fn lower_enum(parsed: &ParsedEnum) -> EnumType {
    EnumType {
        name: parsed.name.clone(),
        enumerators: parsed
            .enumerators
            .iter()
            .map(|e| Enumerator {
                name: e.name.clone(),
                value: e.value,
            })
            .collect(),
    }
}

/// Lower a parsed record into its IR node, resolving every member.
pub fn lower_record(
    parsed: &ParsedRecord,
    registry: &TypeRegistry,
) -> Result<RecordType, UnknownTypeError> {
    let mut members = Vec::with_capacity(parsed.members.len());
    for member in &parsed.members {
        let ty = resolve(&member.specifier, &member.declarator, registry)?;
        members.push(Member {
            name: member.declarator.name.clone(),
            ty,
            bit_width: member.bit_width,
        });
    }

    Ok(RecordType {
        name: parsed.name.clone(),
        kind: parsed.kind,
        bases: parsed.bases.clone(),
        members,
    })
}
