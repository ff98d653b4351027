//! Canonical plain-text rendering
//!
//! `Display` on [`IRModule`] produces a stable dump of the extracted model:
//! one block per declaration in source order, byte-identical across runs for
//! identical input. Type shapes render in a linear prefix notation
//! (`array[3] of pointer to int`) rather than C declarator syntax.

use crate::ir::{Declaration, IRModule};
use crate::types::{
    EnumRef, EnumType, RecordRef, RecordType, TypeDescriptor,
};
use std::fmt;

impl fmt::Display for IRModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, declaration) in self.iter() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            match declaration {
                Declaration::Enum(e) => write_enum_block(f, name, e)?,
                Declaration::Record(r) => write_record_block(f, name, r)?,
                Declaration::Typedef(t) => {
                    write!(f, "typedef {} = ", name)?;
                    if t.is_const {
                        f.write_str("const ")?;
                    }
                    if t.is_volatile {
                        f.write_str("volatile ")?;
                    }
                    writeln!(f, "{};", t.underlying)?;
                }
            }
        }
        Ok(())
    }
}

fn write_enum_block(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    e: &EnumType,
) -> fmt::Result {
    writeln!(f, "enum {} {{", name)?;
    for enumerator in &e.enumerators {
        writeln!(f, "    {} = {},", enumerator.name, enumerator.value)?;
    }
    writeln!(f, "}}")
}

fn write_record_block(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    r: &RecordType,
) -> fmt::Result {
    write!(f, "{} {}", r.kind.keyword(), name)?;
    if !r.bases.is_empty() {
        write!(f, " : {}", r.bases.join(", "))?;
    }
    writeln!(f, " {{")?;
    for member in &r.members {
        write!(
            f,
            "    {}: {}",
            member.name.as_deref().unwrap_or("<anonymous>"),
            member.ty
        )?;
        if let Some(width) = member.bit_width {
            write!(f, " : {}", width)?;
        }
        writeln!(f, ";")?;
    }
    writeln!(f, "}}")
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(kind) => write!(f, "{}", kind),
            TypeDescriptor::Named(name) => f.write_str(name),
            TypeDescriptor::Pointer(inner) => {
                write!(f, "pointer to {}", inner)
            }
            TypeDescriptor::Reference(inner) => {
                write!(f, "reference to {}", inner)
            }
            TypeDescriptor::Array { element, length } => match length {
                Some(n) => write!(f, "array[{}] of {}", n, element),
                None => write!(f, "array[] of {}", element),
            },
            TypeDescriptor::MemberPointer { owner, pointee } => {
                write!(f, "{}-member pointer to {}", owner, pointee)
            }
            TypeDescriptor::FunctionPointer {
                return_type,
                params,
                variadic,
            } => {
                f.write_str("function(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                if *variadic {
                    if !params.is_empty() {
                        f.write_str(", ")?;
                    }
                    f.write_str("...")?;
                }
                write!(f, ") returning {}", return_type)
            }
            TypeDescriptor::Enum(EnumRef::Named(name)) => {
                write!(f, "enum {}", name)
            }
            TypeDescriptor::Enum(EnumRef::Inline(e)) => {
                write_inline_enum(f, e)
            }
            TypeDescriptor::Record(RecordRef::Named(name)) => {
                write!(f, "record {}", name)
            }
            TypeDescriptor::Record(RecordRef::Inline(r)) => {
                write_inline_record(f, r)
            }
        }
    }
}

fn write_inline_enum(
    f: &mut fmt::Formatter<'_>,
    e: &EnumType,
) -> fmt::Result {
    f.write_str("enum")?;
    if let Some(name) = &e.name {
        write!(f, " {}", name)?;
    }
    if e.enumerators.is_empty() {
        return f.write_str(" { }");
    }
    f.write_str(" { ")?;
    for (i, enumerator) in e.enumerators.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{} = {}", enumerator.name, enumerator.value)?;
    }
    f.write_str(" }")
}

fn write_inline_record(
    f: &mut fmt::Formatter<'_>,
    r: &RecordType,
) -> fmt::Result {
    f.write_str(r.kind.keyword())?;
    if let Some(name) = &r.name {
        write!(f, " {}", name)?;
    }
    if !r.bases.is_empty() {
        write!(f, " : {}", r.bases.join(", "))?;
    }
    if r.members.is_empty() {
        return f.write_str(" { }");
    }
    f.write_str(" { ")?;
    for member in &r.members {
        write!(
            f,
            "{}: {}",
            member.name.as_deref().unwrap_or("<anonymous>"),
            member.ty
        )?;
        if let Some(width) = member.bit_width {
            write!(f, " : {}", width)?;
        }
        f.write_str("; ")?;
    }
    f.write_str("}")
}
