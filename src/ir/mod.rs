//! Output type model
//!
//! Lowers the parsed declaration list into the crate's output: an ordered
//! mapping from declared name (tag, typedef name, or a synthetic anonymous
//! key) to its enum, record, or typedef entry.

use crate::parser::ast::{ParsedDecl, ParsedTypedef, TagKind, TypeSpecifier};
use crate::types::resolve::{self, NamedKind, TypeRegistry, UnknownTypeError};
use crate::types::{EnumType, RecordType, TypedefDecl};
use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::Serialize;
use tracing::debug;

pub mod render;
pub mod validate;

/// One entry in the output model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Declaration {
    Enum(EnumType),
    Record(RecordType),
    Typedef(TypedefDecl),
}

/// The extracted type model: declarations in source order, addressable by
/// name.
///
/// Anonymous declarations get synthetic keys (`<anonymous-enum-1>`,
/// `<anonymous-struct-2>`, ...) numbered in declaration order. A
/// redefinition replaces the earlier entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IRModule {
    entries: Vec<(String, Declaration)>,
    index: FxHashMap<String, usize>,
}

impl IRModule {
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Declaration)> + '_ {
        self.entries
            .iter()
            .map(|(name, declaration)| (name.as_str(), declaration))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: String, declaration: Declaration) {
        if let Some(&slot) = self.index.get(&name) {
            self.entries[slot] = (name, declaration);
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, declaration));
        }
    }
}

/// Serializes as a name-to-declaration map in declaration order.
impl Serialize for IRModule {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, declaration) in &self.entries {
            map.serialize_entry(name, declaration)?;
        }
        map.end()
    }
}

/// Build the output model from parsed declarations.
///
/// Tags are entered into the type registry before their bodies are lowered,
/// so a body can reference its own tag. Bare name references resolve only
/// against declarations already processed, matching source order.
pub fn build(decls: &[ParsedDecl]) -> Result<IRModule, UnknownTypeError> {
    let mut builder = ModuleBuilder::default();
    for decl in decls {
        builder.add(decl)?;
    }
    Ok(builder.module)
}

#[derive(Default)]
struct ModuleBuilder {
    module: IRModule,
    registry: TypeRegistry,
    anonymous: usize,
}

impl ModuleBuilder {
    fn add(&mut self, decl: &ParsedDecl) -> Result<(), UnknownTypeError> {
        match decl {
            ParsedDecl::Enum(parsed) => {
                if let Some(name) = &parsed.name {
                    self.registry.register(name, NamedKind::Enum);
                }
                let lowered = resolve::lower_enum(parsed);
                let key = self.key_for(parsed.name.as_deref(), "enum");
                debug!(
                    name = %key,
                    enumerators = lowered.enumerators.len(),
                    "built enum declaration"
                );
                self.module.insert(key, Declaration::Enum(lowered));
            }
            ParsedDecl::Record(parsed) => {
                if let Some(name) = &parsed.name {
                    self.registry
                        .register(name, NamedKind::Record(parsed.kind));
                }
                let lowered = resolve::lower_record(parsed, &self.registry)?;
                let key = self
                    .key_for(parsed.name.as_deref(), parsed.kind.keyword());
                debug!(
                    name = %key,
                    members = lowered.members.len(),
                    "built record declaration"
                );
                self.module.insert(key, Declaration::Record(lowered));
            }
            ParsedDecl::Typedef(parsed) => {
                // the grammar requires a named declarator on typedefs
                if let Some(alias) = parsed.declarator.name.clone() {
                    self.add_typedef(&alias, parsed)?;
                }
            }
            ParsedDecl::Forward { kind, name, .. } => {
                let named_kind = match kind {
                    TagKind::Enum => NamedKind::Enum,
                    TagKind::Record(kind) => NamedKind::Record(*kind),
                };
                self.registry.register(name, named_kind);
                debug!(name = %name, "registered forward declaration");
            }
        }
        Ok(())
    }

    fn add_typedef(
        &mut self,
        alias: &str,
        parsed: &ParsedTypedef,
    ) -> Result<(), UnknownTypeError> {
        // `typedef struct { ... } T;` with a plain declarator names the
        // anonymous type itself rather than aliasing it
        if parsed.declarator.ops.is_empty() {
            match &parsed.specifier {
                TypeSpecifier::InlineEnum(inner) if inner.name.is_none() => {
                    let mut lowered = resolve::lower_enum(inner);
                    lowered.name = Some(alias.to_string());
                    self.registry.register(alias, NamedKind::Enum);
                    debug!(name = %alias, "typedef names anonymous enum");
                    self.module
                        .insert(alias.to_string(), Declaration::Enum(lowered));
                    return Ok(());
                }
                TypeSpecifier::InlineRecord(inner)
                    if inner.name.is_none() =>
                {
                    let mut lowered =
                        resolve::lower_record(inner, &self.registry)?;
                    lowered.name = Some(alias.to_string());
                    self.registry
                        .register(alias, NamedKind::Record(inner.kind));
                    debug!(name = %alias, "typedef names anonymous record");
                    self.module.insert(
                        alias.to_string(),
                        Declaration::Record(lowered),
                    );
                    return Ok(());
                }
                _ => {}
            }
        }

        // a named inline body declares its tag at file scope; the alias then
        // refers to it by name
        let rewritten = self.hoist_named_inline(&parsed.specifier)?;
        let specifier = rewritten.as_ref().unwrap_or(&parsed.specifier);
        let underlying = resolve::resolve(
            specifier,
            &parsed.declarator,
            &self.registry,
        )?;

        self.registry.register(alias, NamedKind::Typedef);
        debug!(name = %alias, "built typedef declaration");
        self.module.insert(
            alias.to_string(),
            Declaration::Typedef(TypedefDecl {
                name: alias.to_string(),
                underlying,
                is_const: parsed.is_const,
                is_volatile: parsed.is_volatile,
            }),
        );
        Ok(())
    }

    /// If the specifier is an inline definition with a tag, enter the tag as
    /// its own declaration and return an elaborated reference to use in its
    /// place.
    fn hoist_named_inline(
        &mut self,
        specifier: &TypeSpecifier,
    ) -> Result<Option<TypeSpecifier>, UnknownTypeError> {
        match specifier {
            TypeSpecifier::InlineEnum(inner) => {
                let Some(tag) = inner.name.clone() else {
                    return Ok(None);
                };
                self.registry.register(&tag, NamedKind::Enum);
                let lowered = resolve::lower_enum(inner);
                self.module.insert(tag.clone(), Declaration::Enum(lowered));
                Ok(Some(TypeSpecifier::Elaborated {
                    kind: TagKind::Enum,
                    name: tag,
                    location: inner.location,
                }))
            }
            TypeSpecifier::InlineRecord(inner) => {
                let Some(tag) = inner.name.clone() else {
                    return Ok(None);
                };
                self.registry.register(&tag, NamedKind::Record(inner.kind));
                let lowered = resolve::lower_record(inner, &self.registry)?;
                self.module
                    .insert(tag.clone(), Declaration::Record(lowered));
                Ok(Some(TypeSpecifier::Elaborated {
                    kind: TagKind::Record(inner.kind),
                    name: tag,
                    location: inner.location,
                }))
            }
            _ => Ok(None),
        }
    }

    fn key_for(&mut self, name: Option<&str>, kind_word: &str) -> String {
        match name {
            Some(name) => name.to_string(),
            None => {
                self.anonymous += 1;
                format!("<anonymous-{}-{}>", kind_word, self.anonymous)
            }
        }
    }
}
