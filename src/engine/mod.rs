//! Extraction engine
//!
//! Ties the pipeline together: macro collection and expansion, lexing,
//! declaration parsing, and model building. An [`Extractor`] holds only
//! caller configuration; every `extract` call builds private per-run macro,
//! symbol, and type tables, so one extractor can serve concurrent runs
//! (`extract` takes `&self`).

use crate::ir::{self, IRModule};
use crate::parser::lexer::{LexError, Lexer};
use crate::parser::macros::{
    MacroRecursionError, MacroTable, DEFAULT_RECURSION_LIMIT,
};
use crate::parser::parse::{ParseError, Parser};
use crate::types::resolve::UnknownTypeError;
use tracing::debug;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Nesting bound for recursive macro expansion
    pub macro_recursion_limit: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            macro_recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

/// Error from any stage of an extraction run
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    MacroRecursion(#[from] MacroRecursionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),
}

/// Declaration extraction engine.
///
/// Macro bindings registered with [`define`](Self::define) apply to every
/// run, as if each source began with the corresponding `#define` lines;
/// `#define`s embedded in the source are scanned afterwards, so an embedded
/// redefinition replaces a caller binding.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
    definitions: Vec<(String, String)>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractOptions) -> Self {
        Self {
            options,
            definitions: Vec::new(),
        }
    }

    /// Pre-register an object-like macro binding for later runs.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        value_text: impl Into<String>,
    ) {
        self.definitions.push((name.into(), value_text.into()));
    }

    /// Run the full pipeline over `text` and build the type model.
    pub fn extract(&self, text: &str) -> Result<IRModule, ExtractError> {
        let mut macros = MacroTable::new(self.options.macro_recursion_limit);
        for (name, value_text) in &self.definitions {
            macros.define(name, value_text)?;
        }
        macros.scan_defines(text)?;

        let mut lexer = Lexer::new(text);
        let tokens = lexer.tokenize()?;
        let expanded = macros.expand(&tokens)?;

        let mut parser = Parser::new(expanded);
        let decls = parser.parse_declarations()?;
        debug!(declarations = decls.len(), "parsed declaration stream");

        let module = ir::build(&decls)?;
        debug!(entries = module.len(), "extraction complete");
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Declaration;
    use crate::types::TypeDescriptor;

    fn enumerator_value(module: &IRModule, enum_name: &str, name: &str) -> i64 {
        let Some(Declaration::Enum(e)) = module.get(enum_name) else {
            panic!("expected enum entry for {enum_name}");
        };
        e.get(name).map(|e| e.value.as_i64()).unwrap()
    }

    #[test]
    fn test_embedded_defines_expand() {
        let module = Extractor::new()
            .extract(
                "#define SIZE 4\nstruct Buf { unsigned char data[SIZE]; };",
            )
            .unwrap();

        let Some(Declaration::Record(buf)) = module.get("Buf") else {
            panic!("expected record entry for Buf");
        };
        assert!(matches!(
            buf.members[0].ty,
            TypeDescriptor::Array {
                length: Some(4),
                ..
            }
        ));
    }

    #[test]
    fn test_caller_definitions_apply() {
        let mut extractor = Extractor::new();
        extractor.define("WIDTH", "10");
        let module = extractor.extract("enum E { A = WIDTH * 2 };").unwrap();
        assert_eq!(enumerator_value(&module, "E", "A"), 20);
    }

    #[test]
    fn test_embedded_define_replaces_caller_binding() {
        let mut extractor = Extractor::new();
        extractor.define("W", "1");
        let module = extractor
            .extract("#define W 2\nenum E { A = W };")
            .unwrap();
        assert_eq!(enumerator_value(&module, "E", "A"), 2);
    }

    #[test]
    fn test_recursion_limit_is_an_error() {
        let err = Extractor::new()
            .extract("#define X X\nenum E { A = X };")
            .unwrap_err();
        assert!(matches!(err, ExtractError::MacroRecursion(_)));
    }

    #[test]
    fn test_runs_share_no_state() {
        let extractor = Extractor::new();
        extractor.extract("enum Color { Red };").unwrap();

        let err = extractor.extract("struct S { Color c; };").unwrap_err();
        assert!(matches!(err, ExtractError::UnknownType(_)));
    }

    #[test]
    fn test_syntax_error_surfaces() {
        let err = Extractor::new().extract("int x;").unwrap_err();
        assert!(matches!(err, ExtractError::Parse(ParseError::Syntax(_))));
    }
}
