//! C/C++ header declaration parser
//!
//! This module transforms declaration source text into parse trees:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`macros`]: Object-like `#define` collection and expansion
//! - [`parse`]: Parsing (tokens → parsed declarations)
//! - [`ast`]: Parse-tree node definitions
//!
//! # Supported declaration subset
//!
//! - `enum` definitions with constant-expression initializers
//! - `struct`/`class`/`union` definitions with base lists, bit-fields,
//!   anonymous nested aggregates, and access labels
//! - `typedef` declarations, including typedefs of inline definitions
//! - Declarators: pointers, references, arrays, function pointers,
//!   pointers to members
//! - Forward declarations of tags
//! - Declarations only: no statements, no function bodies
//! - No preprocessor beyond object-like `#define` (other directive lines
//!   are skipped)
//!
//! # Parser implementation
//!
//! Hand-written recursive descent parser that evaluates constant expressions
//! directly while parsing. No external parser generator dependencies.

pub mod ast;
pub mod lexer;
pub mod macros;
pub mod parse;

mod declarations;
mod declarators;
