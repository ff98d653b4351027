//! # Introduction
//!
//! Chisel extracts a structured type model from C/C++ header declarations.
//! It parses `enum`, `struct`, `class`, `union`, and `typedef` declarations
//! from preprocessed header text, evaluates constant expressions under C
//! integer semantics, and produces an ordered, serializable module of
//! canonical type descriptions for binding and reflection generators.
//!
//! ## Extraction pipeline
//!
//! ```text
//! Source → Macro expansion → Lexer → Parser → Resolver → IRModule
//! ```
//!
//! 1. [`parser`] — collects object-like `#define`s, tokenises the source,
//!    expands macros, and parses the declaration grammar, evaluating
//!    constant expressions as it goes.
//! 2. [`eval`] — C integer constant semantics: typed 32/64-bit values,
//!    usual arithmetic conversions, wrapping arithmetic.
//! 3. [`types`] — canonical type descriptors and the specifier/declarator
//!    resolver.
//! 4. [`ir`] — the output model: an ordered name-to-declaration mapping
//!    with validation and a stable text rendering.
//! 5. [`engine`] — the [`Extractor`] front door tying the stages together.
//!
//! ## Scope
//!
//! The engine consumes text that is already conditional-resolved: it skips
//! preprocessor directives other than object-like `#define` and models
//! declarations only. Type layout (sizes, alignment, field offsets) is out
//! of scope; primitive widths are reported as the standard fixes them, or as
//! platform-defined lower bounds.
//!
//! ## Example
//!
//! ```
//! use chisel::{Declaration, Extractor};
//!
//! let module = Extractor::new().extract(
//!     r#"
//!     #define GROUP_SIZE 4
//!     enum Flags { ReadFlag = 1 << 0, WriteFlag = 1 << 1 };
//!     struct Header {
//!         Flags flags;
//!         unsigned char payload[GROUP_SIZE * 8];
//!     };
//!     "#,
//! )?;
//!
//! let Some(Declaration::Enum(flags)) = module.get("Flags") else {
//!     panic!("Flags missing");
//! };
//! assert_eq!(flags.get("WriteFlag").map(|e| e.value.as_i64()), Some(2));
//! # Ok::<(), chisel::ExtractError>(())
//! ```

pub mod engine;
pub mod eval;
pub mod ir;
pub mod parser;
pub mod types;

pub use engine::{ExtractError, ExtractOptions, Extractor};
pub use ir::validate::{validate, ValidationError};
pub use ir::{Declaration, IRModule};
pub use types::TypeDescriptor;
