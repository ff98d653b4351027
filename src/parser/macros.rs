//! Object-like macro table
//!
//! Holds `name -> replacement tokens` bindings and expands identifiers in a
//! token stream before parsing. Bindings come from two places: callers
//! pre-registering definitions, and `#define` lines scanned out of the
//! source text (the lexer itself discards directive lines). Function-like
//! macros are not modeled; their `#define` lines are recognized and skipped.
//!
//! Expansion is recursive with a depth limit. A macro whose replacement
//! reaches the limit (including one that mentions itself) fails with
//! [`MacroRecursionError`] rather than being left unexpanded.

use super::ast::SourceLocation;
use super::lexer::{LexError, Lexer, Token};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Default expansion depth limit. Real headers nest a handful deep; anything
/// approaching this is a definition cycle.
pub const DEFAULT_RECURSION_LIMIT: usize = 64;

/// Error when macro expansion exceeds the recursion limit
#[derive(Debug, Clone, thiserror::Error)]
#[error("macro recursion limit exceeded while expanding '{name}' at {location}")]
pub struct MacroRecursionError {
    pub name: String,
    pub location: SourceLocation,
}

/// Table of object-like macro definitions
pub struct MacroTable {
    macros: FxHashMap<String, Vec<Token>>,
    recursion_limit: usize,
}

impl MacroTable {
    pub fn new(recursion_limit: usize) -> Self {
        Self {
            macros: FxHashMap::default(),
            recursion_limit,
        }
    }

    /// Register `name` with a replacement lexed from `replacement` text.
    ///
    /// An empty replacement is valid and expands to nothing. Redefining a
    /// name replaces the earlier binding.
    pub fn define(
        &mut self,
        name: &str,
        replacement: &str,
    ) -> Result<(), LexError> {
        let mut lexer = Lexer::new(replacement);
        let mut tokens = lexer.tokenize()?;
        if matches!(tokens.last(), Some(Token::Eof(_))) {
            tokens.pop();
        }
        trace!(name, token_count = tokens.len(), "macro defined");
        self.macros.insert(name.to_string(), tokens);
        Ok(())
    }

    /// Scan `source` for `#define` directive lines and register each
    /// object-like definition found.
    ///
    /// Comment text is blanked first, with the lexer's comment and string
    /// rules, so a `#define` inside a `/* */` block or behind `//` is never
    /// registered. Backslash-newline continuations are joined next, so a
    /// continued replacement is read whole and a continued ordinary line can
    /// never be misread as starting a directive. Function-like definitions
    /// (`(` immediately after the name) are skipped.
    pub fn scan_defines(&mut self, source: &str) -> Result<(), LexError> {
        let stripped = strip_comments(source);
        let mut lines = stripped.lines();
        let mut logical = String::new();

        while let Some(line) = lines.next() {
            logical.clear();
            let mut current = line;
            loop {
                let trimmed = current.trim_end();
                if let Some(stripped) = trimmed.strip_suffix('\\') {
                    logical.push_str(stripped);
                    logical.push(' ');
                    match lines.next() {
                        Some(next) => current = next,
                        None => break,
                    }
                } else {
                    logical.push_str(current);
                    break;
                }
            }
            self.scan_define_line(&logical)?;
        }

        Ok(())
    }

    fn scan_define_line(&mut self, line: &str) -> Result<(), LexError> {
        let rest = line.trim_start();
        let Some(rest) = rest.strip_prefix('#') else {
            return Ok(());
        };
        let rest = rest.trim_start();
        let Some(rest) = rest.strip_prefix("define") else {
            return Ok(());
        };
        // "#defineFOO" is some other directive, not a define
        if !rest.starts_with(|c: char| c.is_whitespace()) {
            return Ok(());
        }
        let rest = rest.trim_start();

        let name_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if name_end == 0 {
            return Ok(());
        }
        let name = &rest[..name_end];
        let after = &rest[name_end..];

        if after.starts_with('(') {
            trace!(name, "skipping function-like macro");
            return Ok(());
        }

        self.define(name, after.trim())
    }

    /// Expand all defined macro names in `tokens`, recursively.
    ///
    /// Spliced tokens take the use site's location, so downstream errors
    /// point into the declaration text rather than at the definition.
    pub fn expand(
        &self,
        tokens: &[Token],
    ) -> Result<Vec<Token>, MacroRecursionError> {
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            self.expand_into(token, 0, &mut out)?;
        }
        Ok(out)
    }

    fn expand_into(
        &self,
        token: &Token,
        depth: usize,
        out: &mut Vec<Token>,
    ) -> Result<(), MacroRecursionError> {
        if let Token::Ident(name, loc) = token {
            if let Some(replacement) = self.macros.get(name) {
                if depth >= self.recursion_limit {
                    return Err(MacroRecursionError {
                        name: name.clone(),
                        location: *loc,
                    });
                }
                for t in replacement {
                    self.expand_into(&t.with_location(*loc), depth + 1, out)?;
                }
                return Ok(());
            }
        }
        out.push(token.clone());
        Ok(())
    }
}

impl Default for MacroTable {
    fn default() -> Self {
        Self::new(DEFAULT_RECURSION_LIMIT)
    }
}

/// Blank out comment text before the directive scan, following the lexer's
/// comment and literal rules: `//` runs to end of line, `/* */` may span
/// lines, and neither starts inside a string or character literal. Blanked
/// characters become spaces and newlines are kept, so line numbering and the
/// directive structure of the remaining text are unchanged.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                out.push_str("  ");
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                    blank(&mut out, next);
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str("  ");
                while let Some(next) = chars.next() {
                    if next == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        out.push_str("  ");
                        break;
                    }
                    blank(&mut out, next);
                }
            }
            '"' | '\'' => {
                out.push(ch);
                while let Some(next) = chars.next() {
                    out.push(next);
                    if next == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if next == ch || next == '\n' {
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

fn blank(out: &mut String, ch: char) {
    if ch == '\n' {
        out.push('\n');
    } else {
        for _ in 0..ch.len_utf8() {
            out.push(' ');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    #[test]
    fn test_simple_expansion() {
        let mut table = MacroTable::default();
        table.define("WIDTH", "42").unwrap();

        let expanded = table.expand(&lex("A = WIDTH")).unwrap();
        assert!(matches!(expanded[0], Token::Ident(ref s, _) if s == "A"));
        assert!(matches!(expanded[1], Token::Eq(_)));
        assert!(matches!(expanded[2], Token::IntLiteral(42, _, _, _)));
    }

    #[test]
    fn test_nested_expansion() {
        let mut table = MacroTable::default();
        table.define("A", "B + 1").unwrap();
        table.define("B", "7").unwrap();

        let expanded = table.expand(&lex("A")).unwrap();
        assert!(matches!(expanded[0], Token::IntLiteral(7, _, _, _)));
        assert!(matches!(expanded[1], Token::Plus(_)));
        assert!(matches!(expanded[2], Token::IntLiteral(1, _, _, _)));
    }

    #[test]
    fn test_use_site_location() {
        let mut table = MacroTable::default();
        table.define("FLAG", "SOME_LONG_REPLACEMENT_VALUE").unwrap();

        let tokens = lex("x = FLAG");
        let use_loc = tokens[2].location();
        let expanded = table.expand(&tokens).unwrap();
        assert_eq!(expanded[2].location(), use_loc);
    }

    #[test]
    fn test_empty_replacement() {
        let mut table = MacroTable::default();
        table.define("NOTHING", "").unwrap();

        let expanded = table.expand(&lex("a NOTHING b")).unwrap();
        assert!(matches!(expanded[0], Token::Ident(ref s, _) if s == "a"));
        assert!(matches!(expanded[1], Token::Ident(ref s, _) if s == "b"));
    }

    #[test]
    fn test_self_reference_hits_limit() {
        let mut table = MacroTable::default();
        table.define("LOOP", "LOOP").unwrap();

        let err = table.expand(&lex("LOOP")).unwrap_err();
        assert_eq!(err.name, "LOOP");
    }

    #[test]
    fn test_mutual_recursion_hits_limit() {
        let mut table = MacroTable::default();
        table.define("PING", "PONG").unwrap();
        table.define("PONG", "PING").unwrap();

        assert!(table.expand(&lex("PING")).is_err());
    }

    #[test]
    fn test_scan_defines() {
        let mut table = MacroTable::default();
        table
            .scan_defines(
                "#define WIDTH 10\n#define TWICE(x) ((x) * 2)\nint a;\n",
            )
            .unwrap();

        let expanded = table.expand(&lex("WIDTH TWICE")).unwrap();
        assert!(matches!(expanded[0], Token::IntLiteral(10, _, _, _)));
        // function-like TWICE was skipped, the name stays an identifier
        assert!(matches!(expanded[1], Token::Ident(ref s, _) if s == "TWICE"));
    }

    #[test]
    fn test_scan_continuation() {
        let mut table = MacroTable::default();
        table.scan_defines("#define BIG \\\n  (1 << 4)\n").unwrap();

        let expanded = table.expand(&lex("BIG")).unwrap();
        assert!(matches!(expanded[0], Token::LParen(_)));
        assert!(matches!(expanded[1], Token::IntLiteral(1, _, _, _)));
        assert!(matches!(expanded[2], Token::LtLt(_)));
        assert!(matches!(expanded[3], Token::IntLiteral(4, _, _, _)));
        assert!(matches!(expanded[4], Token::RParen(_)));
    }

    #[test]
    fn test_redefinition_replaces() {
        let mut table = MacroTable::default();
        table.define("N", "1").unwrap();
        table.define("N", "2").unwrap();

        let expanded = table.expand(&lex("N")).unwrap();
        assert!(matches!(expanded[0], Token::IntLiteral(2, _, _, _)));
    }

    #[test]
    fn test_scan_ignores_defines_inside_comments() {
        let mut table = MacroTable::default();
        table
            .scan_defines(
                "#define SIZE 4\n\
                 /* old value:\n\
                 #define SIZE 99\n\
                 */\n\
                 // #define SIZE 7\n",
            )
            .unwrap();

        let expanded = table.expand(&lex("SIZE")).unwrap();
        assert!(matches!(expanded[0], Token::IntLiteral(4, _, _, _)));
    }

    #[test]
    fn test_scan_keeps_directives_after_comments_and_strings() {
        let mut table = MacroTable::default();
        table
            .scan_defines(
                "/* prologue */ #define A 1 // trailing\n\
                 #define MSG \"/*\"\n\
                 #define B 2\n",
            )
            .unwrap();

        let expanded = table.expand(&lex("A B")).unwrap();
        assert!(matches!(expanded[0], Token::IntLiteral(1, _, _, _)));
        assert!(matches!(expanded[1], Token::IntLiteral(2, _, _, _)));
    }
}
