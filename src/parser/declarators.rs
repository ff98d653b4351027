//! Declarator parsing implementation
//!
//! This module handles the declarator sub-grammar, the part of a member or
//! typedef declaration that binds a name (or no name) to pointer, reference,
//! array, member-pointer, and function-pointer shape:
//!
//! # Grammar
//!
//! ```text
//! declarator ::= prefix* core suffix*
//! prefix     ::= "*" | "&" | identifier "::" "*"
//! core       ::= identifier | "(" declarator ")" | ε    (abstract only)
//! suffix     ::= "[" constant-expression? "]" | "(" parameters ")"
//! parameters ::= ε | "void" | param ("," param)* ("," "...")?
//! ```
//!
//! The `ClassName::*` and `(*name)(...)` shapes are disambiguated by
//! lookahead before falling back to plain pointer/identifier parsing.
//! Layers are recorded in read order from the identifier outward (suffixes,
//! then prefixes innermost-first, inner parenthesized level before outer);
//! the resolver folds them into a nested descriptor.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::parser::ast::{
    Declarator, DeclaratorOp, ParamDecl, PrimitiveKeyword, TypeSpecifier,
};
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};
use tracing::trace;

impl Parser {
    /// Parse one declarator. With `allow_abstract` the identifier may be
    /// omitted (parameter position); otherwise a missing name is a syntax
    /// error.
    pub(crate) fn parse_declarator(
        &mut self,
        allow_abstract: bool,
    ) -> Result<Declarator, ParseError> {
        let location = self.current_location();
        let (name, ops) = self.parse_declarator_level(allow_abstract)?;

        trace!(
            name = name.as_deref().unwrap_or("<anonymous>"),
            layers = ops.len(),
            "declarator parsed"
        );

        Ok(Declarator {
            name,
            ops,
            location,
        })
    }

    fn parse_declarator_level(
        &mut self,
        allow_abstract: bool,
    ) -> Result<(Option<String>, Vec<DeclaratorOp>), ParseError> {
        let mut prefixes = Vec::new();

        loop {
            if self.match_token(&Token::Star(self.current_location())) {
                prefixes.push(DeclaratorOp::Pointer);
                continue;
            }
            if self.match_token(&Token::Amp(self.current_location())) {
                prefixes.push(DeclaratorOp::Reference);
                continue;
            }
            // ClassName::* prefix
            if let Token::Ident(class_name, _) = self.peek() {
                if matches!(self.peek_ahead(1), Token::ColonColon(_))
                    && matches!(self.peek_ahead(2), Token::Star(_))
                {
                    let class_name = class_name.clone();
                    self.advance(); // class name
                    self.advance(); // '::'
                    self.advance(); // '*'
                    prefixes.push(DeclaratorOp::MemberPointer { class_name });
                    continue;
                }
            }
            break;
        }

        let (name, mut ops) = self.parse_declarator_core(allow_abstract)?;

        loop {
            if matches!(self.peek(), Token::LBracket(_)) {
                self.advance();
                let length = if matches!(self.peek(), Token::RBracket(_)) {
                    None
                } else {
                    let value = self.evaluate_until(
                        |t| matches!(t, Token::RBracket(_)),
                        "array length expression",
                    )?;
                    Some(
                        self.to_unsigned_size(
                            value,
                            "non-negative array length",
                        )?,
                    )
                };
                self.expect_rbracket("after array length")?;
                ops.push(DeclaratorOp::Array { length });
                continue;
            }
            if matches!(self.peek(), Token::LParen(_)) {
                self.advance();
                let (params, variadic) = self.parse_parameter_list()?;
                self.expect_rparen("after parameters")?;
                ops.push(DeclaratorOp::Function { params, variadic });
                continue;
            }
            break;
        }

        // prefixes bind outward: the one written last (closest to the
        // identifier) applies first
        ops.extend(prefixes.into_iter().rev());

        Ok((name, ops))
    }

    fn parse_declarator_core(
        &mut self,
        allow_abstract: bool,
    ) -> Result<(Option<String>, Vec<DeclaratorOp>), ParseError> {
        if let Token::Ident(name, _) = self.peek() {
            let name = name.clone();
            self.advance();
            return Ok((Some(name), Vec::new()));
        }

        if matches!(self.peek(), Token::LParen(_))
            && self.starts_nested_declarator()
        {
            self.advance(); // '('
            let inner = self.parse_declarator_level(allow_abstract)?;
            self.expect_rparen("after parenthesized declarator")?;
            return Ok(inner);
        }

        if allow_abstract {
            return Ok((None, Vec::new()));
        }

        Err(self.syntax_error("declarator name"))
    }

    /// Decide whether a `(` in core position opens a nested declarator
    /// (`(*name)`, `(&name)`, `(Class::*name)`) rather than a parameter
    /// list.
    fn starts_nested_declarator(&self) -> bool {
        match self.peek_ahead(1) {
            Token::Star(_) | Token::Amp(_) | Token::LParen(_) => true,
            Token::Ident(_, _) => {
                matches!(self.peek_ahead(2), Token::ColonColon(_))
                    && matches!(self.peek_ahead(3), Token::Star(_))
            }
            _ => false,
        }
    }

    /// Parse a parameter list; the caller consumes both parentheses.
    pub(crate) fn parse_parameter_list(
        &mut self,
    ) -> Result<(Vec<ParamDecl>, bool), ParseError> {
        let mut params = Vec::new();
        let mut variadic = false;

        if self.check(&Token::RParen(self.current_location())) {
            return Ok((params, variadic));
        }

        loop {
            if matches!(self.peek(), Token::Ellipsis(_)) {
                self.advance();
                variadic = true;
                break;
            }

            self.skip_qualifiers();
            let specifier = self.parse_type_specifier()?;
            self.skip_qualifiers();
            let declarator = self.parse_declarator(true)?;
            params.push(ParamDecl {
                specifier,
                declarator,
            });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        // (void) means no parameters in C
        if params.len() == 1 && is_bare_void(&params[0]) {
            params.clear();
        }

        Ok((params, variadic))
    }
}

fn is_bare_void(param: &ParamDecl) -> bool {
    if param.declarator.name.is_some() || !param.declarator.ops.is_empty() {
        return false;
    }
    match &param.specifier {
        TypeSpecifier::Primitive { keywords, .. } => {
            keywords.len() == 1 && keywords[0] == PrimitiveKeyword::Void
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declarator(source: &str) -> Declarator {
        Parser::from_source(source)
            .unwrap()
            .parse_declarator(false)
            .unwrap()
    }

    #[test]
    fn test_array_of_pointers() {
        let d = declarator("*a[3]");
        assert_eq!(d.name.as_deref(), Some("a"));
        assert_eq!(
            d.ops,
            vec![
                DeclaratorOp::Array { length: Some(3) },
                DeclaratorOp::Pointer
            ]
        );
    }

    #[test]
    fn test_pointer_to_array() {
        let d = declarator("(*p)[3]");
        assert_eq!(d.name.as_deref(), Some("p"));
        assert_eq!(
            d.ops,
            vec![
                DeclaratorOp::Pointer,
                DeclaratorOp::Array { length: Some(3) }
            ]
        );
    }

    #[test]
    fn test_incomplete_array() {
        let d = declarator("tail[]");
        assert_eq!(d.ops, vec![DeclaratorOp::Array { length: None }]);
    }

    #[test]
    fn test_function_pointer() {
        let d = declarator("(*callback)(int x, ...)");
        assert_eq!(d.name.as_deref(), Some("callback"));
        let [DeclaratorOp::Pointer, DeclaratorOp::Function { params, variadic }] =
            d.ops.as_slice()
        else {
            panic!("unexpected ops: {:?}", d.ops);
        };
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].declarator.name.as_deref(), Some("x"));
        assert!(variadic);
    }

    #[test]
    fn test_void_parameter_list_is_empty() {
        let d = declarator("(*f)(void)");
        let [_, DeclaratorOp::Function { params, variadic }] = d.ops.as_slice()
        else {
            panic!("unexpected ops: {:?}", d.ops);
        };
        assert!(params.is_empty());
        assert!(!variadic);
    }

    #[test]
    fn test_member_pointer() {
        let d = declarator("Owner::*m");
        assert_eq!(d.name.as_deref(), Some("m"));
        assert_eq!(
            d.ops,
            vec![DeclaratorOp::MemberPointer {
                class_name: "Owner".to_string()
            }]
        );
    }

    #[test]
    fn test_member_function_pointer() {
        let d = declarator("(Owner::*mf)()");
        assert_eq!(d.name.as_deref(), Some("mf"));
        let [DeclaratorOp::MemberPointer { class_name }, DeclaratorOp::Function { params, .. }] =
            d.ops.as_slice()
        else {
            panic!("unexpected ops: {:?}", d.ops);
        };
        assert_eq!(class_name, "Owner");
        assert!(params.is_empty());
    }

    #[test]
    fn test_pointer_chain_and_reference() {
        assert_eq!(
            declarator("**pp").ops,
            vec![DeclaratorOp::Pointer, DeclaratorOp::Pointer]
        );
        assert_eq!(declarator("&r").ops, vec![DeclaratorOp::Reference]);
    }

    #[test]
    fn test_abstract_declarator() {
        let d = Parser::from_source("*")
            .unwrap()
            .parse_declarator(true)
            .unwrap();
        assert_eq!(d.name, None);
        assert_eq!(d.ops, vec![DeclaratorOp::Pointer]);
    }

    #[test]
    fn test_name_required_outside_parameters() {
        assert!(Parser::from_source("*")
            .unwrap()
            .parse_declarator(false)
            .is_err());
    }

    #[test]
    fn test_negative_array_length_rejected() {
        let err = Parser::from_source("x[-1]")
            .unwrap()
            .parse_declarator(false)
            .unwrap_err();
        let ParseError::Syntax(err) = err else {
            panic!("expected syntax error, got: {err:?}");
        };
        assert_eq!(err.found, "-1");
    }
}
