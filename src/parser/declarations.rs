//! Declaration parsing implementation
//!
//! This module implements the three top-level declaration grammars and the
//! type-specifier grammar they share:
//!
//! # Grammar
//!
//! ```text
//! enum-decl      ::= "enum" identifier ";"
//!                  | enum-def ";"
//! enum-def       ::= "enum" identifier? "{" enumerators? "}"
//! enumerators    ::= enumerator ("," enumerator)* ","?
//! enumerator     ::= identifier ("=" constant-expression)?
//! record-decl    ::= record-kind identifier ";"
//!                  | record-def ";"
//! record-def     ::= record-kind identifier? base-clause? "{" member* "}"
//! base-clause    ::= ":" base ("," base)*
//! base           ::= access-specifier? identifier
//! member         ::= access-specifier ":"
//!                  | qualifier* type-specifier qualifier* member-tail ";"
//! member-tail    ::= ":" constant-expression
//!                  | declarator (":" constant-expression)?
//!                    ("," declarator (":" constant-expression)?)*
//!                  | ε                              (inline definitions only)
//! typedef-decl   ::= "typedef" qualifier* type-specifier qualifier*
//!                    declarator ";"
//! type-specifier ::= primitive-keyword+
//!                  | identifier
//!                  | "enum" identifier              (elaborated)
//!                  | record-kind identifier         (elaborated)
//!                  | enum-def | record-def          (inline)
//! qualifier      ::= "const" | "volatile"
//! ```
//!
//! Enumerator values are evaluated as they are parsed and entered into the
//! parser's symbol table immediately, so later constant expressions (in the
//! same enum or in later declarations) can reference them by name.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::eval::ConstantValue;
use crate::parser::ast::{
    Declarator, ParsedDecl, ParsedEnum, ParsedEnumerator, ParsedMember,
    ParsedRecord, ParsedTypedef, PrimitiveKeyword, TagKind, TypeSpecifier,
};
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};
use crate::types::RecordKind;

impl Parser {
    /// Parse the declaration starting at an `enum` keyword: either a forward
    /// declaration `enum E;` or a full definition.
    pub(crate) fn parse_enum_declaration(
        &mut self,
    ) -> Result<ParsedDecl, ParseError> {
        let location = self.current_location();

        if let (Token::Ident(name, _), Token::Semicolon(_)) =
            (self.peek_ahead(1), self.peek_ahead(2))
        {
            let name = name.clone();
            self.advance(); // 'enum'
            self.advance(); // tag
            self.advance(); // ';'
            return Ok(ParsedDecl::Forward {
                kind: TagKind::Enum,
                name,
                location,
            });
        }

        let parsed = self.parse_enum_definition()?;
        self.expect_semicolon("after enum declaration")?;
        Ok(ParsedDecl::Enum(parsed))
    }

    /// Parse the declaration starting at a `struct`, `class`, or `union`
    /// keyword: either a forward declaration or a full definition.
    pub(crate) fn parse_record_declaration(
        &mut self,
    ) -> Result<ParsedDecl, ParseError> {
        let location = self.current_location();
        let kind = match record_kind(self.peek()) {
            Some(kind) => kind,
            None => {
                return Err(self.syntax_error("'struct', 'class', or 'union'"))
            }
        };

        if let (Token::Ident(name, _), Token::Semicolon(_)) =
            (self.peek_ahead(1), self.peek_ahead(2))
        {
            let name = name.clone();
            self.advance(); // keyword
            self.advance(); // tag
            self.advance(); // ';'
            return Ok(ParsedDecl::Forward {
                kind: TagKind::Record(kind),
                name,
                location,
            });
        }

        let parsed = self.parse_record_definition()?;
        self.expect_semicolon("after record declaration")?;
        Ok(ParsedDecl::Record(parsed))
    }

    /// Parse a `typedef <specifier> <declarator>;` declaration. The new name
    /// is the declarator's identifier; `const` and `volatile` may appear on
    /// either side of the specifier.
    pub(crate) fn parse_typedef(&mut self) -> Result<ParsedDecl, ParseError> {
        let location = self.current_location();
        self.advance(); // 'typedef'

        let mut is_const = false;
        let mut is_volatile = false;
        self.collect_qualifiers(&mut is_const, &mut is_volatile);
        let specifier = self.parse_type_specifier()?;
        self.collect_qualifiers(&mut is_const, &mut is_volatile);

        let declarator = self.parse_declarator(false)?;
        self.expect_semicolon("after typedef")?;

        Ok(ParsedDecl::Typedef(ParsedTypedef {
            specifier,
            declarator,
            is_const,
            is_volatile,
            location,
        }))
    }

    /// Parse `enum [tag] { ... }` starting at the `enum` keyword. The
    /// trailing `;` (or declarator, in specifier position) is the caller's
    /// business.
    fn parse_enum_definition(&mut self) -> Result<ParsedEnum, ParseError> {
        let location = self.current_location();
        self.advance(); // 'enum'

        let name = self.match_tag_name();
        self.expect_lbrace("to open enum body")?;

        let mut enumerators: Vec<ParsedEnumerator> = Vec::new();
        while !self.check(&Token::RBrace(self.current_location()))
            && !self.is_at_end()
        {
            let enumerator_location = self.current_location();
            let name = self.expect_identifier("enumerator name")?;

            let value =
                if self.match_token(&Token::Eq(self.current_location())) {
                    self.evaluate_until(
                        |t| matches!(t, Token::Comma(_) | Token::RBrace(_)),
                        "constant expression after '='",
                    )?
                } else {
                    // without an initializer, one past the previous value in
                    // the previous value's type; the first defaults to 0
                    match enumerators.last() {
                        Some(prev) => prev.value.add(ConstantValue::from(1)),
                        None => ConstantValue::from(0),
                    }
                };

            self.symbols.define(name.clone(), value);
            enumerators.push(ParsedEnumerator {
                name,
                value,
                location: enumerator_location,
            });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }
        self.expect_rbrace("to close enum body")?;

        Ok(ParsedEnum {
            name,
            enumerators,
            location,
        })
    }

    /// Parse `struct`/`class`/`union` `[tag] [: bases] { ... }` starting at
    /// the keyword.
    fn parse_record_definition(&mut self) -> Result<ParsedRecord, ParseError> {
        let location = self.current_location();
        let kind = match record_kind(self.peek()) {
            Some(kind) => kind,
            None => {
                return Err(self.syntax_error("'struct', 'class', or 'union'"))
            }
        };
        self.advance();

        let name = self.match_tag_name();

        let bases =
            if self.match_token(&Token::Colon(self.current_location())) {
                self.parse_base_list()?
            } else {
                Vec::new()
            };

        self.expect_lbrace("to open record body")?;

        let mut members = Vec::new();
        while !self.check(&Token::RBrace(self.current_location()))
            && !self.is_at_end()
        {
            if matches!(
                self.peek(),
                Token::Public(_) | Token::Private(_) | Token::Protected(_)
            ) {
                self.advance();
                self.expect_token(
                    &Token::Colon(self.current_location()),
                    "':' after access specifier",
                )?;
                continue;
            }
            self.parse_member_group(&mut members)?;
        }
        self.expect_rbrace("to close record body")?;

        Ok(ParsedRecord {
            name,
            kind,
            bases,
            members,
            location,
        })
    }

    /// Parse the base list after the `:` of a record head. Access specifiers
    /// are accepted and discarded; only the base names are kept.
    fn parse_base_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut bases = Vec::new();
        loop {
            if matches!(
                self.peek(),
                Token::Public(_) | Token::Private(_) | Token::Protected(_)
            ) {
                self.advance();
            }
            bases.push(self.expect_identifier("base type name")?);

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }
        Ok(bases)
    }

    /// Parse one member declaration, which may introduce several members
    /// through a comma-separated declarator list sharing one specifier.
    fn parse_member_group(
        &mut self,
        members: &mut Vec<ParsedMember>,
    ) -> Result<(), ParseError> {
        let group_location = self.current_location();
        self.skip_qualifiers();
        let specifier = self.parse_type_specifier()?;
        self.skip_qualifiers();

        // a bare inline definition is an anonymous aggregate member
        if self.check(&Token::Semicolon(self.current_location())) {
            if !matches!(
                specifier,
                TypeSpecifier::InlineRecord(_) | TypeSpecifier::InlineEnum(_)
            ) {
                return Err(self.syntax_error("declarator"));
            }
            self.advance();
            members.push(ParsedMember {
                specifier,
                declarator: Declarator::anonymous(group_location),
                bit_width: None,
                location: group_location,
            });
            return Ok(());
        }

        // unnamed bit-field: `int : 3;`
        if self.match_token(&Token::Colon(self.current_location())) {
            let bit_width = self.evaluate_bit_width()?;
            self.expect_semicolon("after bit-field member")?;
            members.push(ParsedMember {
                specifier,
                declarator: Declarator::anonymous(group_location),
                bit_width: Some(bit_width),
                location: group_location,
            });
            return Ok(());
        }

        loop {
            let declarator = self.parse_declarator(false)?;
            let bit_width =
                if self.match_token(&Token::Colon(self.current_location())) {
                    Some(self.evaluate_bit_width()?)
                } else {
                    None
                };

            let location = declarator.location;
            members.push(ParsedMember {
                specifier: specifier.clone(),
                declarator,
                bit_width,
                location,
            });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }
        self.expect_semicolon("after member declaration")?;
        Ok(())
    }

    /// Parse the base-type part of a member, parameter, or typedef.
    pub(crate) fn parse_type_specifier(
        &mut self,
    ) -> Result<TypeSpecifier, ParseError> {
        let location = self.current_location();

        if let Some(first) = primitive_keyword(self.peek()) {
            let mut keywords = vec![first];
            self.advance();
            while let Some(keyword) = primitive_keyword(self.peek()) {
                keywords.push(keyword);
                self.advance();
            }
            return Ok(TypeSpecifier::Primitive { keywords, location });
        }

        if matches!(self.peek(), Token::Enum(_)) {
            return match (self.peek_ahead(1), self.peek_ahead(2)) {
                (Token::LBrace(_), _)
                | (Token::Ident(_, _), Token::LBrace(_)) => Ok(
                    TypeSpecifier::InlineEnum(self.parse_enum_definition()?),
                ),
                (Token::Ident(name, _), _) => {
                    let name = name.clone();
                    self.advance(); // 'enum'
                    self.advance(); // tag
                    Ok(TypeSpecifier::Elaborated {
                        kind: TagKind::Enum,
                        name,
                        location,
                    })
                }
                _ => Err(self.syntax_error("enum tag or '{'")),
            };
        }

        if let Some(kind) = record_kind(self.peek()) {
            return match (self.peek_ahead(1), self.peek_ahead(2)) {
                (Token::LBrace(_) | Token::Colon(_), _)
                | (Token::Ident(_, _), Token::LBrace(_) | Token::Colon(_)) => {
                    Ok(TypeSpecifier::InlineRecord(
                        self.parse_record_definition()?,
                    ))
                }
                (Token::Ident(name, _), _) => {
                    let name = name.clone();
                    self.advance(); // keyword
                    self.advance(); // tag
                    Ok(TypeSpecifier::Elaborated {
                        kind: TagKind::Record(kind),
                        name,
                        location,
                    })
                }
                _ => Err(self.syntax_error("record tag or '{'")),
            };
        }

        if let Token::Ident(name, _) = self.peek() {
            let name = name.clone();
            self.advance();
            return Ok(TypeSpecifier::Named { name, location });
        }

        Err(self.syntax_error("type specifier"))
    }

    fn match_tag_name(&mut self) -> Option<String> {
        if let Token::Ident(name, _) = self.peek() {
            let name = name.clone();
            self.advance();
            Some(name)
        } else {
            None
        }
    }

    fn collect_qualifiers(
        &mut self,
        is_const: &mut bool,
        is_volatile: &mut bool,
    ) {
        loop {
            if self.match_token(&Token::Const(self.current_location())) {
                *is_const = true;
            } else if self
                .match_token(&Token::Volatile(self.current_location()))
            {
                *is_volatile = true;
            } else {
                break;
            }
        }
    }

    /// Accept and discard qualifiers in positions where they carry no
    /// information the type model keeps.
    pub(crate) fn skip_qualifiers(&mut self) {
        let mut is_const = false;
        let mut is_volatile = false;
        self.collect_qualifiers(&mut is_const, &mut is_volatile);
    }

    fn evaluate_bit_width(&mut self) -> Result<u64, ParseError> {
        let value = self.evaluate_until(
            |t| matches!(t, Token::Semicolon(_) | Token::Comma(_)),
            "bit-field width expression",
        )?;
        self.to_unsigned_size(value, "non-negative bit-field width")
    }
}

fn primitive_keyword(token: &Token) -> Option<PrimitiveKeyword> {
    match token {
        Token::Unsigned(_) => Some(PrimitiveKeyword::Unsigned),
        Token::Signed(_) => Some(PrimitiveKeyword::Signed),
        Token::Long(_) => Some(PrimitiveKeyword::Long),
        Token::Short(_) => Some(PrimitiveKeyword::Short),
        Token::Int(_) => Some(PrimitiveKeyword::Int),
        Token::Char(_) => Some(PrimitiveKeyword::Char),
        Token::Float(_) => Some(PrimitiveKeyword::Float),
        Token::Double(_) => Some(PrimitiveKeyword::Double),
        Token::Bool(_) => Some(PrimitiveKeyword::Bool),
        Token::Void(_) => Some(PrimitiveKeyword::Void),
        Token::WCharT(_) => Some(PrimitiveKeyword::WCharT),
        Token::Char8T(_) => Some(PrimitiveKeyword::Char8T),
        Token::Char16T(_) => Some(PrimitiveKeyword::Char16T),
        Token::Char32T(_) => Some(PrimitiveKeyword::Char32T),
        _ => None,
    }
}

fn record_kind(token: &Token) -> Option<RecordKind> {
    match token {
        Token::Struct(_) => Some(RecordKind::Struct),
        Token::Class(_) => Some(RecordKind::Class),
        Token::Union(_) => Some(RecordKind::Union),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::DeclaratorOp;

    fn parse_one(source: &str) -> ParsedDecl {
        let mut decls = Parser::from_source(source)
            .unwrap()
            .parse_declarations()
            .unwrap();
        assert_eq!(decls.len(), 1);
        decls.remove(0)
    }

    fn enum_values(parsed: &ParsedEnum) -> Vec<i64> {
        parsed.enumerators.iter().map(|e| e.value.as_i64()).collect()
    }

    #[test]
    fn test_enum_value_defaulting() {
        let ParsedDecl::Enum(parsed) = parse_one("enum E { A, B = 5, C, };")
        else {
            panic!("expected enum");
        };
        assert_eq!(parsed.name.as_deref(), Some("E"));
        assert_eq!(enum_values(&parsed), vec![0, 5, 6]);
    }

    #[test]
    fn test_enumerator_referencing_earlier_one() {
        let ParsedDecl::Enum(parsed) =
            parse_one("enum E { A = 2, B = A * 3 };")
        else {
            panic!("expected enum");
        };
        assert_eq!(enum_values(&parsed), vec![2, 6]);
    }

    #[test]
    fn test_record_members() {
        let ParsedDecl::Record(parsed) =
            parse_one("struct Point { int x; int y; };")
        else {
            panic!("expected record");
        };
        assert_eq!(parsed.name.as_deref(), Some("Point"));
        assert_eq!(parsed.kind, RecordKind::Struct);
        assert_eq!(parsed.members.len(), 2);
        assert_eq!(parsed.members[0].declarator.name.as_deref(), Some("x"));
        assert_eq!(parsed.members[1].declarator.name.as_deref(), Some("y"));
    }

    #[test]
    fn test_bit_fields() {
        let ParsedDecl::Record(parsed) =
            parse_one("struct F { unsigned flags : 3; int : 2; };")
        else {
            panic!("expected record");
        };
        assert_eq!(
            parsed.members[0].declarator.name.as_deref(),
            Some("flags")
        );
        assert_eq!(parsed.members[0].bit_width, Some(3));
        assert_eq!(parsed.members[1].declarator.name, None);
        assert_eq!(parsed.members[1].bit_width, Some(2));
    }

    #[test]
    fn test_anonymous_aggregate_members() {
        let ParsedDecl::Record(parsed) = parse_one(
            "struct O { struct { int a; } s; union { int b; float c; }; };",
        ) else {
            panic!("expected record");
        };
        assert_eq!(parsed.members.len(), 2);
        assert!(matches!(
            parsed.members[0].specifier,
            TypeSpecifier::InlineRecord(_)
        ));
        assert_eq!(parsed.members[0].declarator.name.as_deref(), Some("s"));
        let TypeSpecifier::InlineRecord(ref inner) =
            parsed.members[1].specifier
        else {
            panic!("expected inline record");
        };
        assert_eq!(inner.kind, RecordKind::Union);
        assert_eq!(inner.name, None);
        assert_eq!(parsed.members[1].declarator.name, None);
    }

    #[test]
    fn test_class_bases_and_access_labels() {
        let ParsedDecl::Record(parsed) = parse_one(
            "class D : public B, C { public: int x; private: int y; };",
        ) else {
            panic!("expected record");
        };
        assert_eq!(parsed.kind, RecordKind::Class);
        assert_eq!(parsed.bases, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(parsed.members.len(), 2);
    }

    #[test]
    fn test_typedef_qualifiers() {
        let ParsedDecl::Typedef(parsed) =
            parse_one("typedef const unsigned long distance_t;")
        else {
            panic!("expected typedef");
        };
        assert!(parsed.is_const);
        assert!(!parsed.is_volatile);
        assert_eq!(parsed.declarator.name.as_deref(), Some("distance_t"));
        let TypeSpecifier::Primitive { ref keywords, .. } = parsed.specifier
        else {
            panic!("expected primitive specifier");
        };
        assert_eq!(
            keywords,
            &[PrimitiveKeyword::Unsigned, PrimitiveKeyword::Long]
        );
    }

    #[test]
    fn test_typedef_of_inline_record() {
        let ParsedDecl::Typedef(parsed) =
            parse_one("typedef struct { int x; } T;")
        else {
            panic!("expected typedef");
        };
        let TypeSpecifier::InlineRecord(ref inner) = parsed.specifier else {
            panic!("expected inline record");
        };
        assert_eq!(inner.name, None);
        assert_eq!(parsed.declarator.name.as_deref(), Some("T"));
    }

    #[test]
    fn test_declarator_list_shares_specifier() {
        let ParsedDecl::Record(parsed) =
            parse_one("struct S { int a, *b, c[2]; };")
        else {
            panic!("expected record");
        };
        assert_eq!(parsed.members.len(), 3);
        assert_eq!(parsed.members[0].specifier, parsed.members[1].specifier);
        assert!(parsed.members[0].declarator.ops.is_empty());
        assert_eq!(
            parsed.members[1].declarator.ops,
            vec![DeclaratorOp::Pointer]
        );
        assert_eq!(
            parsed.members[2].declarator.ops,
            vec![DeclaratorOp::Array { length: Some(2) }]
        );
    }

    #[test]
    fn test_elaborated_member_specifier() {
        let ParsedDecl::Record(parsed) =
            parse_one("struct Node { struct Node *next; };")
        else {
            panic!("expected record");
        };
        let TypeSpecifier::Elaborated { kind, ref name, .. } =
            parsed.members[0].specifier
        else {
            panic!("expected elaborated specifier");
        };
        assert_eq!(kind, TagKind::Record(RecordKind::Struct));
        assert_eq!(name, "Node");
        assert_eq!(
            parsed.members[0].declarator.ops,
            vec![DeclaratorOp::Pointer]
        );
    }

    #[test]
    fn test_member_without_declarator_rejected() {
        let err = Parser::from_source("struct S { int; };")
            .unwrap()
            .parse_declarations()
            .unwrap_err();
        let ParseError::Syntax(err) = err else {
            panic!("expected syntax error, got: {err:?}");
        };
        assert_eq!(err.expected, "declarator");
    }
}
