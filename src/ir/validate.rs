//! Post-build invariant checks
//!
//! Validation walks the finished module and collects every violation rather
//! than stopping at the first, so a caller can report all problems at once.
//! Checks apply recursively to inline nested definitions.

use crate::ir::{Declaration, IRModule};
use crate::types::{EnumRef, EnumType, RecordRef, RecordType, TypeDescriptor};
use rustc_hash::FxHashSet;

/// A violated model invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("duplicate enumerator '{enumerator}' in enum '{enum_name}'")]
    DuplicateEnumerator {
        enum_name: String,
        enumerator: String,
    },
    #[error("duplicate member '{member}' in record '{record_name}'")]
    DuplicateMember {
        record_name: String,
        member: String,
    },
    #[error("enum '{name}' has no enumerators")]
    EmptyEnum { name: String },
    #[error("record '{name}' has no members")]
    EmptyRecord { name: String },
}

/// Check every declaration in the module.
pub fn validate(module: &IRModule) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (name, declaration) in module.iter() {
        match declaration {
            Declaration::Enum(e) => validate_enum(name, e, &mut errors),
            Declaration::Record(r) => validate_record(name, r, &mut errors),
            Declaration::Typedef(t) => {
                validate_descriptor(&t.underlying, &mut errors)
            }
        }
    }
    errors
}

fn validate_enum(
    name: &str,
    enum_type: &EnumType,
    errors: &mut Vec<ValidationError>,
) {
    if enum_type.enumerators.is_empty() {
        errors.push(ValidationError::EmptyEnum {
            name: name.to_string(),
        });
    }

    let mut seen = FxHashSet::default();
    for enumerator in &enum_type.enumerators {
        if !seen.insert(enumerator.name.as_str()) {
            errors.push(ValidationError::DuplicateEnumerator {
                enum_name: name.to_string(),
                enumerator: enumerator.name.clone(),
            });
        }
    }
}

fn validate_record(
    name: &str,
    record: &RecordType,
    errors: &mut Vec<ValidationError>,
) {
    if record.members.is_empty() && record.bases.is_empty() {
        errors.push(ValidationError::EmptyRecord {
            name: name.to_string(),
        });
    }

    let mut visible = Vec::new();
    collect_visible_names(record, &mut visible);
    let mut seen = FxHashSet::default();
    for member_name in visible {
        if !seen.insert(member_name) {
            errors.push(ValidationError::DuplicateMember {
                record_name: name.to_string(),
                member: member_name.to_string(),
            });
        }
    }

    for member in &record.members {
        validate_descriptor(&member.ty, errors);
    }
}

/// Member names visible in the record's scope, in declaration order. An
/// anonymous aggregate member contributes its own members' names
/// transitively; a named one contributes only its own name.
fn collect_visible_names<'a>(record: &'a RecordType, out: &mut Vec<&'a str>) {
    for member in &record.members {
        match (&member.name, &member.ty) {
            (Some(name), _) => out.push(name),
            (None, TypeDescriptor::Record(RecordRef::Inline(inner))) => {
                collect_visible_names(inner, out);
            }
            (None, _) => {}
        }
    }
}

fn validate_descriptor(
    ty: &TypeDescriptor,
    errors: &mut Vec<ValidationError>,
) {
    match ty {
        TypeDescriptor::Pointer(inner)
        | TypeDescriptor::Reference(inner) => {
            validate_descriptor(inner, errors)
        }
        TypeDescriptor::Array { element, .. } => {
            validate_descriptor(element, errors)
        }
        TypeDescriptor::MemberPointer { pointee, .. } => {
            validate_descriptor(pointee, errors)
        }
        TypeDescriptor::FunctionPointer {
            return_type,
            params,
            ..
        } => {
            validate_descriptor(return_type, errors);
            for param in params {
                validate_descriptor(param, errors);
            }
        }
        TypeDescriptor::Enum(EnumRef::Inline(inner)) => {
            validate_enum(display_name(&inner.name), inner, errors)
        }
        TypeDescriptor::Record(RecordRef::Inline(inner)) => {
            validate_record(display_name(&inner.name), inner, errors)
        }
        TypeDescriptor::Primitive(_)
        | TypeDescriptor::Named(_)
        | TypeDescriptor::Enum(EnumRef::Named(_))
        | TypeDescriptor::Record(RecordRef::Named(_)) => {}
    }
}

fn display_name(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("<anonymous>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build;
    use crate::parser::parse::Parser;

    fn validate_source(source: &str) -> Vec<ValidationError> {
        let decls = Parser::from_source(source)
            .unwrap()
            .parse_declarations()
            .unwrap();
        validate(&build(&decls).unwrap())
    }

    #[test]
    fn test_valid_module_passes() {
        let errors = validate_source(
            r#"
            enum Color { Red, Green };
            struct Point { int x; int y; };
            typedef Point *PointRef;
            "#,
        );
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn test_duplicate_enumerator() {
        let errors = validate_source("enum E { A, B, A };");
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateEnumerator {
                enum_name: "E".to_string(),
                enumerator: "A".to_string(),
            }]
        );
    }

    #[test]
    fn test_duplicate_member() {
        let errors = validate_source("struct S { int x; float x; };");
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateMember {
                record_name: "S".to_string(),
                member: "x".to_string(),
            }]
        );
    }

    #[test]
    fn test_hoisted_anonymous_member_names_collide() {
        let errors = validate_source(
            "struct S { int a; union { int a; float b; }; };",
        );
        assert!(errors.contains(&ValidationError::DuplicateMember {
            record_name: "S".to_string(),
            member: "a".to_string(),
        }));
    }

    #[test]
    fn test_hoisted_anonymous_struct_member_names_collide() {
        let errors = validate_source(
            "struct S { int x; struct { int x; float y; }; };",
        );
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateMember {
                record_name: "S".to_string(),
                member: "x".to_string(),
            }]
        );
    }

    #[test]
    fn test_hoisted_anonymous_class_member_names_collide() {
        let errors = validate_source("class C { int n; class { int n; }; };");
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateMember {
                record_name: "C".to_string(),
                member: "n".to_string(),
            }]
        );
    }

    #[test]
    fn test_names_hoist_through_nested_anonymous_aggregates() {
        let errors = validate_source(
            "struct S { int kind; union { struct { int kind; int extra; }; }; };",
        );
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateMember {
                record_name: "S".to_string(),
                member: "kind".to_string(),
            }]
        );
    }

    #[test]
    fn test_named_nested_member_does_not_hoist() {
        let errors = validate_source(
            "struct S { struct { int a; } inner; int a; };",
        );
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn test_empty_bodies() {
        let errors = validate_source("enum E { }; struct S { };");
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyEnum {
                    name: "E".to_string()
                },
                ValidationError::EmptyRecord {
                    name: "S".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_record_with_bases_only_is_not_empty() {
        let errors = validate_source("struct B { int x; }; class D : B { };");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn test_nested_inline_bodies_checked() {
        let errors = validate_source("struct O { struct { } n; };");
        assert_eq!(
            errors,
            vec![ValidationError::EmptyRecord {
                name: "<anonymous>".to_string()
            }]
        );
    }

    #[test]
    fn test_all_problems_collected() {
        let errors = validate_source("enum E { A, A }; struct S { };");
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0],
            ValidationError::DuplicateEnumerator { .. }
        ));
        assert!(matches!(errors[1], ValidationError::EmptyRecord { .. }));
    }
}
