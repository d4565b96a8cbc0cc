//! Integration tests for Identifier and QualifiedTableName

use std::collections::HashSet;

use ormbind_foundation::{Identifier, IdentifierRenderer, PlainRenderer, QualifiedTableName};

struct Brackets;

impl IdentifierRenderer for Brackets {
    fn open_quote(&self) -> char {
        '['
    }

    fn close_quote(&self) -> char {
        ']'
    }
}

#[test]
fn blank_text_is_no_identifier() {
    assert!(Identifier::to_identifier("").is_none());
    assert!(Identifier::to_identifier("   ").is_none());
}

#[test]
fn backticks_and_double_quotes_mark_quoted_identifiers() {
    let backticked = Identifier::to_identifier("`Order`").unwrap();
    assert!(backticked.is_quoted());
    assert_eq!(backticked.text(), "Order");

    let double = Identifier::to_identifier("\"Order\"").unwrap();
    assert!(double.is_quoted());
    assert_eq!(double, backticked);
}

#[test]
fn unquoted_identifiers_compare_case_insensitively() {
    let a = Identifier::to_identifier("ORDERS").unwrap();
    let b = Identifier::to_identifier("orders").unwrap();
    assert_eq!(a, b);

    let quoted = Identifier::quoted("ORDERS").unwrap();
    assert_ne!(quoted, b);

    let set: HashSet<_> = [a, b, quoted].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn rendering_uses_renderer_quotes() {
    let quoted = Identifier::quoted("user").unwrap();
    assert_eq!(quoted.render(&Brackets), "[user]");
    assert_eq!(Identifier::new("user", false).render(&Brackets), "user");
}

#[test]
fn qualified_name_skips_absent_parts() {
    let table = Identifier::new("orders", false);
    let name = QualifiedTableName::new(None, Some(Identifier::new("sales", false)), table.clone());
    assert_eq!(name.render(&PlainRenderer), "sales.orders");
    assert_eq!(QualifiedTableName::new(None, None, table).render(&PlainRenderer), "orders");
}
