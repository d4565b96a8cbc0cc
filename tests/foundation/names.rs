//! Integration tests for name helpers and interning

use ormbind_foundation::Interner;
use ormbind_foundation::names::{is_blank, java_string_hash, non_blank, qualify, unqualify};
use proptest::prelude::*;

#[test]
fn qualify_and_unqualify() {
    assert_eq!(qualify("com.acme.Order", "customer"), "com.acme.Order.customer");
    assert_eq!(qualify("", "customer"), "customer");
    assert_eq!(unqualify("com.acme.Order"), "Order");
}

#[test]
fn blank_values() {
    assert_eq!(non_blank(Some(" x ")), Some(" x "));
    assert_eq!(non_blank(Some("  ")), None);
    assert!(is_blank(None));
    assert!(is_blank(Some("")));
}

#[test]
fn string_hash_matches_known_values() {
    assert_eq!(java_string_hash(""), 0);
    assert_eq!(java_string_hash("a"), 97);
    assert_eq!(java_string_hash("Dog"), 68_892);
    // Long names overflow and wrap.
    assert_eq!(java_string_hash("polygenelubricants"), i32::MIN);
}

#[test]
fn interned_names_share_storage() {
    let mut interner = Interner::new();
    let a = interner.intern("customer");
    let b = interner.intern("customer");
    assert!(a.ptr_eq(&b));
    assert_eq!(interner.len(), 1);
    assert_eq!(interner.get("customer").unwrap().as_str(), "customer");
    assert!(interner.get("order").is_none());
}

proptest! {
    #[test]
    fn unqualify_inverts_qualify(prefix in "[a-z]{1,6}(\\.[a-z]{1,6}){0,3}", name in "[A-Za-z][A-Za-z0-9]{0,10}") {
        let qualified = qualify(&prefix, &name);
        prop_assert_eq!(unqualify(&qualified), name.as_str());
    }

    #[test]
    fn string_hash_is_polynomial(s in "[ -~]{0,24}", c in proptest::char::range('a', 'z')) {
        let extended = format!("{s}{c}");
        let expected = java_string_hash(&s).wrapping_mul(31).wrapping_add(c as i32);
        prop_assert_eq!(java_string_hash(&extended), expected);
    }
}
