//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use ormbind_foundation::{Error, ErrorContext, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_unknown_entity() {
    let err = Error::unknown_entity("com.acme.Order.customer", "com.acme.Customer");
    assert!(matches!(err.kind, ErrorKind::UnknownEntity { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("com.acme.Order.customer"));
    assert!(msg.contains("com.acme.Customer"));
}

#[test]
fn error_duplicate_entity_name() {
    let err = Error::duplicate_entity_name("Order");
    assert!(matches!(err.kind, ErrorKind::DuplicateEntityName(_)));
    assert_eq!(err.to_string(), "Use of the same entity name twice: Order");
}

#[test]
fn error_duplicate_import() {
    let err = Error::duplicate_import("Order", "com.acme.Order");
    let msg = format!("{err}");
    assert!(msg.contains("'Order'"));
    assert!(msg.contains("com.acme.Order"));
}

#[test]
fn error_configuration() {
    let err = Error::configuration("hibernate.cache.use_second_level_cache", "maybe");
    assert!(matches!(err.kind, ErrorKind::Configuration { .. }));
    assert!(err.to_string().contains("maybe"));
}

#[test]
fn error_assertion_failure() {
    let err = Error::assertion_failure("dangling handle");
    assert_eq!(err.to_string(), "assertion failure: dangling handle");
}

// =============================================================================
// Error Classification
// =============================================================================

#[test]
fn mapping_errors_are_user_correctable() {
    assert!(Error::annotation("bad").is_user_correctable());
    assert!(Error::mapping("bad").is_user_correctable());
    assert!(Error::unknown_entity("a.b", "C").is_user_correctable());
    assert!(!Error::assertion_failure("bug").is_user_correctable());
}

#[test]
fn recoverable_wraps_and_unwraps_cause() {
    let err = Error::recoverable(Error::mapping("referenced property not bound yet"));
    assert!(err.is_recoverable());
    assert!(err.is_user_correctable());
    assert_eq!(err.to_string(), "referenced property not bound yet");

    let cause = err.into_cause();
    assert!(!cause.is_recoverable());
    assert!(matches!(cause.kind, ErrorKind::Mapping(_)));
}

#[test]
fn into_cause_leaves_other_errors_alone() {
    let err = Error::annotation("bad").into_cause();
    assert!(matches!(err.kind, ErrorKind::Annotation(_)));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_does_not_change_display() {
    let err = Error::annotation("no identifier").with_context(
        ErrorContext::new()
            .with_entity("com.acme.Order")
            .with_property("customer")
            .with_pass("to-one foreign key"),
    );
    assert_eq!(err.to_string(), "no identifier");

    let context = err.context.unwrap();
    assert_eq!(context.entity.as_deref(), Some("com.acme.Order"));
    assert_eq!(context.property.as_deref(), Some("customer"));
}
