//! Integration tests for to-one and one-to-many association binding

use ormbind_binder::descriptor::{FetchType, ForeignKeyAnnotation, JoinColumnAnnotation};
use ormbind_binder::{
    Anomaly, BuildingOptions, EntityDescriptor, Metadata, MetadataSources, PropertyDescriptor,
    build_metadata,
};
use ormbind_foundation::{ErrorKind, Result};
use ormbind_model::{ForeignKeyDirection, NotFoundAction, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn customer() -> EntityDescriptor {
    EntityDescriptor::new("com.acme.Customer")
        .with_property(PropertyDescriptor::id("id", "long"))
        .with_property(PropertyDescriptor::basic("code", "string"))
}

fn order_with(customer: PropertyDescriptor) -> EntityDescriptor {
    EntityDescriptor::new("com.acme.Order")
        .with_property(PropertyDescriptor::id("id", "long"))
        .with_property(customer)
}

fn build(entities: Vec<EntityDescriptor>) -> Result<Metadata> {
    let sources = entities
        .into_iter()
        .fold(MetadataSources::new(), MetadataSources::with_entity);
    build_metadata(&sources, BuildingOptions::default())
}

fn customer_column_nullable(metadata: &Metadata) -> bool {
    let table = metadata.entity_table("com.acme.Order").unwrap();
    let id = table.column_by_name("customer_id").unwrap();
    table.column(id).unwrap().is_nullable()
}

// =============================================================================
// Many-to-One
// =============================================================================

#[test]
fn many_to_one_gets_implicit_join_column_and_foreign_key() {
    let metadata = build(vec![
        order_with(PropertyDescriptor::many_to_one("customer", "com.acme.Customer")),
        customer(),
    ])
    .unwrap();

    let order = metadata.entity_table("com.acme.Order").unwrap();
    let customer_table = metadata.entity_table("com.acme.Customer").unwrap();
    assert_eq!(order.foreign_keys().len(), 1);
    let fk = &order.foreign_keys()[0];
    assert_eq!(fk.referenced_entity_name(), "com.acme.Customer");
    assert_eq!(fk.referenced_table(), Some(customer_table.id()));
    assert!(fk.is_referencing_primary_key());
    assert_eq!(order.column_names(fk.columns()), vec!["customer_id"]);

    let property = metadata.property("com.acme.Order", "customer").unwrap();
    let value = property.value().as_many_to_one().unwrap();
    assert_eq!(value.referenced_entity_name(), Some("com.acme.Customer"));
    assert!(value.is_reference_to_primary_key());
    assert_eq!(value.property_name(), Some("customer"));
}

#[test]
fn lazy_to_one_values_never_make_the_property_lazy() {
    let metadata = build(vec![
        customer(),
        order_with(
            PropertyDescriptor::many_to_one("customer", "com.acme.Customer")
                .with_fetch_type(FetchType::Lazy),
        ),
    ])
    .unwrap();
    let property = metadata.property("com.acme.Order", "customer").unwrap();
    assert!(property.value().as_to_one().unwrap().is_lazy());
    assert!(!property.is_lazy());
}

#[test]
fn optional_association_has_nullable_columns() {
    let metadata = build(vec![
        customer(),
        order_with(PropertyDescriptor::many_to_one("customer", "com.acme.Customer")),
    ])
    .unwrap();
    assert!(customer_column_nullable(&metadata));
    let property = metadata.property("com.acme.Order", "customer").unwrap();
    assert!(property.optional_flag());
}

#[test]
fn mandatory_association_has_non_null_columns() {
    let metadata = build(vec![
        customer(),
        order_with(PropertyDescriptor::many_to_one("customer", "com.acme.Customer").mandatory()),
    ])
    .unwrap();
    assert!(!customer_column_nullable(&metadata));
    let property = metadata.property("com.acme.Order", "customer").unwrap();
    assert!(!property.optional_flag());
}

#[test]
fn not_found_ignore_suppresses_the_foreign_key() {
    let metadata = build(vec![
        customer(),
        order_with(
            PropertyDescriptor::many_to_one("customer", "com.acme.Customer")
                .with_not_found(NotFoundAction::Ignore)
                .with_foreign_key(ForeignKeyAnnotation::named("FK_order_customer")),
        ),
    ])
    .unwrap();
    let order = metadata.entity_table("com.acme.Order").unwrap();
    assert!(order.column_by_name("customer_id").is_some());
    assert!(order.foreign_keys().is_empty());

    let value = metadata
        .property("com.acme.Order", "customer")
        .unwrap()
        .value()
        .as_many_to_one()
        .unwrap();
    assert!(value.is_ignore_not_found());
    assert!(!value.is_lazy());
}

#[test]
fn explicit_foreign_key_name_is_used() {
    let metadata = build(vec![
        customer(),
        order_with(
            PropertyDescriptor::many_to_one("customer", "com.acme.Customer")
                .with_foreign_key(ForeignKeyAnnotation::named("FK_order_customer")),
        ),
    ])
    .unwrap();
    let order = metadata.entity_table("com.acme.Order").unwrap();
    assert_eq!(order.foreign_keys()[0].name(), Some("FK_order_customer"));
}

#[test]
fn no_constraint_join_column_suppresses_the_foreign_key() {
    let metadata = build(vec![
        customer(),
        order_with(
            PropertyDescriptor::many_to_one("customer", "com.acme.Customer").with_join_column(
                JoinColumnAnnotation::named("customer_id")
                    .with_foreign_key(ForeignKeyAnnotation::no_constraint()),
            ),
        ),
    ])
    .unwrap();
    assert!(metadata.entity_table("com.acme.Order").unwrap().foreign_keys().is_empty());
}

#[test]
fn unique_join_column_is_a_logical_one_to_one() {
    let metadata = build(vec![
        customer(),
        order_with(
            PropertyDescriptor::one_to_one("customer", "com.acme.Customer")
                .with_join_column(JoinColumnAnnotation::named("customer_id")),
        ),
    ])
    .unwrap();
    let order = metadata.entity_table("com.acme.Order").unwrap();
    let value = metadata
        .property("com.acme.Order", "customer")
        .unwrap()
        .value()
        .as_many_to_one()
        .unwrap();
    assert!(value.is_logical_one_to_one());
    let uk = order
        .unique_keys()
        .iter()
        .find(|uk| order.column_names(uk.columns()) == vec!["customer_id"]);
    assert!(uk.is_some());
}

#[test]
fn join_column_to_a_non_key_column_references_its_property() {
    let metadata = build(vec![
        order_with(
            PropertyDescriptor::many_to_one("customer", "com.acme.Customer")
                .with_join_column(JoinColumnAnnotation::referencing("customer_code", "code")),
        ),
        customer(),
    ])
    .unwrap();

    let value = metadata
        .property("com.acme.Order", "customer")
        .unwrap()
        .value()
        .as_many_to_one()
        .unwrap();
    assert_eq!(value.referenced_property_name(), Some("code"));
    assert!(!value.is_reference_to_primary_key());

    let order = metadata.entity_table("com.acme.Order").unwrap();
    let fk = &order.foreign_keys()[0];
    assert_eq!(order.column_names(fk.columns()), vec!["customer_code"]);
    assert!(!fk.is_referencing_primary_key());

    let customer_table = metadata.entity_table("com.acme.Customer").unwrap();
    assert!(
        customer_table
            .unique_keys()
            .iter()
            .any(|uk| customer_table.column_names(uk.columns()) == vec!["code"])
    );
}

#[test]
fn join_column_to_an_unmapped_column_is_an_error() {
    let err = build(vec![
        customer(),
        order_with(
            PropertyDescriptor::many_to_one("customer", "com.acme.Customer")
                .with_join_column(JoinColumnAnnotation::referencing("customer_ref", "missing")),
        ),
    ])
    .unwrap_err();
    assert!(!err.is_recoverable());
    assert!(err.to_string().contains("'missing'"));
}

#[test]
fn unknown_target_entity_is_an_error() {
    let err = build(vec![order_with(PropertyDescriptor::many_to_one(
        "customer",
        "com.acme.Customer",
    ))])
    .unwrap_err();
    assert!(matches!(
        &err.kind,
        ErrorKind::UnknownEntity { association, entity }
            if association == "com.acme.Order.customer" && entity == "com.acme.Customer"
    ));
}

// =============================================================================
// Inverse One-to-One
// =============================================================================

#[test]
fn mapped_by_one_to_one_is_the_inverse_side() {
    let metadata = build(vec![
        EntityDescriptor::new("com.acme.Person")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(
                PropertyDescriptor::one_to_one("passport", "com.acme.Passport").mapped_by("owner"),
            ),
        EntityDescriptor::new("com.acme.Passport")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::many_to_one("owner", "com.acme.Person")),
    ])
    .unwrap();

    let property = metadata.property("com.acme.Person", "passport").unwrap();
    let Value::OneToOne(value) = property.value() else {
        panic!("expected a one-to-one, got {}", property.value().kind_name());
    };
    assert_eq!(value.mapped_by(), Some("owner"));
    assert_eq!(value.foreign_key_direction(), ForeignKeyDirection::ToParent);
    assert_eq!(value.referenced_property_name(), Some("owner"));

    let person = metadata.entity_table("com.acme.Person").unwrap();
    assert!(person.foreign_keys().is_empty());
    let passport = metadata.entity_table("com.acme.Passport").unwrap();
    assert!(
        passport
            .unique_keys()
            .iter()
            .any(|uk| passport.column_names(uk.columns()) == vec!["owner_id"])
    );
}

#[test]
fn not_found_on_a_lazy_inverse_one_to_one_is_reported() {
    let metadata = build(vec![
        EntityDescriptor::new("com.acme.Person")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(
                PropertyDescriptor::one_to_one("passport", "com.acme.Passport")
                    .mapped_by("owner")
                    .with_fetch_type(FetchType::Lazy)
                    .with_not_found(NotFoundAction::Ignore),
            ),
        EntityDescriptor::new("com.acme.Passport")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::many_to_one("owner", "com.acme.Person")),
    ])
    .unwrap();

    assert!(metadata.anomalies().iter().any(|a| matches!(
        a,
        Anomaly::NotFoundWithLazyFetch { property, .. } if property == "passport"
    )));
    assert!(metadata.property("com.acme.Person", "passport").is_some());
}

#[test]
fn mapped_by_a_missing_property_is_an_error() {
    let err = build(vec![
        EntityDescriptor::new("com.acme.Person")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(
                PropertyDescriptor::one_to_one("passport", "com.acme.Passport").mapped_by("holder"),
            ),
        EntityDescriptor::new("com.acme.Passport").with_property(PropertyDescriptor::id("id", "long")),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("'holder' which does not exist"));
}

// =============================================================================
// One-to-Many
// =============================================================================

fn line() -> EntityDescriptor {
    EntityDescriptor::new("com.acme.Line")
        .with_property(PropertyDescriptor::id("id", "long"))
        .with_property(PropertyDescriptor::basic("quantity", "integer"))
}

#[test]
fn inverse_one_to_many_reuses_the_many_to_one_columns() {
    let metadata = build(vec![
        EntityDescriptor::new("com.acme.Order")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::one_to_many("lines", "com.acme.Line").mapped_by("order")),
        line().with_property(PropertyDescriptor::many_to_one("order", "com.acme.Order")),
    ])
    .unwrap();

    let collection = metadata
        .property("com.acme.Order", "lines")
        .unwrap()
        .value()
        .as_collection()
        .unwrap();
    assert!(collection.is_inverse());
    assert_eq!(collection.role(), "com.acme.Order.lines");

    let line_table = metadata.entity_table("com.acme.Line").unwrap();
    assert_eq!(collection.collection_table(), line_table.id());
    let key = collection.key().unwrap();
    assert_eq!(line_table.column_names(&key.columns()), vec!["order_id"]);
    assert_eq!(line_table.foreign_keys().len(), 1);
}

#[test]
fn unidirectional_one_to_many_adds_a_key_to_the_element_table() {
    let metadata = build(vec![
        EntityDescriptor::new("com.acme.Order")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::one_to_many("lines", "com.acme.Line")),
        line(),
    ])
    .unwrap();

    let collection = metadata
        .property("com.acme.Order", "lines")
        .unwrap()
        .value()
        .as_collection()
        .unwrap();
    assert!(!collection.is_inverse());
    let key = collection.key().unwrap();
    assert_eq!(key.wrapped_entity(), "com.acme.Order");

    let line_table = metadata.entity_table("com.acme.Line").unwrap();
    assert_eq!(key.table(), line_table.id());
    assert_eq!(key.columns().len(), 1);
    let fk = &line_table.foreign_keys()[0];
    assert_eq!(fk.referenced_entity_name(), "com.acme.Order");
    assert_eq!(fk.columns(), key.columns().as_slice());
}

#[test]
fn collection_mapped_by_a_basic_property_is_an_error() {
    let err = build(vec![
        EntityDescriptor::new("com.acme.Order")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::one_to_many("lines", "com.acme.Line").mapped_by("quantity")),
        line(),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("not a '@ManyToOne'"));
}
