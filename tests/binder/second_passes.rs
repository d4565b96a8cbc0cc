//! Integration tests for deferred resolution across entities

use ormbind_binder::descriptor::InheritanceType;
use ormbind_binder::{
    BuildingOptions, EntityDescriptor, Metadata, MetadataSources, PropertyDescriptor,
    build_metadata,
};
use ormbind_foundation::{ErrorKind, Result};

fn build(entities: Vec<EntityDescriptor>) -> Result<Metadata> {
    let sources = entities
        .into_iter()
        .fold(MetadataSources::new(), MetadataSources::with_entity);
    build_metadata(&sources, BuildingOptions::default())
}

fn primary_key_names(metadata: &Metadata, entity: &str) -> Vec<String> {
    let table = metadata.entity_table(entity).unwrap();
    table.column_names(table.primary_key_columns())
}

// =============================================================================
// Joined Subclasses
// =============================================================================

fn joined_hierarchy() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::new("com.acme.Puppy")
            .extends("com.acme.Dog")
            .with_property(PropertyDescriptor::basic("ageInWeeks", "integer")),
        EntityDescriptor::new("com.acme.Dog")
            .extends("com.acme.Animal")
            .with_property(PropertyDescriptor::basic("barks", "boolean")),
        EntityDescriptor::new("com.acme.Animal")
            .with_inheritance(InheritanceType::Joined)
            .with_property(PropertyDescriptor::id("id", "long")),
    ]
}

#[test]
fn joined_subclass_keys_resolve_parent_first() {
    let metadata = build(joined_hierarchy()).unwrap();

    for (entity, parent) in [
        ("com.acme.Dog", "com.acme.Animal"),
        ("com.acme.Puppy", "com.acme.Dog"),
    ] {
        assert_eq!(primary_key_names(&metadata, entity), vec!["id"], "{entity}");
        let table = metadata.entity_table(entity).unwrap();
        assert_eq!(table.foreign_keys().len(), 1, "{entity}");
        let fk = &table.foreign_keys()[0];
        assert_eq!(fk.referenced_entity_name(), parent);
        assert_eq!(table.column_names(fk.columns()), vec!["id"]);
    }
}

#[test]
fn joined_subclass_columns_stay_on_their_own_table() {
    let metadata = build(joined_hierarchy()).unwrap();
    let animal = metadata.entity_table("com.acme.Animal").unwrap();
    let dog = metadata.entity_table("com.acme.Dog").unwrap();
    assert!(animal.column_by_name("barks").is_none());
    assert!(dog.column_by_name("barks").is_some());
    assert!(dog.column_by_name("ageInWeeks").is_none());
}

// =============================================================================
// Union Subclasses
// =============================================================================

#[test]
fn union_subclass_tables_receive_inherited_columns() {
    let metadata = build(vec![
        EntityDescriptor::new("com.acme.Circle")
            .extends("com.acme.Shape")
            .with_property(PropertyDescriptor::basic("radius", "double")),
        EntityDescriptor::new("com.acme.Shape")
            .with_inheritance(InheritanceType::TablePerClass)
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::basic("colour", "string")),
    ])
    .unwrap();

    let circle = metadata.entity_table("com.acme.Circle").unwrap();
    for column in ["id", "colour", "radius"] {
        assert!(circle.column_by_name(column).is_some(), "{column}");
    }
    assert_eq!(primary_key_names(&metadata, "com.acme.Circle"), vec!["id"]);
    let shape = metadata.entity_table("com.acme.Shape").unwrap();
    assert!(shape.column_by_name("radius").is_none());
}

// =============================================================================
// Derived Identifiers
// =============================================================================

#[test]
fn circular_derived_identifiers_are_rejected() {
    let err = build(vec![
        EntityDescriptor::new("com.acme.A")
            .with_property(PropertyDescriptor::many_to_one("b", "com.acme.B").as_id()),
        EntityDescriptor::new("com.acme.B")
            .with_property(PropertyDescriptor::many_to_one("a", "com.acme.A").as_id()),
    ])
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Annotation(_)));
    assert!(err.to_string().contains("circularity"));
}

#[test]
fn derived_identifier_becomes_the_primary_key() {
    let metadata = build(vec![
        EntityDescriptor::new("com.acme.Profile")
            .with_property(PropertyDescriptor::many_to_one("user", "com.acme.User").as_id())
            .with_property(PropertyDescriptor::basic("bio", "string")),
        EntityDescriptor::new("com.acme.User").with_property(PropertyDescriptor::id("id", "long")),
    ])
    .unwrap();

    assert_eq!(primary_key_names(&metadata, "com.acme.Profile"), vec!["user_id"]);
    let table = metadata.entity_table("com.acme.Profile").unwrap();
    let id = table.column_by_name("user_id").unwrap();
    assert!(!table.column(id).unwrap().is_nullable());
    assert_eq!(table.foreign_keys()[0].referenced_entity_name(), "com.acme.User");

    let user = metadata.property("com.acme.Profile", "id.user").unwrap();
    assert!(user.value().as_many_to_one().is_some());
}

#[test]
fn errors_from_deferred_work_name_the_pass() {
    let err = build(vec![
        EntityDescriptor::new("com.acme.Order")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::many_to_one("customer", "com.acme.Customer")),
    ])
    .unwrap_err();
    let pass = err.context.as_ref().and_then(|c| c.pass.as_deref());
    assert_eq!(pass, Some("foreign key of com.acme.Order.customer"));
}
