//! End-to-end binding scenarios
//!
//! Each scenario builds a small domain model from scratch and checks the
//! resulting tables, keys, and entity classes. Several scenarios are run
//! under every declaration order, since binding order must never change
//! the final model.

use ormbind_binder::descriptor::{
    DiscriminatorColumnAnnotation, DiscriminatorType, InheritanceType, JoinColumnAnnotation,
};
use ormbind_binder::{
    BuildingOptions, EmbeddableDescriptor, EntityDescriptor, Metadata, MetadataSources,
    PropertyDescriptor, build_metadata,
};
use ormbind_foundation::names::java_string_hash;
use ormbind_foundation::{ErrorKind, Result};
use ormbind_model::{ForeignKeyDirection, Value};
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

const PERMUTATIONS_OF_THREE: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

fn build(entities: &[EntityDescriptor]) -> Result<Metadata> {
    build_with(entities, MetadataSources::new())
}

fn build_with(entities: &[EntityDescriptor], sources: MetadataSources) -> Result<Metadata> {
    let sources = entities.iter().cloned().fold(sources, MetadataSources::with_entity);
    build_metadata(&sources, BuildingOptions::default())
}

/// A name-based rendering of one table, independent of handle numbering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct TableSummary {
    name: String,
    columns: Vec<(String, bool)>,
    primary_key: Vec<String>,
    foreign_keys: Vec<(String, Vec<String>, String)>,
    unique_keys: Vec<Vec<String>>,
}

fn summarize(metadata: &Metadata) -> Vec<TableSummary> {
    let mut tables: Vec<TableSummary> = metadata
        .database()
        .tables()
        .map(|t| {
            let mut columns: Vec<(String, bool)> = t
                .columns()
                .map(|(_, c)| (c.name().text().to_string(), c.is_nullable()))
                .collect();
            columns.sort();
            let mut foreign_keys: Vec<(String, Vec<String>, String)> = t
                .foreign_keys()
                .iter()
                .map(|fk| {
                    (
                        fk.name().unwrap_or_default().to_string(),
                        t.column_names(fk.columns()),
                        fk.referenced_entity_name().to_string(),
                    )
                })
                .collect();
            foreign_keys.sort();
            let mut unique_keys: Vec<Vec<String>> = t
                .unique_keys()
                .iter()
                .map(|uk| {
                    let mut names = t.column_names(uk.columns());
                    names.sort();
                    names
                })
                .collect();
            unique_keys.sort();
            TableSummary {
                name: t.name().text().to_string(),
                columns,
                primary_key: t.column_names(t.primary_key_columns()),
                foreign_keys,
                unique_keys,
            }
        })
        .collect();
    tables.sort();
    tables
}

fn table<'a>(summary: &'a [TableSummary], name: &str) -> &'a TableSummary {
    summary
        .iter()
        .find(|t| t.name == name)
        .unwrap_or_else(|| panic!("no table named {name}"))
}

// =============================================================================
// Forward References
// =============================================================================

fn shop() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::new("com.acme.Order")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::many_to_one("customer", "com.acme.Customer").mandatory())
            .with_property(PropertyDescriptor::one_to_many("lines", "com.acme.Line").mapped_by("order")),
        EntityDescriptor::new("com.acme.Customer")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::basic("name", "string")),
        EntityDescriptor::new("com.acme.Line")
            .with_property(PropertyDescriptor::id("id", "long"))
            .with_property(PropertyDescriptor::many_to_one("order", "com.acme.Order"))
            .with_property(PropertyDescriptor::many_to_one("product", "com.acme.Product")),
        EntityDescriptor::new("com.acme.Product")
            .with_property(PropertyDescriptor::id("sku", "string")),
        EntityDescriptor::new("com.acme.LoyaltyCard")
            .with_property(PropertyDescriptor::many_to_one("customer", "com.acme.Customer").as_id())
            .with_property(PropertyDescriptor::basic("points", "integer")),
    ]
}

#[test]
fn order_declared_before_customer_resolves() {
    let summary = summarize(&build(&shop()).unwrap());

    let order = table(&summary, "Order");
    assert!(order.columns.contains(&("customer_id".to_string(), false)));
    assert_eq!(order.foreign_keys.len(), 1);
    assert_eq!(order.foreign_keys[0].1, vec!["customer_id"]);
    assert_eq!(order.foreign_keys[0].2, "com.acme.Customer");

    let line = table(&summary, "Line");
    let referenced: Vec<&str> = line.foreign_keys.iter().map(|fk| fk.2.as_str()).collect();
    assert_eq!(referenced.len(), 2);
    assert!(referenced.contains(&"com.acme.Order"));
    assert!(referenced.contains(&"com.acme.Product"));
    assert!(line.columns.contains(&("product_sku".to_string(), true)));

    let card = table(&summary, "LoyaltyCard");
    assert_eq!(card.primary_key, vec!["customer_id"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn declaration_order_does_not_change_the_model(
        order in Just((0..5).collect::<Vec<usize>>()).prop_shuffle()
    ) {
        let entities = shop();
        let expected = summarize(&build(&entities).unwrap());
        let shuffled: Vec<EntityDescriptor> = order.iter().map(|&i| entities[i].clone()).collect();
        let actual = summarize(&build(&shuffled).unwrap());
        prop_assert_eq!(actual, expected);
    }
}

// =============================================================================
// Discriminator Defaults
// =============================================================================

fn animals(discriminator: Option<DiscriminatorType>) -> Vec<EntityDescriptor> {
    let mut root = EntityDescriptor::new("com.acme.Animal")
        .with_inheritance(InheritanceType::SingleTable)
        .with_property(PropertyDescriptor::id("id", "long"));
    if let Some(kind) = discriminator {
        root = root.with_discriminator_column(DiscriminatorColumnAnnotation::default().of_type(kind));
    }
    vec![root, EntityDescriptor::new("com.acme.Dog").extends("com.acme.Animal")]
}

fn dog_discriminator(metadata: &Metadata) -> Option<String> {
    metadata.entity("com.acme.Dog").unwrap().discriminator_value.clone()
}

#[test]
fn string_and_absent_discriminators_default_to_the_entity_name() {
    for kind in [None, Some(DiscriminatorType::String)] {
        let metadata = build(&animals(kind)).unwrap();
        assert_eq!(dog_discriminator(&metadata).as_deref(), Some("Dog"));
    }
}

#[test]
fn integer_discriminator_defaults_to_the_name_hash() {
    let metadata = build(&animals(Some(DiscriminatorType::Integer))).unwrap();
    assert_eq!(dog_discriminator(&metadata), Some(java_string_hash("Dog").to_string()));
    assert_eq!(dog_discriminator(&metadata).as_deref(), Some("68892"));
}

#[test]
fn char_discriminator_without_value_fails() {
    let err = build(&animals(Some(DiscriminatorType::Char))).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Annotation(_)));
}

// =============================================================================
// Identifier Classes
// =============================================================================

fn line_id() -> EmbeddableDescriptor {
    EmbeddableDescriptor::new("com.acme.LineId")
        .with_property(PropertyDescriptor::basic("order", "long"))
        .with_property(PropertyDescriptor::basic("lineNo", "integer"))
}

fn order_line() -> EntityDescriptor {
    EntityDescriptor::new("com.acme.OrderLine")
        .with_id_class("com.acme.LineId")
        .with_property(PropertyDescriptor::many_to_one("order", "com.acme.Order").as_id())
        .with_property(PropertyDescriptor::id("lineNo", "integer"))
        .with_property(PropertyDescriptor::basic("quantity", "integer"))
}

fn plain_order() -> EntityDescriptor {
    EntityDescriptor::new("com.acme.Order").with_property(PropertyDescriptor::id("id", "long"))
}

#[test]
fn id_class_and_mapper_share_one_foreign_key() {
    for entities in [
        vec![order_line(), plain_order()],
        vec![plain_order(), order_line()],
    ] {
        let metadata = build_with(&entities, MetadataSources::new().with_embeddable(line_id())).unwrap();
        let table = metadata.entity_table("com.acme.OrderLine").unwrap();
        assert_eq!(table.foreign_keys().len(), 1);
        let fk = &table.foreign_keys()[0];
        assert_eq!(table.column_names(fk.columns()), vec!["order_id"]);
        assert_eq!(fk.referenced_entity_name(), "com.acme.Order");

        let mut key = table.column_names(table.primary_key_columns());
        key.sort();
        assert_eq!(key, vec!["lineNo", "order_id"]);

        let class = metadata.entity("com.acme.OrderLine").unwrap();
        let mapper = class.property("_identifierMapper").unwrap();
        assert!(!mapper.is_insertable());
        assert_eq!(mapper.value().as_component().unwrap().property_span(), 2);
    }
}

// =============================================================================
// Derived Identity Chains
// =============================================================================

fn derived_chain() -> [EntityDescriptor; 3] {
    [
        EntityDescriptor::new("com.acme.A").with_property(PropertyDescriptor::id("id", "long")),
        EntityDescriptor::new("com.acme.B")
            .with_property(PropertyDescriptor::many_to_one("a", "com.acme.A").as_id()),
        EntityDescriptor::new("com.acme.C")
            .with_property(PropertyDescriptor::many_to_one("b", "com.acme.B").as_id()),
    ]
}

#[test]
fn derived_identity_chain_resolves_in_every_order() {
    let chain = derived_chain();
    let mut summaries = Vec::new();
    for permutation in PERMUTATIONS_OF_THREE {
        let entities: Vec<EntityDescriptor> =
            permutation.iter().map(|&i| chain[i].clone()).collect();
        let metadata = build(&entities).unwrap_or_else(|e| panic!("{permutation:?}: {e}"));
        let summary = summarize(&metadata);

        let b = table(&summary, "B");
        assert_eq!(b.primary_key, vec!["a_id"], "{permutation:?}");
        assert_eq!(b.foreign_keys[0].2, "com.acme.A");
        let c = table(&summary, "C");
        assert_eq!(c.primary_key, vec!["b_a_id"], "{permutation:?}");
        assert_eq!(c.foreign_keys.len(), 1);
        assert_eq!(c.foreign_keys[0].2, "com.acme.B");

        summaries.push(summary);
    }
    assert!(summaries.windows(2).all(|w| w[0] == w[1]));
}

// =============================================================================
// Bidirectional One-to-One
// =============================================================================

fn a_side() -> EntityDescriptor {
    EntityDescriptor::new("com.acme.A")
        .with_property(PropertyDescriptor::id("id", "long"))
        .with_property(PropertyDescriptor::one_to_one("b", "com.acme.B").mapped_by("a"))
}

fn b_side() -> EntityDescriptor {
    EntityDescriptor::new("com.acme.B")
        .with_property(PropertyDescriptor::id("id", "long"))
        .with_property(
            PropertyDescriptor::many_to_one("a", "com.acme.A")
                .with_join_column(JoinColumnAnnotation::named("a_id").with_unique(true)),
        )
}

#[test]
fn mapped_by_one_to_one_resolves_in_both_orders() {
    let mut summaries = Vec::new();
    for entities in [vec![a_side(), b_side()], vec![b_side(), a_side()]] {
        let metadata = build(&entities).unwrap();

        let b_table = metadata.entity_table("com.acme.B").unwrap();
        let a_id = b_table.column_by_name("a_id").unwrap();
        assert!(b_table.column(a_id).unwrap().is_unique());
        assert!(b_table.unique_keys().iter().any(|uk| uk.columns() == [a_id]));
        assert_eq!(b_table.foreign_keys()[0].referenced_entity_name(), "com.acme.A");

        let property = metadata.property("com.acme.A", "b").unwrap();
        let Value::OneToOne(value) = property.value() else {
            panic!("A.b is a {}", property.value().kind_name());
        };
        assert_eq!(value.mapped_by(), Some("a"));
        assert_eq!(value.foreign_key_direction(), ForeignKeyDirection::ToParent);
        assert!(metadata.entity_table("com.acme.A").unwrap().foreign_keys().is_empty());

        summaries.push(summarize(&metadata));
    }
    assert_eq!(summaries[0], summaries[1]);
}

// =============================================================================
// Shared Primary Keys
// =============================================================================

fn user() -> EntityDescriptor {
    EntityDescriptor::new("com.acme.User")
        .with_property(PropertyDescriptor::id("id", "long"))
        .with_property(PropertyDescriptor::basic("login", "string"))
}

fn user_details() -> EntityDescriptor {
    EntityDescriptor::new("com.acme.UserDetails")
        .with_property(PropertyDescriptor::id("id", "long"))
        .with_property(PropertyDescriptor::one_to_one("user", "com.acme.User").with_maps_id(""))
        .with_property(PropertyDescriptor::basic("bio", "string"))
}

#[test]
fn maps_id_shares_the_owner_identifier_in_both_orders() {
    let mut summaries = Vec::new();
    for entities in [vec![user_details(), user()], vec![user(), user_details()]] {
        let metadata = build(&entities).unwrap();
        let summary = summarize(&metadata);

        let details = table(&summary, "UserDetails");
        assert_eq!(
            details.columns,
            vec![("bio".to_string(), true), ("id".to_string(), false)]
        );
        assert_eq!(details.primary_key, vec!["id"]);
        assert_eq!(details.foreign_keys.len(), 1);
        assert_eq!(details.foreign_keys[0].1, vec!["id"]);
        assert_eq!(details.foreign_keys[0].2, "com.acme.User");

        let property = metadata.property("com.acme.UserDetails", "user").unwrap();
        assert!(!property.is_insertable());
        assert!(!property.optional_flag());
        let value = property.value().as_to_one().unwrap();
        assert_eq!(value.column_insertability(), [false]);

        summaries.push(summary);
    }
    assert_eq!(summaries[0], summaries[1]);
}

// =============================================================================
// Subclass Restrictions
// =============================================================================

#[test]
fn subclass_may_not_redeclare_a_composite_identifier_part() {
    let gift_line = EntityDescriptor::new("com.acme.GiftLine")
        .extends("com.acme.OrderLine")
        .with_property(PropertyDescriptor::basic("lineNo", "integer"));
    for entities in [
        vec![order_line(), plain_order(), gift_line.clone()],
        vec![gift_line.clone(), plain_order(), order_line()],
    ] {
        let err = build_with(&entities, MetadataSources::new().with_embeddable(line_id())).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Annotation(_)));
        assert!(err.to_string().contains("'lineNo'"));
        assert!(err.to_string().contains("composite identifier"));
    }
}
