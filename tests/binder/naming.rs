//! Integration tests for implicit and physical naming

use ormbind_binder::descriptor::{ColumnAnnotation, JoinColumnAnnotation};
use ormbind_binder::{
    BuildingOptions, EntityDescriptor, Metadata, MetadataSources, PropertyDescriptor,
    SnakeCasePhysicalNaming, build_metadata,
};
use proptest::prelude::*;

fn sources() -> MetadataSources {
    MetadataSources::new()
        .with_entity(
            EntityDescriptor::new("com.acme.BillingAccount")
                .with_property(PropertyDescriptor::id("accountId", "long")),
        )
        .with_entity(
            EntityDescriptor::new("com.acme.PurchaseOrder")
                .with_property(PropertyDescriptor::id("id", "long"))
                .with_property(PropertyDescriptor::basic("createdAt", "timestamp"))
                .with_property(
                    PropertyDescriptor::basic("total", "decimal")
                        .with_column(ColumnAnnotation::named("\"OrderTotal\"")),
                )
                .with_property(PropertyDescriptor::many_to_one(
                    "billingAccount",
                    "com.acme.BillingAccount",
                )),
        )
}

/// Table name, then sorted column names, for every table.
fn layout(metadata: &Metadata) -> Vec<(String, Vec<String>)> {
    let mut tables: Vec<(String, Vec<String>)> = metadata
        .database()
        .tables()
        .map(|t| {
            let mut columns: Vec<String> =
                t.columns().map(|(_, c)| c.name().text().to_string()).collect();
            columns.sort();
            (t.name().text().to_string(), columns)
        })
        .collect();
    tables.sort();
    tables
}

// =============================================================================
// Implicit Names
// =============================================================================

#[test]
fn implicit_names_follow_class_and_property_names() {
    let metadata = build_metadata(&sources(), BuildingOptions::default()).unwrap();
    let table = metadata.entity_table("com.acme.PurchaseOrder").unwrap();
    assert_eq!(table.name().text(), "PurchaseOrder");
    assert!(table.column_by_name("createdAt").is_some());
    assert!(table.column_by_name("billingAccount_accountId").is_some());
}

#[test]
fn explicit_join_column_name_is_kept() {
    let sources = MetadataSources::new()
        .with_entity(
            EntityDescriptor::new("com.acme.Customer")
                .with_property(PropertyDescriptor::id("id", "long")),
        )
        .with_entity(
            EntityDescriptor::new("com.acme.Order")
                .with_property(PropertyDescriptor::id("id", "long"))
                .with_property(
                    PropertyDescriptor::many_to_one("customer", "com.acme.Customer")
                        .with_join_column(JoinColumnAnnotation::named("cust_fk")),
                ),
        );
    let metadata = build_metadata(&sources, BuildingOptions::default()).unwrap();
    let table = metadata.entity_table("com.acme.Order").unwrap();
    assert!(table.column_by_name("cust_fk").is_some());
    assert!(table.column_by_name("customer_id").is_none());
}

// =============================================================================
// Physical Names
// =============================================================================

#[test]
fn snake_case_naming_rewrites_unquoted_names() {
    let options = BuildingOptions::default().with_physical_naming(SnakeCasePhysicalNaming);
    let metadata = build_metadata(&sources(), options).unwrap();

    let table = metadata.entity_table("com.acme.PurchaseOrder").unwrap();
    assert_eq!(table.name().text(), "purchase_order");
    assert!(table.column_by_name("created_at").is_some());
    assert!(table.column_by_name("billing_account_account_id").is_some());

    assert!(table.column_by_name("OrderTotal").is_none());
    let quoted = table.column_by_name("\"OrderTotal\"").unwrap();
    let column = table.column(quoted).unwrap();
    assert!(column.name().is_quoted());
    assert_eq!(column.name().text(), "OrderTotal");
}

#[test]
fn snake_case_foreign_keys_reference_snake_case_keys() {
    let options = BuildingOptions::default().with_physical_naming(SnakeCasePhysicalNaming);
    let metadata = build_metadata(&sources(), options).unwrap();
    let order = metadata.entity_table("com.acme.PurchaseOrder").unwrap();
    let fk = &order.foreign_keys()[0];
    assert_eq!(fk.referenced_entity_name(), "com.acme.BillingAccount");
    assert_eq!(order.column_names(fk.columns()), vec!["billing_account_account_id"]);
    assert!(fk.name().is_some_and(|n| n.starts_with("FK")));
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn building_twice_yields_the_same_names(snake in any::<bool>(), extra in 0usize..4) {
        let mut entity = EntityDescriptor::new("com.acme.LineItem")
            .with_property(PropertyDescriptor::id("lineId", "long"));
        for i in 0..extra {
            entity = entity.with_property(PropertyDescriptor::basic(format!("fieldNumber{i}"), "string"));
        }
        let sources = sources().with_entity(entity);
        let options = || {
            if snake {
                BuildingOptions::default().with_physical_naming(SnakeCasePhysicalNaming)
            } else {
                BuildingOptions::default()
            }
        };
        let first = build_metadata(&sources, options()).unwrap();
        let second = build_metadata(&sources, options()).unwrap();
        prop_assert_eq!(layout(&first), layout(&second));

        let fk_names = |m: &Metadata| -> Vec<Option<String>> {
            m.database()
                .tables()
                .flat_map(|t| t.foreign_keys().iter().map(|fk| fk.name().map(str::to_string)))
                .collect()
        };
        prop_assert_eq!(fk_names(&first), fk_names(&second));
    }
}
