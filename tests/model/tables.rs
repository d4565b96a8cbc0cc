//! Integration tests for Database, Table, and constraints

use ormbind_foundation::Identifier;
use ormbind_model::constraint::generate_name;
use ormbind_model::{Column, Database, PrimaryKey, UniqueKey};

fn ident(s: &str) -> Identifier {
    Identifier::to_identifier(s).unwrap()
}

// =============================================================================
// Columns
// =============================================================================

#[test]
fn columns_are_deduplicated_by_canonical_name() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("orders"), None, false);
    let table = db.table_mut(t).unwrap();
    let a = table.add_column(Column::new(ident("total")));
    let b = table.add_column(Column::new(ident("TOTAL")));
    assert_eq!(a, b);
    assert_eq!(table.column_span(), 1);
    assert_eq!(table.column_by_name("Total"), Some(a));
}

#[test]
fn quoted_columns_keep_their_case() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("orders"), None, false);
    let table = db.table_mut(t).unwrap();
    let quoted = table.add_column(Column::new(ident("`Total`")));
    let plain = table.add_column(Column::new(ident("total")));
    assert_ne!(quoted, plain);
    assert_eq!(table.column_span(), 2);
}

#[test]
fn column_lookup_across_tables() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("orders"), None, false);
    let id = db.table_mut(t).unwrap().add_column(Column::new(ident("id")).with_nullable(false));
    assert!(!db.column(id).unwrap().is_nullable());
    db.column_mut(id).unwrap().set_nullable(true);
    assert!(db.column(id).unwrap().is_nullable());
}

// =============================================================================
// Keys
// =============================================================================

#[test]
fn generated_names_ignore_column_order() {
    let ab = generate_name("UK_", "orders", &["a".to_string(), "b".to_string()]);
    let ba = generate_name("UK_", "orders", &["b".to_string(), "a".to_string()]);
    assert_eq!(ab, ba);
    assert!(ab.starts_with("UK_"));
    assert_ne!(ab, generate_name("UK_", "lines", &["a".to_string(), "b".to_string()]));
}

#[test]
fn unique_key_matching_primary_key_is_cleansed() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("orders"), None, false);
    let table = db.table_mut(t).unwrap();
    let id = table.add_column(Column::new(ident("id")));
    let code = table.add_column(Column::new(ident("code")));
    table.set_primary_key(PrimaryKey::new(vec![id]));
    table.create_unique_key(&[id]);
    table.create_unique_key(&[code]);

    let remaining = table.cleanse_unique_keys();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].columns(), &[code]);
}

#[test]
fn composite_unique_keys_are_cleansed() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("lines"), None, false);
    let table = db.table_mut(t).unwrap();
    let [a, b, c, d] = ["a", "b", "c", "d"].map(|n| table.add_column(Column::new(ident(n))));
    table.set_primary_key(PrimaryKey::new(vec![a, b]));
    table
        .add_unique_key(UniqueKey::new("UK_ba").with_column(b).with_column(a))
        .unwrap();
    table
        .add_unique_key(UniqueKey::new("UK_cd").with_column(c).with_column(d))
        .unwrap();
    table
        .add_unique_key(UniqueKey::new("UK_dc").with_column(d).with_column(c))
        .unwrap();

    let remaining = table.cleanse_unique_keys();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name(), "UK_dc");
}

#[test]
fn duplicate_unique_key_names_are_rejected() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("orders"), None, false);
    let table = db.table_mut(t).unwrap();
    table.add_unique_key(UniqueKey::new("UK_code")).unwrap();
    assert!(table.add_unique_key(UniqueKey::new("UK_code")).is_err());
}

#[test]
fn equivalent_foreign_keys_are_merged() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("lines"), None, false);
    let table = db.table_mut(t).unwrap();
    let order_id = table.add_column(Column::new(ident("order_id")));
    table.create_foreign_key(None, vec![order_id], "com.acme.Order", None, Vec::new());
    table.create_foreign_key(Some("FK_line_order".into()), vec![order_id], "com.acme.Order", None, Vec::new());
    assert_eq!(table.foreign_keys().len(), 1);
    assert_eq!(table.foreign_keys()[0].name(), Some("FK_line_order"));
    assert!(table.foreign_keys()[0].is_referencing_primary_key());
}

#[test]
fn unnamed_foreign_keys_get_generated_names() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("lines"), None, false);
    let table = db.table_mut(t).unwrap();
    let order_id = table.add_column(Column::new(ident("order_id")));
    table.create_foreign_key(None, vec![order_id], "com.acme.Order", None, Vec::new());
    table.name_foreign_keys();
    let expected = generate_name("FK", "lines", &["order_id".to_string()]);
    assert_eq!(table.foreign_keys()[0].name(), Some(expected.as_str()));
}

// =============================================================================
// Table Attributes
// =============================================================================

#[test]
fn table_attributes() {
    let mut db = Database::new();
    let t = db.add_table(None, Some(ident("sales")), ident("orders"), None, false);
    let table = db.table_mut(t).unwrap();
    table.add_check_constraint("total >= 0");
    table.set_comment(Some("Customer orders".into()));
    table.set_row_id(Some("rowid".into()));

    let table = db.table(t).unwrap();
    assert_eq!(table.check_constraints(), &["total >= 0".to_string()]);
    assert_eq!(table.comment(), Some("Customer orders"));
    assert_eq!(table.row_id(), Some("rowid"));
    assert!(table.is_physical_table());
    assert_eq!(db.table_by_name("ORDERS"), Some(t));
}
