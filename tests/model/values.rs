//! Integration tests for values and properties

use ormbind_foundation::{Identifier, Name};
use ormbind_model::{
    CascadeStyle, Column, Component, Database, ManyToOne, Property, SimpleValue, Value,
};
use proptest::prelude::*;

fn ident(s: &str) -> Identifier {
    Identifier::to_identifier(s).unwrap()
}

fn basic(db: &mut Database, table: &str, column: &str, nullable: bool) -> SimpleValue {
    let t = db.add_table(None, None, ident(table), None, false);
    let id = db
        .table_mut(t)
        .unwrap()
        .add_column(Column::new(ident(column)).with_nullable(nullable));
    let mut value = SimpleValue::new(t);
    value.add_column(id, true, true).unwrap();
    value
}

// =============================================================================
// Nullability
// =============================================================================

#[test]
fn value_is_nullable_unless_a_column_is_not() {
    let mut db = Database::new();
    let nullable = basic(&mut db, "orders", "note", true);
    let required = basic(&mut db, "orders", "total", false);
    assert!(nullable.is_nullable(&db));
    assert!(!required.is_nullable(&db));
}

#[test]
fn formulas_are_nullable() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("orders"), None, false);
    let mut value = SimpleValue::new(t);
    value.add_formula("total * 2");
    assert!(value.has_formula());
    assert!(value.is_nullable(&db));
    assert!(value.columns().is_empty());
}

#[test]
fn reset_optional_updates_columns() {
    let mut db = Database::new();
    let value = basic(&mut db, "orders", "total", true);
    let column = value.columns()[0];
    let mut property = Property::new(Name::new("total"), Value::Simple(value));
    assert!(property.is_optional(&db));

    property.reset_optional(false, &mut db);
    assert!(!property.optional_flag());
    assert!(!db.column(column).unwrap().is_nullable());
    assert!(!property.is_optional(&db));
}

// =============================================================================
// Associations
// =============================================================================

#[test]
fn many_to_one_defaults() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("lines"), None, false);
    let value = Value::ManyToOne(ManyToOne::new(t));
    let to_one = value.as_to_one().unwrap();
    assert!(to_one.is_lazy());
    assert!(to_one.is_reference_to_primary_key());
    assert!(to_one.referenced_entity_name().is_none());
    assert_eq!(value.kind_name(), "many-to-one");
    assert!(value.is_to_one());
    assert!(value.as_many_to_one().unwrap().not_found_action().is_none());
}

#[test]
fn foreign_key_is_skipped_for_formulas() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("lines"), None, false);
    let mut value = ManyToOne::new(t);
    value.add_formula("order_ref");
    value
        .create_foreign_key(&mut db, "com.acme.Order", None, Vec::new())
        .unwrap();
    assert!(db.table(t).unwrap().foreign_keys().is_empty());
}

#[test]
fn disabled_foreign_key_is_not_created() {
    let mut db = Database::new();
    let mut value = basic(&mut db, "lines", "order_id", true);
    value.foreign_key_mut().disable();
    value
        .create_foreign_key(&mut db, "com.acme.Order", None, Vec::new())
        .unwrap();
    assert!(db.table(value.table()).unwrap().foreign_keys().is_empty());
}

// =============================================================================
// Components and Cascades
// =============================================================================

#[test]
fn component_collects_nested_cascades() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("orders"), None, false);
    let mut component = Component::new(t, "com.acme.Order.shipping");

    let mut carrier = Property::new(Name::new("carrier"), Value::ManyToOne(ManyToOne::new(t)));
    carrier.set_cascade(Some("persist, merge".into()));
    let mut depot = Property::new(Name::new("depot"), Value::ManyToOne(ManyToOne::new(t)));
    depot.set_cascade(Some("merge".into()));
    component.add_property(carrier);
    component.add_property(depot);

    let property = Property::new(Name::new("shipping"), Value::Component(component));
    assert!(property.is_composite());
    assert_eq!(
        property.cascade_styles().unwrap(),
        vec![CascadeStyle::Persist, CascadeStyle::Merge]
    );
}

#[test]
fn unknown_cascade_style_is_an_error() {
    let mut db = Database::new();
    let value = basic(&mut db, "orders", "total", true);
    let mut property = Property::new(Name::new("total"), Value::Simple(value));
    property.set_cascade(Some("all,explode".into()));
    let err = property.cascade_styles().unwrap_err();
    assert!(err.to_string().contains("explode"));
}

proptest! {
    #[test]
    fn cascade_styles_parse_their_own_names(index in 0usize..12) {
        let all = [
            CascadeStyle::All,
            CascadeStyle::AllDeleteOrphan,
            CascadeStyle::SaveUpdate,
            CascadeStyle::Persist,
            CascadeStyle::Merge,
            CascadeStyle::Lock,
            CascadeStyle::Refresh,
            CascadeStyle::Replicate,
            CascadeStyle::Evict,
            CascadeStyle::Delete,
            CascadeStyle::DeleteOrphan,
            CascadeStyle::None,
        ];
        let style = all[index];
        prop_assert_eq!(CascadeStyle::parse(style.as_str()).unwrap(), style);
    }
}
