//! Integration tests for EntityBindings
//!
//! Tests class registration, hierarchy navigation, and path lookup.

use ormbind_foundation::{Identifier, Name};
use ormbind_model::{
    ClassKind, Column, Component, Database, EntityBindings, PersistentClass, Property, SimpleValue,
    TableId, Value,
};

fn ident(s: &str) -> Identifier {
    Identifier::to_identifier(s).unwrap()
}

fn simple(db: &mut Database, table: TableId, column: &str) -> Value {
    let id = db.table_mut(table).unwrap().add_column(Column::new(ident(column)));
    let mut value = SimpleValue::new(table);
    value.add_column(id, true, true).unwrap();
    Value::Simple(value)
}

/// `Animal` (id) <- `Dog` (name) <- `Puppy`, all on one table.
fn hierarchy() -> (Database, EntityBindings, [ormbind_model::ClassId; 3]) {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("Animal"), None, false);
    let mut bindings = EntityBindings::new();

    let mut animal = PersistentClass::root("com.acme.Animal", t);
    let id = simple(&mut db, t, "id");
    animal.root_data_mut().unwrap().identifier_property = Some(Property::new(Name::new("id"), id.clone()));
    animal.root_data_mut().unwrap().identifier = Some(id);
    let animal = bindings.add(animal).unwrap();

    let mut dog = PersistentClass::subclass(ClassKind::SingleTable, "com.acme.Dog", t, animal);
    dog.add_property(Property::new(Name::new("name"), simple(&mut db, t, "name")));
    let dog = bindings.add(dog).unwrap();
    bindings.link_subclass(animal, dog);

    let puppy = PersistentClass::subclass(ClassKind::SingleTable, "com.acme.Puppy", t, dog);
    let puppy = bindings.add(puppy).unwrap();
    bindings.link_subclass(dog, puppy);

    (db, bindings, [animal, dog, puppy])
}

#[test]
fn duplicate_entity_is_rejected() {
    let mut bindings = EntityBindings::new();
    let t = TableId::from_index(0);
    bindings.add(PersistentClass::root("com.acme.Order", t)).unwrap();
    assert!(bindings.add(PersistentClass::root("com.acme.Order", t)).is_err());
    assert_eq!(bindings.len(), 1);
}

#[test]
fn hierarchy_navigation() {
    let (_, bindings, [animal, dog, puppy]) = hierarchy();
    assert_eq!(bindings.root_of(puppy), animal);
    assert_eq!(bindings.ancestors(puppy), vec![dog, animal]);
    assert_eq!(bindings.subclass_closure(animal), vec![animal, dog, puppy]);
    assert_eq!(bindings.subclass_closure(dog), vec![dog, puppy]);
    assert!(bindings.get(animal).unwrap().has_subclasses());
    assert!(bindings.is_property_defined_in_super_hierarchy(puppy, "name"));
    assert!(!bindings.is_property_defined_in_super_hierarchy(dog, "name"));
}

#[test]
fn identifier_is_found_from_any_subclass() {
    let (_, bindings, [_, _, puppy]) = hierarchy();
    assert_eq!(bindings.identifier_property(puppy).unwrap().name().as_str(), "id");
    assert_eq!(bindings.key_columns(puppy).len(), 1);
    assert!(bindings.property(puppy, "id").is_some());
    assert!(bindings.property(puppy, "name").is_some());
    assert!(bindings.property(puppy, "missing").is_none());
}

#[test]
fn embedded_identifier_members_resolve_directly() {
    let mut db = Database::new();
    let t = db.add_table(None, None, ident("Line"), None, false);
    let mut component = Component::new(t, "com.acme.Line.id");
    component.set_key(true);
    component.set_embedded(true);
    component.add_property(Property::new(Name::new("orderId"), simple(&mut db, t, "orderId")));
    component.add_property(Property::new(Name::new("lineNo"), simple(&mut db, t, "lineNo")));

    let mut line = PersistentClass::root("com.acme.Line", t);
    let root = line.root_data_mut().unwrap();
    root.identifier = Some(Value::Component(component));
    root.embedded_identifier = true;

    let mut bindings = EntityBindings::new();
    let line = bindings.add(line).unwrap();

    assert!(bindings.property(line, "id.lineNo").is_some());
    assert!(bindings.property(line, "lineNo").is_some());
    assert!(bindings.value(line, "orderId").is_some());
    assert_eq!(bindings.key_columns(line).len(), 2);
}

#[test]
fn snapshot_is_unaffected_by_later_bindings() {
    let (_, mut bindings, _) = hierarchy();
    let snapshot = bindings.snapshot();
    bindings
        .add(PersistentClass::root("com.acme.Order", TableId::from_index(0)))
        .unwrap();
    assert_eq!(snapshot.len(), 3);
    assert!(!snapshot.contains_key("com.acme.Order"));
    assert!(bindings.id_of("com.acme.Order").is_some());
}
