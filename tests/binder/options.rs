//! Integration tests for BuildingOptions

use std::collections::HashMap;

use ormbind_binder::descriptor::{
    CacheAnnotation, CacheConcurrencyStrategy, InheritanceType, JoinColumnAnnotation,
};
use ormbind_binder::options::{
    DEFAULT_CACHE_CONCURRENCY_STRATEGY, DEFAULT_CONSTRAINT_MODE, IMPLICIT_DISCRIMINATORS_FOR_JOINED,
    PHYSICAL_NAMING_STRATEGY, SHARED_CACHE_MODE,
};
use ormbind_binder::{
    BuildingOptions, CacheAccessType, EntityDescriptor, MetadataSources, PropertyDescriptor,
    SharedCacheMode, build_metadata,
};
use ormbind_foundation::ErrorKind;

fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn entity(name: &str) -> EntityDescriptor {
    EntityDescriptor::new(name).with_property(PropertyDescriptor::id("id", "long"))
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn settings_are_read_by_key() {
    let options = BuildingOptions::from_settings(&settings(&[
        (SHARED_CACHE_MODE, "disable_selective"),
        (DEFAULT_CACHE_CONCURRENCY_STRATEGY, "nonstrict-read-write"),
        (DEFAULT_CONSTRAINT_MODE, "NO_CONSTRAINT"),
        (PHYSICAL_NAMING_STRATEGY, "snake_case"),
    ]))
    .unwrap();
    assert_eq!(options.shared_cache_mode, SharedCacheMode::DisableSelective);
    assert_eq!(options.implicit_cache_access_type, Some(CacheAccessType::NonstrictReadWrite));
    assert!(options.no_constraint_by_default);
    assert_eq!(options.physical_naming.name(), "snake_case");
}

#[test]
fn unknown_setting_values_are_configuration_errors() {
    for (key, value) in [
        (SHARED_CACHE_MODE, "sometimes"),
        (DEFAULT_CACHE_CONCURRENCY_STRATEGY, "write-only"),
        (DEFAULT_CONSTRAINT_MODE, "maybe"),
        (IMPLICIT_DISCRIMINATORS_FOR_JOINED, "yes please"),
        (PHYSICAL_NAMING_STRATEGY, "camel"),
    ] {
        let err = BuildingOptions::from_settings(&settings(&[(key, value)])).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Configuration { .. }), "{key}");
        assert!(err.to_string().contains(value));
    }
}

// =============================================================================
// Options Applied to Builds
// =============================================================================

#[test]
fn selective_caching_caches_only_cacheable_roots() {
    let sources = MetadataSources::new()
        .with_entity(entity("com.acme.Order").with_cacheable(true))
        .with_entity(entity("com.acme.Customer"));
    let metadata = build_metadata(&sources, BuildingOptions::selective_caching()).unwrap();

    let order = metadata.entity("com.acme.Order").unwrap();
    assert!(order.cached);
    let root = order.root_data().unwrap();
    assert_eq!(root.cache_concurrency_strategy.as_deref(), Some("read-write"));
    assert_eq!(root.cache_region_name.as_deref(), Some("com.acme.Order"));

    assert!(!metadata.entity("com.acme.Customer").unwrap().cached);
}

#[test]
fn explicit_cache_wins_over_shared_cache_mode() {
    let sources = MetadataSources::new().with_entity(
        entity("com.acme.Order")
            .with_cache(CacheAnnotation::with_usage(CacheConcurrencyStrategy::ReadOnly)),
    );
    let options = BuildingOptions::default().with_shared_cache_mode(SharedCacheMode::None);
    let metadata = build_metadata(&sources, options).unwrap();
    let order = metadata.entity("com.acme.Order").unwrap();
    assert!(order.cached);
    assert_eq!(
        order.root_data().unwrap().cache_concurrency_strategy.as_deref(),
        Some("read-only")
    );
}

#[test]
fn no_constraint_by_default_suppresses_explicit_join_column_keys() {
    let sources = MetadataSources::new()
        .with_entity(entity("com.acme.Customer"))
        .with_entity(entity("com.acme.Order").with_property(
            PropertyDescriptor::many_to_one("customer", "com.acme.Customer").with_join_column(JoinColumnAnnotation::named("customer_ref")),
        ));

    let constrained = build_metadata(&sources, BuildingOptions::default()).unwrap();
    assert_eq!(constrained.entity_table("com.acme.Order").unwrap().foreign_keys().len(), 1);

    let options = BuildingOptions::default().with_no_constraint_by_default(true);
    let unconstrained = build_metadata(&sources, options).unwrap();
    let table = unconstrained.entity_table("com.acme.Order").unwrap();
    assert!(table.foreign_keys().is_empty());
    assert!(table.column_by_name("customer_ref").is_some());
}

#[test]
fn joined_discriminators_can_be_implicit() {
    let sources = MetadataSources::new()
        .with_entity(entity("com.acme.Animal").with_inheritance(InheritanceType::Joined))
        .with_entity(EntityDescriptor::new("com.acme.Dog").extends("com.acme.Animal"));

    let plain = build_metadata(&sources, BuildingOptions::default()).unwrap();
    let root = plain.entity("com.acme.Animal").unwrap().root_data().unwrap();
    assert!(root.discriminator.is_none());

    let metadata = build_metadata(&sources, BuildingOptions::joined_discriminators()).unwrap();
    let root = metadata.entity("com.acme.Animal").unwrap().root_data().unwrap();
    assert!(root.discriminator.is_some());
    let table = metadata.entity_table("com.acme.Animal").unwrap();
    assert!(table.column_by_name("DTYPE").is_some());
}
