//! Second-level cache settings of an entity hierarchy.

use ormbind_foundation::names::non_blank;
use ormbind_foundation::{Error, Result};

use crate::descriptor::{CacheAnnotation, EntityDescriptor};
use crate::diagnostics::{Anomaly, Diagnostics};
use crate::options::BuildingOptions;

/// Appended to the entity cache region to name the natural-id cache region.
pub const NATURAL_ID_CACHE_SUFFIX: &str = "##NaturalId";

/// Cache settings of a hierarchy root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheSettings {
    /// Whether instances are cached.
    pub cached: bool,
    /// External name of the access strategy.
    pub strategy: Option<String>,
    /// Cache region.
    pub region: String,
    /// Whether lazy properties are cached with the entity.
    pub lazy_properties_cacheable: bool,
}

/// Cache settings of a root entity.
///
/// An explicit `@Cache` always caches. Otherwise the shared cache mode
/// decides, and the strategy is the configured implicit access type.
///
/// # Errors
///
/// Returns an annotation error for an `include` other than `all` or
/// `non-lazy`.
pub fn root_cache_settings(
    entity: &EntityDescriptor,
    options: &BuildingOptions,
) -> Result<CacheSettings> {
    match &entity.cache {
        Some(cache) => Ok(CacheSettings {
            cached: true,
            strategy: cache
                .usage
                .to_access_type()
                .map(|a| a.external_name().to_string()),
            region: non_blank(cache.region.as_deref())
                .unwrap_or(&entity.class_name)
                .to_string(),
            lazy_properties_cacheable: is_cache_lazy(cache, &entity.class_name)?,
        }),
        None => Ok(CacheSettings {
            cached: options.shared_cache_mode.is_cacheable(entity.cacheable),
            strategy: options
                .implicit_cache_access_type
                .map(|a| a.external_name().to_string()),
            region: entity.class_name.clone(),
            lazy_properties_cacheable: true,
        }),
    }
}

fn is_cache_lazy(cache: &CacheAnnotation, class_name: &str) -> Result<bool> {
    if !cache.include_lazy {
        return Ok(false);
    }
    match cache.include.trim().to_lowercase().as_str() {
        "all" => Ok(true),
        "non-lazy" => Ok(false),
        other => Err(Error::annotation(format!(
            "Class '{class_name}' has a '@Cache' with undefined option 'include=\"{other}\"'"
        ))),
    }
}

/// Whether a subclass is cached.
///
/// Subclasses inherit their parent's setting unless they say `@Cacheable`
/// themselves. A subclass carrying its own `@Cache` is not cached.
pub fn subclass_cached(
    entity: &EntityDescriptor,
    options: &BuildingOptions,
    super_cached: bool,
    diagnostics: &mut Diagnostics,
) -> bool {
    if entity.cache.is_some() {
        diagnostics.record(Anomaly::CacheAnnotationOnSubclass {
            entity: entity.class_name.clone(),
        });
        return false;
    }
    match entity.cacheable {
        None => super_cached,
        Some(_) => options.shared_cache_mode.is_cacheable(entity.cacheable),
    }
}

/// Region of the natural-id cache, when `@NaturalIdCache` is present.
#[must_use]
pub fn natural_id_cache_region(entity: &EntityDescriptor) -> Option<String> {
    let annotation = entity.natural_id_cache.as_ref()?;
    if let Some(region) = non_blank(annotation.region.as_deref()) {
        return Some(region.to_string());
    }
    let base = entity
        .cache
        .as_ref()
        .and_then(|c| non_blank(c.region.as_deref()))
        .unwrap_or(&entity.class_name);
    Some(format!("{base}{NATURAL_ID_CACHE_SUFFIX}"))
}
