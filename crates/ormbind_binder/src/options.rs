//! Options that steer a metadata build.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ormbind_foundation::{Error, Result};

use crate::naming::{IdentityPhysicalNaming, PhysicalNamingStrategy, SnakeCasePhysicalNaming};

/// Setting key for [`BuildingOptions::shared_cache_mode`].
pub const SHARED_CACHE_MODE: &str = "jakarta.persistence.sharedCache.mode";
/// Setting key for [`BuildingOptions::implicit_cache_access_type`].
pub const DEFAULT_CACHE_CONCURRENCY_STRATEGY: &str =
    "hibernate.cache.default_cache_concurrency_strategy";
/// Setting key for [`BuildingOptions::no_constraint_by_default`].
pub const DEFAULT_CONSTRAINT_MODE: &str = "hibernate.hbm2ddl.default_constraint_mode";
/// Setting key for [`BuildingOptions::specj_proprietary_syntax`].
pub const SPECJ_PROPRIETARY_SYNTAX: &str = "hibernate.enable_specj_proprietary_syntax";
/// Setting key for [`BuildingOptions::force_discriminator_in_select`].
pub const FORCE_DISCRIMINATOR_IN_SELECT: &str = "hibernate.discriminator.force_in_select";
/// Setting key for [`BuildingOptions::implicit_discriminators_for_joined`].
pub const IMPLICIT_DISCRIMINATORS_FOR_JOINED: &str = "hibernate.discriminator.implicit_for_joined";
/// Setting key for [`BuildingOptions::ignore_explicit_discriminators_for_joined`].
pub const IGNORE_EXPLICIT_DISCRIMINATORS_FOR_JOINED: &str =
    "hibernate.discriminator.ignore_explicit_for_joined";
/// Setting key for [`BuildingOptions::physical_naming`].
pub const PHYSICAL_NAMING_STRATEGY: &str = "hibernate.physical_naming_strategy";

/// Which entities the second-level cache applies to when not stated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SharedCacheMode {
    /// Every entity is cached.
    All,
    /// No entity is cached.
    None,
    /// Only entities marked cacheable.
    EnableSelective,
    /// Every entity not marked non-cacheable.
    DisableSelective,
    /// Treated like [`SharedCacheMode::None`].
    #[default]
    Unspecified,
}

impl SharedCacheMode {
    /// Parses a setting value such as `ENABLE_SELECTIVE`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown mode.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "NONE" => Ok(Self::None),
            "ENABLE_SELECTIVE" => Ok(Self::EnableSelective),
            "DISABLE_SELECTIVE" => Ok(Self::DisableSelective),
            "UNSPECIFIED" => Ok(Self::Unspecified),
            _ => Err(Error::configuration(SHARED_CACHE_MODE, value)),
        }
    }

    /// Whether an entity is cached under this mode, given its `@Cacheable` value.
    #[must_use]
    pub fn is_cacheable(self, cacheable: Option<bool>) -> bool {
        match self {
            Self::All => true,
            Self::EnableSelective => cacheable == Some(true),
            Self::DisableSelective => cacheable.unwrap_or(true),
            Self::None | Self::Unspecified => false,
        }
    }
}

/// Cache concurrency access type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheAccessType {
    /// Entries never change.
    ReadOnly,
    /// Entries change rarely and may be stale briefly.
    NonstrictReadWrite,
    /// Entries are locked while updated.
    ReadWrite,
    /// Entries take part in transactions.
    Transactional,
}

impl CacheAccessType {
    /// Parses an external name such as `read-write`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown access type.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "read-only" => Ok(Self::ReadOnly),
            "nonstrict-read-write" => Ok(Self::NonstrictReadWrite),
            "read-write" => Ok(Self::ReadWrite),
            "transactional" => Ok(Self::Transactional),
            _ => Err(Error::configuration(DEFAULT_CACHE_CONCURRENCY_STRATEGY, value)),
        }
    }

    /// The external name stored on a root class.
    #[must_use]
    pub fn external_name(self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::NonstrictReadWrite => "nonstrict-read-write",
            Self::ReadWrite => "read-write",
            Self::Transactional => "transactional",
        }
    }
}

impl fmt::Display for CacheAccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.external_name())
    }
}

/// Options for a metadata build.
///
/// Controls caching defaults, constraint creation, discriminator handling,
/// and physical naming.
#[derive(Clone)]
pub struct BuildingOptions {
    /// Caching default for entities without an explicit cache annotation.
    pub shared_cache_mode: SharedCacheMode,

    /// Access type used for roots without an explicit cache annotation.
    pub implicit_cache_access_type: Option<CacheAccessType>,

    /// Treat `PROVIDER_DEFAULT` constraint modes as "no constraint".
    pub no_constraint_by_default: bool,

    /// Make legacy key-many-to-one join columns read-only.
    pub specj_proprietary_syntax: bool,

    /// Force the discriminator into selects unless an entity says otherwise.
    pub force_discriminator_in_select: bool,

    /// Create a discriminator for joined roots that declare none.
    pub implicit_discriminators_for_joined: bool,

    /// Ignore explicit discriminator columns on joined roots.
    pub ignore_explicit_discriminators_for_joined: bool,

    /// Maps logical names to physical ones.
    pub physical_naming: Arc<dyn PhysicalNamingStrategy + Send + Sync>,
}

impl Default for BuildingOptions {
    fn default() -> Self {
        Self {
            shared_cache_mode: SharedCacheMode::Unspecified,
            implicit_cache_access_type: None,
            no_constraint_by_default: false,
            specj_proprietary_syntax: false,
            force_discriminator_in_select: false,
            implicit_discriminators_for_joined: false,
            ignore_explicit_discriminators_for_joined: false,
            physical_naming: Arc::new(IdentityPhysicalNaming),
        }
    }
}

impl fmt::Debug for BuildingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildingOptions")
            .field("shared_cache_mode", &self.shared_cache_mode)
            .field("implicit_cache_access_type", &self.implicit_cache_access_type)
            .field("no_constraint_by_default", &self.no_constraint_by_default)
            .field("specj_proprietary_syntax", &self.specj_proprietary_syntax)
            .field(
                "force_discriminator_in_select",
                &self.force_discriminator_in_select,
            )
            .field(
                "implicit_discriminators_for_joined",
                &self.implicit_discriminators_for_joined,
            )
            .field(
                "ignore_explicit_discriminators_for_joined",
                &self.ignore_explicit_discriminators_for_joined,
            )
            .field("physical_naming", &self.physical_naming.name())
            .finish()
    }
}

impl BuildingOptions {
    /// Creates options with cacheable entities opted in and read-write caching.
    #[must_use]
    pub fn selective_caching() -> Self {
        Self {
            shared_cache_mode: SharedCacheMode::EnableSelective,
            implicit_cache_access_type: Some(CacheAccessType::ReadWrite),
            ..Self::default()
        }
    }

    /// Creates options that give every joined hierarchy a discriminator.
    #[must_use]
    pub fn joined_discriminators() -> Self {
        Self {
            implicit_discriminators_for_joined: true,
            ..Self::default()
        }
    }

    /// Reads options from setting keys; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a value that cannot be interpreted.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self> {
        let mut options = Self::default();
        if let Some(value) = settings.get(SHARED_CACHE_MODE) {
            options.shared_cache_mode = SharedCacheMode::parse(value)?;
        }
        if let Some(value) = settings.get(DEFAULT_CACHE_CONCURRENCY_STRATEGY) {
            options.implicit_cache_access_type = Some(CacheAccessType::parse(value)?);
        }
        if let Some(value) = settings.get(DEFAULT_CONSTRAINT_MODE) {
            options.no_constraint_by_default = match value.trim().to_ascii_uppercase().as_str() {
                "NO_CONSTRAINT" => true,
                "CONSTRAINT" | "PROVIDER_DEFAULT" => false,
                _ => return Err(Error::configuration(DEFAULT_CONSTRAINT_MODE, value.as_str())),
            };
        }
        options.specj_proprietary_syntax =
            parse_flag(settings, SPECJ_PROPRIETARY_SYNTAX, options.specj_proprietary_syntax)?;
        options.force_discriminator_in_select = parse_flag(
            settings,
            FORCE_DISCRIMINATOR_IN_SELECT,
            options.force_discriminator_in_select,
        )?;
        options.implicit_discriminators_for_joined = parse_flag(
            settings,
            IMPLICIT_DISCRIMINATORS_FOR_JOINED,
            options.implicit_discriminators_for_joined,
        )?;
        options.ignore_explicit_discriminators_for_joined = parse_flag(
            settings,
            IGNORE_EXPLICIT_DISCRIMINATORS_FOR_JOINED,
            options.ignore_explicit_discriminators_for_joined,
        )?;
        if let Some(value) = settings.get(PHYSICAL_NAMING_STRATEGY) {
            options.physical_naming = match value.trim().to_ascii_lowercase().as_str() {
                "identity" => Arc::new(IdentityPhysicalNaming),
                "snake_case" | "snake-case" => Arc::new(SnakeCasePhysicalNaming),
                _ => return Err(Error::configuration(PHYSICAL_NAMING_STRATEGY, value.as_str())),
            };
        }
        Ok(options)
    }

    /// Builder method to set the shared cache mode.
    #[must_use]
    pub fn with_shared_cache_mode(mut self, mode: SharedCacheMode) -> Self {
        self.shared_cache_mode = mode;
        self
    }

    /// Builder method to set the implicit cache access type.
    #[must_use]
    pub fn with_implicit_cache_access_type(mut self, access: Option<CacheAccessType>) -> Self {
        self.implicit_cache_access_type = access;
        self
    }

    /// Builder method to treat provider-default constraints as absent.
    #[must_use]
    pub fn with_no_constraint_by_default(mut self, enabled: bool) -> Self {
        self.no_constraint_by_default = enabled;
        self
    }

    /// Builder method to enable the legacy key-many-to-one syntax.
    #[must_use]
    pub fn with_specj_proprietary_syntax(mut self, enabled: bool) -> Self {
        self.specj_proprietary_syntax = enabled;
        self
    }

    /// Builder method to force discriminators into selects.
    #[must_use]
    pub fn with_force_discriminator_in_select(mut self, enabled: bool) -> Self {
        self.force_discriminator_in_select = enabled;
        self
    }

    /// Builder method to create implicit discriminators for joined roots.
    #[must_use]
    pub fn with_implicit_discriminators_for_joined(mut self, enabled: bool) -> Self {
        self.implicit_discriminators_for_joined = enabled;
        self
    }

    /// Builder method to ignore explicit discriminators on joined roots.
    #[must_use]
    pub fn with_ignore_explicit_discriminators_for_joined(mut self, enabled: bool) -> Self {
        self.ignore_explicit_discriminators_for_joined = enabled;
        self
    }

    /// Builder method to set the physical naming strategy.
    #[must_use]
    pub fn with_physical_naming(
        mut self,
        strategy: impl PhysicalNamingStrategy + Send + Sync + 'static,
    ) -> Self {
        self.physical_naming = Arc::new(strategy);
        self
    }
}

fn parse_flag(settings: &HashMap<String, String>, key: &str, default: bool) -> Result<bool> {
    match settings.get(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Error::configuration(key, value.as_str())),
        },
    }
}
