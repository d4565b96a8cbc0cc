//! Declared attributes.

use ormbind_model::{FetchMode, NotFoundAction};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::annotations::{
    AccessType, AttributeOverrideAnnotation, BasicAnnotation, ColumnAnnotation, FetchType,
    ForeignKeyAnnotation, HibernateCascadeType, JoinColumnAnnotation, LazyToOneOption,
    ManyToOneAnnotation, NaturalIdAnnotation, OnDeleteAction, OneToManyAnnotation,
    OneToOneAnnotation, PrimaryKeyJoinColumnAnnotation,
};

/// One persistent attribute of an entity, mapped superclass or embeddable.
///
/// Which kind of property this is follows from the annotations present:
/// a to-one or one-to-many annotation makes it an association, `embedded`
/// or `embedded_id` a component, anything else a basic value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PropertyDescriptor {
    /// Attribute name.
    pub name: String,
    /// Declared type: a basic type name, an embeddable class, or the
    /// associated entity class.
    pub type_name: Option<String>,
    /// Access style override.
    pub access: Option<AccessType>,

    /// `@Id`.
    pub id: bool,
    /// `@EmbeddedId`.
    pub embedded_id: bool,
    /// `@Embedded`, or an attribute whose type is an embeddable.
    pub embedded: bool,
    /// `@Version`.
    pub version: bool,
    /// `@NaturalId`.
    pub natural_id: Option<NaturalIdAnnotation>,
    /// `@Lob`.
    pub lob: bool,
    /// `@LazyGroup`.
    pub lazy_group: Option<String>,
    /// `@OptimisticLock(excluded = true)`.
    pub optimistic_lock_excluded: bool,
    /// `@Basic`.
    pub basic: Option<BasicAnnotation>,

    /// `@Column`.
    pub column: Option<ColumnAnnotation>,
    /// `@Columns`.
    pub columns: Vec<ColumnAnnotation>,
    /// `@Formula`.
    pub formula: Option<String>,
    /// `@AttributeOverride`s applied to an embedded value.
    pub attribute_overrides: Vec<AttributeOverrideAnnotation>,

    /// `@ManyToOne`.
    pub many_to_one: Option<ManyToOneAnnotation>,
    /// `@OneToOne`.
    pub one_to_one: Option<OneToOneAnnotation>,
    /// `@OneToMany`.
    pub one_to_many: Option<OneToManyAnnotation>,
    /// `@JoinColumn`.
    pub join_column: Option<JoinColumnAnnotation>,
    /// `@JoinColumns`.
    pub join_columns: Vec<JoinColumnAnnotation>,
    /// `@JoinColumns(foreignKey = ...)`.
    pub join_columns_foreign_key: Option<ForeignKeyAnnotation>,
    /// `@PrimaryKeyJoinColumn`s of a one-to-one.
    pub pk_join_columns: Vec<PrimaryKeyJoinColumnAnnotation>,
    /// Property-level `@ForeignKey` override.
    pub foreign_key: Option<ForeignKeyAnnotation>,
    /// Legacy `@org.hibernate.annotations.ForeignKey(name = ...)`.
    pub legacy_foreign_key_name: Option<String>,
    /// `@MapsId`; an empty string maps the whole identifier.
    pub maps_id: Option<String>,
    /// `@NotFound`.
    pub not_found: Option<NotFoundAction>,
    /// `@LazyToOne`.
    pub lazy_to_one: Option<LazyToOneOption>,
    /// `@Fetch`.
    pub fetch: Option<FetchMode>,
    /// `@OnDelete`.
    pub on_delete: Option<OnDeleteAction>,
    /// `@Cascade`.
    pub cascade: Vec<HibernateCascadeType>,
}

impl PropertyDescriptor {
    /// A basic attribute of the given type.
    #[must_use]
    pub fn basic(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// A basic `@Id` attribute.
    #[must_use]
    pub fn id(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: true,
            ..Self::basic(name, type_name)
        }
    }

    /// A `@ManyToOne` to `target`.
    #[must_use]
    pub fn many_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(target.into()),
            many_to_one: Some(ManyToOneAnnotation::default()),
            ..Self::default()
        }
    }

    /// A `@OneToOne` to `target`.
    #[must_use]
    pub fn one_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(target.into()),
            one_to_one: Some(OneToOneAnnotation::default()),
            ..Self::default()
        }
    }

    /// A `@OneToMany` of `element` entities.
    #[must_use]
    pub fn one_to_many(name: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(element.into()),
            one_to_many: Some(OneToManyAnnotation::default()),
            ..Self::default()
        }
    }

    /// An `@Embedded` value of the given embeddable class.
    #[must_use]
    pub fn embedded(name: impl Into<String>, embeddable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(embeddable.into()),
            embedded: true,
            ..Self::default()
        }
    }

    /// An `@EmbeddedId` of the given embeddable class.
    #[must_use]
    pub fn embedded_id(name: impl Into<String>, embeddable: impl Into<String>) -> Self {
        Self {
            embedded_id: true,
            ..Self::embedded(name, embeddable)
        }
    }

    /// Marks the attribute `@Id`.
    #[must_use]
    pub fn as_id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Marks the attribute `@Version`.
    #[must_use]
    pub fn as_version(mut self) -> Self {
        self.version = true;
        self
    }

    /// Marks the attribute part of the natural id.
    #[must_use]
    pub fn as_natural_id(mut self, mutable: bool) -> Self {
        self.natural_id = Some(NaturalIdAnnotation { mutable });
        self
    }

    /// Sets `@Column`.
    #[must_use]
    pub fn with_column(mut self, column: ColumnAnnotation) -> Self {
        self.column = Some(column);
        self
    }

    /// Sets `@Formula`.
    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Sets `@JoinColumn`.
    #[must_use]
    pub fn with_join_column(mut self, join_column: JoinColumnAnnotation) -> Self {
        self.join_column = Some(join_column);
        self
    }

    /// Sets `@JoinColumns`.
    #[must_use]
    pub fn with_join_columns(mut self, join_columns: Vec<JoinColumnAnnotation>) -> Self {
        self.join_columns = join_columns;
        self
    }

    /// Sets `@PrimaryKeyJoinColumn`s.
    #[must_use]
    pub fn with_pk_join_columns(mut self, columns: Vec<PrimaryKeyJoinColumnAnnotation>) -> Self {
        self.pk_join_columns = columns;
        self
    }

    /// Makes a to-one association mandatory.
    #[must_use]
    pub fn mandatory(mut self) -> Self {
        if let Some(m2o) = &mut self.many_to_one {
            m2o.optional = false;
        }
        if let Some(o2o) = &mut self.one_to_one {
            o2o.optional = false;
        }
        self
    }

    /// Sets the fetch type of the association.
    #[must_use]
    pub fn with_fetch_type(mut self, fetch: FetchType) -> Self {
        if let Some(m2o) = &mut self.many_to_one {
            m2o.fetch = fetch;
        }
        if let Some(o2o) = &mut self.one_to_one {
            o2o.fetch = fetch;
        }
        if let Some(o2m) = &mut self.one_to_many {
            o2m.fetch = fetch;
        }
        self
    }

    /// Sets `mappedBy` on a one-to-one or one-to-many.
    #[must_use]
    pub fn mapped_by(mut self, property: impl Into<String>) -> Self {
        let property = property.into();
        if let Some(o2o) = &mut self.one_to_one {
            o2o.mapped_by = Some(property.clone());
        }
        if let Some(o2m) = &mut self.one_to_many {
            o2m.mapped_by = Some(property);
        }
        self
    }

    /// Sets `@NotFound`.
    #[must_use]
    pub fn with_not_found(mut self, action: NotFoundAction) -> Self {
        self.not_found = Some(action);
        self
    }

    /// Sets `@Fetch`.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchMode) -> Self {
        self.fetch = Some(fetch);
        self
    }

    /// Sets `@LazyToOne`.
    #[must_use]
    pub fn with_lazy_to_one(mut self, option: LazyToOneOption) -> Self {
        self.lazy_to_one = Some(option);
        self
    }

    /// Sets `@MapsId`.
    #[must_use]
    pub fn with_maps_id(mut self, value: impl Into<String>) -> Self {
        self.maps_id = Some(value.into());
        self
    }

    /// Sets the property-level `@ForeignKey`.
    #[must_use]
    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyAnnotation) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }

    /// Sets `@Cascade`.
    #[must_use]
    pub fn with_cascade(mut self, cascade: Vec<HibernateCascadeType>) -> Self {
        self.cascade = cascade;
        self
    }

    /// Whether this is a `@ManyToOne` or `@OneToOne`.
    #[must_use]
    pub fn is_to_one(&self) -> bool {
        self.many_to_one.is_some() || self.one_to_one.is_some()
    }

    /// Whether this carries `@Id` or `@EmbeddedId`.
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.id || self.embedded_id
    }

    /// Whether this maps to an embeddable.
    #[must_use]
    pub fn is_component(&self) -> bool {
        self.embedded || self.embedded_id
    }

    /// Whether any `@Column` or `@Columns` is present.
    #[must_use]
    pub fn has_explicit_columns(&self) -> bool {
        self.column.is_some() || !self.columns.is_empty()
    }

    /// Every join column annotation, single or grouped.
    #[must_use]
    pub fn join_column_annotations(&self) -> Vec<&JoinColumnAnnotation> {
        if self.join_columns.is_empty() {
            self.join_column.iter().collect()
        } else {
            self.join_columns.iter().collect()
        }
    }

    /// The associated entity class of a to-one or one-to-many.
    #[must_use]
    pub fn target_entity(&self) -> Option<&str> {
        let explicit = self
            .many_to_one
            .as_ref()
            .and_then(|a| a.target_entity.as_deref())
            .or_else(|| self.one_to_one.as_ref().and_then(|a| a.target_entity.as_deref()))
            .or_else(|| self.one_to_many.as_ref().and_then(|a| a.target_entity.as_deref()));
        explicit
            .filter(|t| !t.trim().is_empty())
            .or(self.type_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_set_association_flags() {
        let p = PropertyDescriptor::many_to_one("customer", "com.acme.Customer")
            .mandatory()
            .with_fetch_type(FetchType::Lazy);
        assert!(p.is_to_one());
        let m2o = p.many_to_one.as_ref().unwrap();
        assert!(!m2o.optional);
        assert_eq!(m2o.fetch, FetchType::Lazy);
        assert_eq!(p.target_entity(), Some("com.acme.Customer"));
    }

    #[test]
    fn grouped_join_columns_win() {
        let p = PropertyDescriptor::many_to_one("a", "A")
            .with_join_column(JoinColumnAnnotation::named("x"))
            .with_join_columns(vec![
                JoinColumnAnnotation::named("y"),
                JoinColumnAnnotation::named("z"),
            ]);
        let names: Vec<_> = p
            .join_column_annotations()
            .iter()
            .filter_map(|j| j.name.as_deref())
            .collect();
        assert_eq!(names, ["y", "z"]);
    }

    #[test]
    fn blank_target_falls_back_to_type() {
        let mut p = PropertyDescriptor::one_to_one("b", "com.acme.B");
        p.one_to_one.as_mut().unwrap().target_entity = Some(" ".into());
        assert_eq!(p.target_entity(), Some("com.acme.B"));
    }
}
