//! Logical and physical naming.
//!
//! The free functions derive *logical* names the way the classic naming
//! strategy does: explicit names win, blanks count as absent, and defaults
//! come from unqualified class and property names. A [`PhysicalNamingStrategy`]
//! then maps each logical identifier to the one that ends up in the model.

use convert_case::{Case, Casing};
use ormbind_foundation::names::{non_blank, unqualify};
use ormbind_foundation::Identifier;

/// Column name used for a discriminator nobody named.
pub const IMPLICIT_DISCRIMINATOR_COLUMN: &str = "DTYPE";

// =============================================================================
// Logical names
// =============================================================================

/// Returns the explicit name when it is not blank, otherwise the derived default.
pub fn resolve_logical_name(explicit: Option<&str>, default: impl FnOnce() -> String) -> String {
    match non_blank(explicit) {
        Some(name) => name.trim().to_string(),
        None => default(),
    }
}

/// Default table name of an entity class.
#[must_use]
pub fn class_to_table_name(class_name: &str) -> String {
    unqualify(class_name).to_string()
}

/// Default column name of a basic property.
#[must_use]
pub fn property_to_column_name(property_name: &str) -> String {
    unqualify(property_name).to_string()
}

/// Logical column name: the explicit column, else the unqualified property.
#[must_use]
pub fn logical_column_name(column_name: Option<&str>, property_name: &str) -> String {
    resolve_logical_name(column_name, || unqualify(property_name).to_string())
}

/// Legacy foreign key column name: the unqualified property, else the table.
#[must_use]
pub fn foreign_key_column_name(
    property_name: Option<&str>,
    _entity_name: &str,
    table_name: &str,
    _referenced_column: &str,
) -> String {
    match property_name {
        Some(property) => unqualify(property).to_string(),
        None => table_name.to_string(),
    }
}

/// Logical name of a collection table: `owner_associated` or `owner_property`.
#[must_use]
pub fn logical_collection_table_name(
    owner_table: &str,
    associated_table: Option<&str>,
    property_name: &str,
) -> String {
    let tail = non_blank(associated_table).unwrap_or_else(|| unqualify(property_name));
    format!("{owner_table}_{tail}")
}

/// Logical name of a collection key column.
#[must_use]
pub fn logical_collection_column_name(
    column_name: Option<&str>,
    property_name: &str,
    referenced_column: &str,
) -> String {
    resolve_logical_name(column_name, || {
        format!("{}_{referenced_column}", unqualify(property_name))
    })
}

/// Column name of a join key.
#[must_use]
pub fn join_key_column_name(joined_column: &str, _joined_table: &str) -> String {
    joined_column.to_string()
}

/// Implicit join column of an association: `property_referencedColumn`.
#[must_use]
pub fn implicit_join_column_name(property_path: &str, referenced_column: &str) -> String {
    format!("{}_{referenced_column}", unqualify(property_path))
}

/// Implicit primary key join column: the referenced column itself.
#[must_use]
pub fn implicit_primary_key_join_column_name(referenced_column: &str) -> String {
    referenced_column.to_string()
}

// =============================================================================
// Physical names
// =============================================================================

/// Maps logical identifiers to physical ones.
///
/// Implementations must leave quoted identifiers untouched.
pub trait PhysicalNamingStrategy {
    /// Short name used in diagnostics and settings.
    fn name(&self) -> &str;

    /// Physical name of a table.
    fn to_physical_table_name(&self, logical: &Identifier) -> Identifier;

    /// Physical name of a column.
    fn to_physical_column_name(&self, logical: &Identifier) -> Identifier;

    /// Physical name of a schema.
    fn to_physical_schema_name(&self, logical: &Identifier) -> Identifier {
        logical.clone()
    }

    /// Physical name of a catalog.
    fn to_physical_catalog_name(&self, logical: &Identifier) -> Identifier {
        logical.clone()
    }
}

/// Keeps logical names as they are.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityPhysicalNaming;

impl PhysicalNamingStrategy for IdentityPhysicalNaming {
    fn name(&self) -> &str {
        "identity"
    }

    fn to_physical_table_name(&self, logical: &Identifier) -> Identifier {
        logical.clone()
    }

    fn to_physical_column_name(&self, logical: &Identifier) -> Identifier {
        logical.clone()
    }
}

/// Turns `CamelCase` names into `snake_case`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnakeCasePhysicalNaming;

impl SnakeCasePhysicalNaming {
    fn apply(logical: &Identifier) -> Identifier {
        if logical.is_quoted() {
            return logical.clone();
        }
        Identifier::new(logical.text().to_case(Case::Snake), false)
    }
}

impl PhysicalNamingStrategy for SnakeCasePhysicalNaming {
    fn name(&self) -> &str {
        "snake_case"
    }

    fn to_physical_table_name(&self, logical: &Identifier) -> Identifier {
        Self::apply(logical)
    }

    fn to_physical_column_name(&self, logical: &Identifier) -> Identifier {
        Self::apply(logical)
    }

    fn to_physical_schema_name(&self, logical: &Identifier) -> Identifier {
        Self::apply(logical)
    }

    fn to_physical_catalog_name(&self, logical: &Identifier) -> Identifier {
        Self::apply(logical)
    }
}

/// Parses a logical table name and maps it through `strategy`.
///
/// Returns `None` for a blank name.
#[must_use]
pub fn physical_table_name(
    strategy: &dyn PhysicalNamingStrategy,
    logical: &str,
) -> Option<Identifier> {
    Identifier::to_identifier(logical).map(|id| strategy.to_physical_table_name(&id))
}

/// Parses a logical column name and maps it through `strategy`.
///
/// Returns `None` for a blank name.
#[must_use]
pub fn physical_column_name(
    strategy: &dyn PhysicalNamingStrategy,
    logical: &str,
) -> Option<Identifier> {
    Identifier::to_identifier(logical).map(|id| strategy.to_physical_column_name(&id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_defaults() {
        assert_eq!(class_to_table_name("com.acme.OrderLine"), "OrderLine");
        assert_eq!(property_to_column_name("address.street"), "street");
        assert_eq!(logical_column_name(Some("  "), "a.b"), "b");
        assert_eq!(logical_column_name(Some("col"), "a.b"), "col");
        assert_eq!(
            foreign_key_column_name(Some("order.customer"), "Customer", "orders", "id"),
            "customer"
        );
        assert_eq!(foreign_key_column_name(None, "Customer", "orders", "id"), "orders");
        assert_eq!(
            logical_collection_table_name("orders", None, "order.lines"),
            "orders_lines"
        );
        assert_eq!(
            logical_collection_table_name("orders", Some("line"), "lines"),
            "orders_line"
        );
        assert_eq!(logical_collection_column_name(None, "lines", "id"), "lines_id");
        assert_eq!(join_key_column_name("id", "orders"), "id");
        assert_eq!(implicit_join_column_name("customer", "id"), "customer_id");
        assert_eq!(implicit_primary_key_join_column_name("id"), "id");
    }

    #[test]
    fn snake_case_leaves_quoted_names_alone() {
        let strategy = SnakeCasePhysicalNaming;
        let plain = physical_table_name(&strategy, "OrderLine").unwrap();
        assert_eq!(plain.text(), "order_line");
        let quoted = physical_table_name(&strategy, "`OrderLine`").unwrap();
        assert_eq!(quoted.text(), "OrderLine");
        assert!(quoted.is_quoted());
    }

    #[test]
    fn blank_names_have_no_physical_form() {
        assert!(physical_column_name(&IdentityPhysicalNaming, " ").is_none());
    }
}
