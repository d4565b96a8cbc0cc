//! Database identifiers.
//!
//! An [`Identifier`] remembers whether it was explicitly quoted. Rendering the
//! quote characters is left to an [`IdentifierRenderer`] supplied by the caller,
//! so the binding core never picks quote characters itself.

use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Capability that decides how quoted identifiers are rendered.
pub trait IdentifierRenderer {
    /// Opening quote character.
    fn open_quote(&self) -> char;
    /// Closing quote character.
    fn close_quote(&self) -> char;
}

/// Renderer that uses backticks, the neutral quoting form of mapping sources.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainRenderer;

impl IdentifierRenderer for PlainRenderer {
    fn open_quote(&self) -> char {
        '`'
    }

    fn close_quote(&self) -> char {
        '`'
    }
}

/// A possibly-quoted name of a catalog, schema, table, or column.
///
/// Equality and hashing use the canonical name: quoted identifiers compare
/// exactly, unquoted ones case-insensitively.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Identifier {
    text: String,
    quoted: bool,
}

impl Identifier {
    /// Creates an identifier from raw text and an explicit quoted flag.
    #[must_use]
    pub fn new(text: impl Into<String>, quoted: bool) -> Self {
        Self {
            text: text.into(),
            quoted,
        }
    }

    /// Parses a name as written in mapping metadata.
    ///
    /// Blank input yields `None`. A name wrapped in backticks or double quotes
    /// becomes a quoted identifier without the wrapping characters.
    #[must_use]
    pub fn to_identifier(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if is_quoted(trimmed) {
            let inner = &trimmed[1..trimmed.len() - 1];
            return Some(Self::new(inner, true));
        }
        Some(Self::new(trimmed, false))
    }

    /// Same as [`Identifier::to_identifier`], but forces quoting.
    #[must_use]
    pub fn quoted(text: &str) -> Option<Self> {
        Self::to_identifier(text).map(|id| Self::new(id.text, true))
    }

    /// The identifier text without quotes.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the identifier must be quoted when rendered.
    #[must_use]
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// Canonical form used as a map key.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        if self.quoted {
            self.text.clone()
        } else {
            self.text.to_lowercase()
        }
    }

    /// Renders the identifier, quoting it through `renderer` if needed.
    #[must_use]
    pub fn render(&self, renderer: &dyn IdentifierRenderer) -> String {
        if self.quoted {
            format!(
                "{}{}{}",
                renderer.open_quote(),
                self.text,
                renderer.close_quote()
            )
        } else {
            self.text.clone()
        }
    }
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2
        && ((text.starts_with('`') && text.ends_with('`'))
            || (text.starts_with('"') && text.ends_with('"')))
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_name() == other.canonical_name()
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_name().hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&PlainRenderer))
    }
}

/// A table name qualified by optional catalog and schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualifiedTableName {
    /// Catalog, if any.
    pub catalog: Option<Identifier>,
    /// Schema, if any.
    pub schema: Option<Identifier>,
    /// Table name.
    pub table: Identifier,
}

impl QualifiedTableName {
    /// Creates a qualified name.
    #[must_use]
    pub fn new(catalog: Option<Identifier>, schema: Option<Identifier>, table: Identifier) -> Self {
        Self {
            catalog,
            schema,
            table,
        }
    }

    /// Renders `catalog.schema.table`, skipping absent parts.
    #[must_use]
    pub fn render(&self, renderer: &dyn IdentifierRenderer) -> String {
        let mut out = String::new();
        for part in [&self.catalog, &self.schema].into_iter().flatten() {
            out.push_str(&part.render(renderer));
            out.push('.');
        }
        out.push_str(&self.table.render(renderer));
        out
    }
}

impl fmt::Display for QualifiedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&PlainRenderer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Brackets;

    impl IdentifierRenderer for Brackets {
        fn open_quote(&self) -> char {
            '['
        }
        fn close_quote(&self) -> char {
            ']'
        }
    }

    #[test]
    fn blank_is_absent() {
        assert!(Identifier::to_identifier("").is_none());
        assert!(Identifier::to_identifier("   ").is_none());
    }

    #[test]
    fn quoted_forms_are_detected() {
        let id = Identifier::to_identifier("`Order`").unwrap();
        assert!(id.is_quoted());
        assert_eq!(id.text(), "Order");
        let id = Identifier::to_identifier("\"Order\"").unwrap();
        assert!(id.is_quoted());
        assert_eq!(id.canonical_name(), "Order");
    }

    #[test]
    fn unquoted_compare_case_insensitively() {
        let a = Identifier::to_identifier("CUSTOMER_ID").unwrap();
        let b = Identifier::to_identifier("customer_id").unwrap();
        assert_eq!(a, b);
        let quoted = Identifier::to_identifier("`CUSTOMER_ID`").unwrap();
        assert_ne!(quoted, b);
    }

    #[test]
    fn renderer_supplies_quotes() {
        let id = Identifier::to_identifier("`user`").unwrap();
        assert_eq!(id.render(&Brackets), "[user]");
        assert_eq!(id.to_string(), "`user`");
        let plain = Identifier::to_identifier("users").unwrap();
        assert_eq!(plain.render(&Brackets), "users");
    }

    #[test]
    fn qualified_name_skips_missing_parts() {
        let name = QualifiedTableName::new(
            None,
            Identifier::to_identifier("sales"),
            Identifier::to_identifier("orders").unwrap(),
        );
        assert_eq!(name.to_string(), "sales.orders");
    }
}
