//! Canonical field-name identity.
//!
//! A [`CommonName`] is the comparison key for a field name: lower-cased with
//! whitespace and punctuation removed, so "First Name", "first-name", and
//! "FirstName" all resolve to the same identity. The canonical form is used
//! only for equality and lookup, never for display.

/// Canonicalized form of a field name. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommonName(String);

impl CommonName {
    pub fn new(name: &str) -> Self {
        let canonical = name
            .chars()
            .filter(|ch| ch.is_alphanumeric())
            .flat_map(|ch| ch.to_lowercase())
            .collect();
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
