//! Sort-key specifications over a record definition.
//!
//! A [`SequenceSpec`] is an ordered list of (column, direction) pairs. It
//! defines both the total order used for sorting a record set and the key
//! equality used when deciding whether two adjacent records are candidates
//! for combining.

use std::cmp::Ordering;

use anyhow::{Result, anyhow};

use crate::{data::compare_values, definition::RecordDefinition, record::Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceField {
    pub column: usize,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceSpec {
    fields: Vec<SequenceField>,
}

impl SequenceSpec {
    pub fn new(fields: Vec<SequenceField>) -> Self {
        Self { fields }
    }

    /// Builds a spec from textual directives of the form `column[:asc|desc]`
    /// resolved against `definition`. Direction defaults to ascending.
    pub fn from_directives(directives: &[String], definition: &RecordDefinition) -> Result<Self> {
        let mut fields = Vec::new();
        for directive in directives
            .iter()
            .flat_map(|d| d.split(','))
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            let (name, ascending) = match directive.rsplit_once(':') {
                Some((name, "asc")) => (name, true),
                Some((name, "desc")) => (name, false),
                Some((_, direction)) => {
                    return Err(anyhow!(
                        "Invalid sort direction '{direction}' in '{directive}' (expected asc or desc)"
                    ));
                }
                None => (directive, true),
            };
            let column = definition
                .column_number(name.trim())
                .ok_or_else(|| anyhow!("Sort column '{name}' not found"))?;
            fields.push(SequenceField { column, ascending });
        }
        if fields.is_empty() {
            return Err(anyhow!("Sequence requires at least one column directive"));
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[SequenceField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compares two records field by field in spec order, honoring each
    /// field's direction and the column's ordering class. The first
    /// non-equal field decides.
    pub fn compare(&self, a: &Record, b: &Record, definition: &RecordDefinition) -> Ordering {
        for field in &self.fields {
            let left = a.field(field.column).unwrap_or_default();
            let right = b.field(field.column).unwrap_or_default();
            let ordering =
                compare_values(left, right, definition.ordering_class(field.column));
            let ordering = if field.ascending {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Key equality for combine: every spec field compares equal, direction
    /// being irrelevant to equality.
    pub fn keys_equal(&self, a: &Record, b: &Record, definition: &RecordDefinition) -> bool {
        self.fields.iter().all(|field| {
            let left = a.field(field.column).unwrap_or_default();
            let right = b.field(field.column).unwrap_or_default();
            compare_values(left, right, definition.ordering_class(field.column))
                == Ordering::Equal
        })
    }
}
