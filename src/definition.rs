//! Record definitions: ordered columns layered over a shared dictionary.
//!
//! A [`RecordDefinition`] is the schema of one record collection. Column
//! order is stable once assigned; the column index is the positional
//! contract every [`crate::record::Record`] relies on. Each [`Column`]
//! carries length statistics gathered as data streams in, plus a transient
//! merged-from pointer used only while reconciling two schemas.

use anyhow::{Result, anyhow};
use log::debug;

use crate::{
    data::OrderingClass,
    dictionary::{FieldDefinition, SemanticType, SharedDictionary},
    name::CommonName,
};

/// Length statistics reported before anything has been observed.
pub const DEFAULT_AVG_LENGTH: usize = 10;
pub const DEFAULT_MAX_LENGTH: usize = 20;

/// One column of a record definition: a dictionary entry plus streaming
/// statistics. `merged_from` is write-only scratch state for merge passes,
/// never persisted identity.
#[derive(Debug, Clone)]
pub struct Column {
    def_index: usize,
    merged_from: Option<usize>,
    max_length: usize,
    total_length: usize,
    observed: usize,
}

impl Column {
    fn new(def_index: usize) -> Self {
        Self {
            def_index,
            merged_from: None,
            max_length: 0,
            total_length: 0,
            observed: 0,
        }
    }

    pub fn def_index(&self) -> usize {
        self.def_index
    }

    pub fn merged_from(&self) -> Option<usize> {
        self.merged_from
    }

    pub fn max_length(&self) -> usize {
        if self.observed == 0 {
            DEFAULT_MAX_LENGTH
        } else {
            self.max_length
        }
    }

    pub fn average_length(&self) -> usize {
        if self.observed == 0 {
            DEFAULT_AVG_LENGTH
        } else {
            self.total_length / self.observed
        }
    }

    pub fn observed(&self) -> usize {
        self.observed
    }

    fn observe(&mut self, value: &str) {
        let length = value.chars().count();
        self.max_length = self.max_length.max(length);
        self.total_length += length;
        self.observed += 1;
    }
}

/// Ordered columns over a shared dictionary: the schema of one record
/// collection. Cloning shares the dictionary handle, not the statistics.
#[derive(Debug, Clone)]
pub struct RecordDefinition {
    columns: Vec<Column>,
    dictionary: SharedDictionary,
}

impl RecordDefinition {
    pub fn new(dictionary: SharedDictionary) -> Self {
        Self {
            columns: Vec::new(),
            dictionary,
        }
    }

    pub fn dictionary(&self) -> &SharedDictionary {
        &self.dictionary
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Appends a column for `name` unconditionally, mirroring an external
    /// schema faithfully even when the name repeats. Registration goes
    /// through the dictionary, so repeated names share one definition.
    pub fn add_column(&mut self, name: &str) -> usize {
        let def_index = self
            .dictionary
            .borrow_mut()
            .put_def(FieldDefinition::new(name));
        self.columns.push(Column::new(def_index));
        self.columns.len() - 1
    }

    /// Appends a column for an existing definition unconditionally.
    pub fn add_column_def(&mut self, def: FieldDefinition) -> usize {
        let def_index = self.dictionary.borrow_mut().put_def(def);
        self.columns.push(Column::new(def_index));
        self.columns.len() - 1
    }

    /// Dedup-aware counterpart to [`add_column`](Self::add_column): if a
    /// column already maps (directly or via alias) to the same dictionary
    /// entry, its index is returned instead of appending. This is the path
    /// used when discovering schema incrementally from record data.
    pub fn put_column(&mut self, def: FieldDefinition) -> usize {
        let def_index = self.dictionary.borrow_mut().put_def(def);
        if let Some(existing) = self
            .columns
            .iter()
            .position(|column| column.def_index == def_index)
        {
            return existing;
        }
        self.columns.push(Column::new(def_index));
        self.columns.len() - 1
    }

    /// Alias-resolved column lookup. `None` means this definition has no
    /// such field, which callers treat as routine.
    pub fn column_number(&self, name: &str) -> Option<usize> {
        let def_index = self.dictionary.borrow().def_index(&CommonName::new(name))?;
        self.columns
            .iter()
            .position(|column| column.def_index == def_index)
    }

    /// Proper (display) name of a column's field.
    pub fn column_name(&self, index: usize) -> Option<String> {
        let column = self.columns.get(index)?;
        self.dictionary
            .borrow()
            .def(column.def_index)
            .map(|def| def.proper_name().to_string())
    }

    pub fn headers(&self) -> Vec<String> {
        (0..self.columns.len())
            .map(|idx| self.column_name(idx).unwrap_or_default())
            .collect()
    }

    /// Snapshot of a column's field definition. Definitions live in the
    /// dictionary; mutate them through the dictionary handle.
    pub fn field_def(&self, index: usize) -> Option<FieldDefinition> {
        let column = self.columns.get(index)?;
        self.dictionary.borrow().def(column.def_index).cloned()
    }

    pub fn semantic(&self, index: usize) -> SemanticType {
        self.columns
            .get(index)
            .and_then(|column| {
                self.dictionary
                    .borrow()
                    .def(column.def_index)
                    .map(|def| def.semantic())
            })
            .unwrap_or(SemanticType::Default)
    }

    pub fn ordering_class(&self, index: usize) -> OrderingClass {
        self.semantic(index).ordering_class()
    }

    pub fn combine_by_appending(&self, index: usize) -> bool {
        self.columns
            .get(index)
            .and_then(|column| {
                self.dictionary
                    .borrow()
                    .def(column.def_index)
                    .map(|def| def.combine_by_appending())
            })
            .unwrap_or(false)
    }

    /// Removes a column by index. Rare; shifts the positional contract of
    /// every later column, so owners must re-project their records.
    pub fn remove_column(&mut self, index: usize) -> Result<()> {
        if index >= self.columns.len() {
            return Err(anyhow!(
                "Column index {index} out of range ({} column(s))",
                self.columns.len()
            ));
        }
        self.columns.remove(index);
        Ok(())
    }

    /// Reconciles `other` into this definition: every column of `other`
    /// gains a counterpart here (created through [`put_column`]
    /// (Self::put_column) when missing), and the counterpart's
    /// `merged_from` records the position in `other` it maps to. Columns of
    /// this definition with no match keep `merged_from == None`, signaling
    /// record projection to fill them empty. One-directional: the index
    /// answers "where does my column come from in the incoming schema".
    pub fn merge(&mut self, other: &RecordDefinition) {
        for column in &mut self.columns {
            column.merged_from = None;
        }
        let before = self.columns.len();
        for (position, incoming) in other.columns.iter().enumerate() {
            let Some(def) = other.dictionary.borrow().def(incoming.def_index).cloned() else {
                continue;
            };
            let index = self.put_column(def);
            self.columns[index].merged_from = Some(position);
        }
        if self.columns.len() > before {
            debug!(
                "Merge added {} column(s) to the unified definition",
                self.columns.len() - before
            );
        }
    }

    /// Folds one observed value into a column's length statistics.
    /// Out-of-range indices are a no-op; statistics are advisory.
    pub fn observe_value(&mut self, value: &str, index: usize) {
        if let Some(column) = self.columns.get_mut(index) {
            column.observe(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{Dictionary, FieldAlias};

    fn fresh() -> RecordDefinition {
        RecordDefinition::new(Dictionary::new().into_shared())
    }

    #[test]
    fn add_column_always_appends_put_column_dedupes() {
        let mut def = fresh();
        let first = def.add_column("Name");
        let second = def.add_column("Name");
        assert_ne!(first, second);
        assert_eq!(def.column_count(), 2);

        let third = def.put_column(FieldDefinition::new("name"));
        assert_eq!(third, first);
        assert_eq!(def.column_count(), 2);
    }

    #[test]
    fn add_column_def_appends_and_remove_column_shifts() {
        let mut def = fresh();
        def.add_column("Name");
        let idx = def.add_column_def(FieldDefinition::new("Phone"));
        assert_eq!(idx, 1);

        def.remove_column(0).unwrap();
        assert_eq!(def.column_number("Phone"), Some(0));
        assert_eq!(def.column_number("Name"), None);
        assert!(def.remove_column(5).is_err());
    }

    #[test]
    fn column_number_resolves_aliases() {
        let mut def = fresh();
        def.dictionary()
            .borrow_mut()
            .add_alias(FieldAlias::new("addr", "address"));
        let idx = def.add_column("Address");
        assert_eq!(def.column_number("addr"), Some(idx));
        assert_eq!(def.column_number("address"), Some(idx));
    }

    #[test]
    fn statistics_default_until_observed() {
        let mut def = fresh();
        let idx = def.add_column("Notes");
        assert_eq!(def.column(idx).unwrap().average_length(), DEFAULT_AVG_LENGTH);
        assert_eq!(def.column(idx).unwrap().max_length(), DEFAULT_MAX_LENGTH);

        def.observe_value("abcd", idx);
        def.observe_value("ab", idx);
        assert_eq!(def.column(idx).unwrap().average_length(), 3);
        assert_eq!(def.column(idx).unwrap().max_length(), 4);

        // Out of range must not panic.
        def.observe_value("ignored", 99);
    }

    #[test]
    fn merge_matches_columns_and_marks_unmatched_none() {
        let dictionary = Dictionary::new().into_shared();
        let mut left = RecordDefinition::new(dictionary.clone());
        left.add_column("Name");
        left.add_column("Phone");

        let mut right = RecordDefinition::new(dictionary);
        right.add_column("Name");
        right.add_column("Email");

        left.merge(&right);
        assert_eq!(left.column_count(), 3);
        assert_eq!(left.column(0).unwrap().merged_from(), Some(0));
        assert_eq!(left.column(1).unwrap().merged_from(), None);
        assert_eq!(left.column(2).unwrap().merged_from(), Some(1));

        // Every column of the incoming schema resolves in the merged one.
        assert!(left.column_number("Email").is_some());
    }

    #[test]
    fn merge_resets_scratch_state_between_passes() {
        let dictionary = Dictionary::new().into_shared();
        let mut left = RecordDefinition::new(dictionary.clone());
        left.add_column("Name");

        let mut first = RecordDefinition::new(dictionary.clone());
        first.add_column("Name");
        left.merge(&first);
        assert_eq!(left.column(0).unwrap().merged_from(), Some(0));

        let mut second = RecordDefinition::new(dictionary);
        second.add_column("Email");
        left.merge(&second);
        assert_eq!(left.column(0).unwrap().merged_from(), None);
    }
}
