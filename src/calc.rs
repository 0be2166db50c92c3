//! Calculated (lookup) fields.
//!
//! A field definition may declare a "lookup" function whose value is joined
//! in from an external lookup table instead of stored directly. Parameters:
//! base path, table file name, key field in the table, the field in the
//! current record whose value is the search key, and the table field whose
//! value is returned. The table is loaded fully into memory on first use;
//! any failure opening or reading it degrades the field to not-calculated
//! (a logged diagnostic, never an error to the caller) and the record's own
//! raw value passes through unchanged.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};

use crate::{
    definition::RecordDefinition,
    dictionary::{CalcSpec, Dictionary},
    record::Record,
    source::{DelimitedSource, RecordSource},
};

pub const LOOKUP_FUNCTION: &str = "lookup";

/// Evaluates calculated fields against lookup tables, caching one loaded
/// table per dictionary entry. A `None` cache entry marks a table that
/// failed to load; the field has already been degraded and is skipped.
pub struct Calculator {
    base: Option<PathBuf>,
    tables: HashMap<usize, Option<HashMap<String, String>>>,
}

impl Calculator {
    /// `base` is the data parent of the record stream being processed,
    /// used to resolve relative lookup-table references.
    pub fn new(base: Option<PathBuf>) -> Self {
        Self {
            base,
            tables: HashMap::new(),
        }
    }

    /// Recalculates every calculated column of `record` in place. Lookup
    /// misses and degraded tables leave the raw value untouched.
    pub fn recalculate(&mut self, record: &mut Record, definition: &RecordDefinition) {
        for index in 0..definition.column_count() {
            let Some(def) = definition.field_def(index) else {
                continue;
            };
            let Some(spec) = def.calculated().cloned() else {
                continue;
            };
            if !spec.function.eq_ignore_ascii_case(LOOKUP_FUNCTION) {
                warn!(
                    "Unknown calculated-field function '{}' on '{}'; leaving value as-is",
                    spec.function,
                    def.proper_name()
                );
                continue;
            }
            let def_index = definition
                .column(index)
                .map(|column| column.def_index())
                .unwrap_or_default();
            let Some(table) = self.table_for(def_index, &spec, definition.dictionary()) else {
                continue;
            };
            let search_field = spec.params[3].as_str();
            let key = match record.field_by_name(definition, search_field) {
                Some(value) => value.to_lowercase(),
                None => {
                    debug!(
                        "Search field '{}' missing for calculated column '{}'",
                        search_field,
                        def.proper_name()
                    );
                    continue;
                }
            };
            if let Some(found) = table.get(&key) {
                record.set_field(index, found.clone());
            }
        }
    }

    /// Returns the loaded table for a dictionary entry, loading it on first
    /// use. Failure degrades the entry to not-calculated and caches the
    /// degradation so the load is not retried.
    fn table_for(
        &mut self,
        def_index: usize,
        spec: &CalcSpec,
        dictionary: &crate::dictionary::SharedDictionary,
    ) -> Option<&HashMap<String, String>> {
        if !self.tables.contains_key(&def_index) {
            let loaded = match load_table(self.base.as_deref(), spec) {
                Ok(table) => Some(table),
                Err(err) => {
                    warn!("Lookup table unavailable, field degrades to not-calculated: {err:#}");
                    if let Some(def) = dictionary.borrow_mut().def_mut(def_index) {
                        def.set_calculated(None);
                    }
                    None
                }
            };
            self.tables.insert(def_index, loaded);
        }
        self.tables.get(&def_index).and_then(|entry| entry.as_ref())
    }
}

/// Loads a whole lookup table into a key-to-result map. Keys are lowercased
/// so lookups match case-insensitively; first occurrence of a key wins.
fn load_table(base: Option<&Path>, spec: &CalcSpec) -> Result<HashMap<String, String>> {
    let base_param = spec.params[0].trim();
    let file_param = spec.params[1].trim();
    let key_field = spec.params[2].trim();
    let result_field = spec.params[4].trim();
    if file_param.is_empty() || key_field.is_empty() || result_field.is_empty() {
        return Err(anyhow!("Lookup declaration is missing table, key, or result field"));
    }

    let mut path = if base_param.is_empty() {
        base.map(Path::to_path_buf).unwrap_or_default()
    } else {
        PathBuf::from(base_param)
    };
    path.push(file_param);

    let mut source = DelimitedSource::new(&path);
    source
        .open_for_input(Dictionary::new().into_shared())
        .with_context(|| format!("Opening lookup table {path:?}"))?;
    let layout = source
        .rec_def()
        .cloned()
        .context("Lookup table has no definition")?;
    let key_col = layout
        .column_number(key_field)
        .ok_or_else(|| anyhow!("Lookup table {path:?} has no key field '{key_field}'"))?;
    let result_col = layout
        .column_number(result_field)
        .ok_or_else(|| anyhow!("Lookup table {path:?} has no result field '{result_field}'"))?;

    let mut table = HashMap::new();
    while let Some(record) = source.next_record()? {
        let key = record.field(key_col).unwrap_or_default().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let value = record.field(result_col).unwrap_or_default().to_string();
        table.entry(key).or_insert(value);
    }
    source.close()?;
    debug!("Loaded lookup table {path:?} with {} key(s)", table.len());
    Ok(table)
}
