//! The data dictionary: field definitions, aliases, and semantic types.
//!
//! A [`Dictionary`] is the authoritative registry of [`FieldDefinition`]s
//! shared by every record definition built against it. Names resolve through
//! [`CommonName`] canonicalization plus a single alias hop, so "addr" and
//! "Address" can reach one definition without duplicating it. Dictionaries
//! are shared by handle ([`SharedDictionary`]): adding a definition or alias
//! is immediately visible to every sharer, which is how aliases and type
//! overrides defined once apply everywhere.
//!
//! Dictionaries persist as ordinary tabular data through the
//! [`RecordSource`]/[`RecordSink`] interface: one row per definition, one row
//! per alias (distinguished by a non-empty "Alias For" column).

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::Serialize;

use crate::{
    name::CommonName,
    rules::FormatRule,
    source::{RecordSink, RecordSource},
};

/// Column layout of a persisted dictionary file.
pub const DICTIONARY_COLUMNS: &[&str] = &[
    "Proper Name",
    "Common Name",
    "Alias For",
    "Data Format Rule",
    "Combine by Appending?",
    "Function Name",
    "Parm1",
    "Parm2",
    "Parm3",
    "Parm4",
    "Parm5",
];

/// Semantic role of a field, inferred from its canonical name unless
/// overridden. Drives ordering behavior and empty-value construction; it
/// never drives presentation, which lives outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticType {
    Default,
    Text,
    Title,
    LongText,
    Tags,
    Link,
    Label,
    Author,
    Date,
    Rating,
    Status,
    SequenceNumber,
    Index,
    Recurrence,
    Code,
    DateAdded,
}

impl SemanticType {
    /// Infers a semantic type from a canonical field name. First matching
    /// token wins; more specific tokens are checked before their prefixes.
    pub fn infer(common: &CommonName) -> Self {
        let name = common.as_str();
        if name.contains("dateadded") || name.contains("addedon") {
            Self::DateAdded
        } else if name.contains("date") {
            Self::Date
        } else if name.contains("title") {
            Self::Title
        } else if name.contains("note") || name.contains("description") || name.contains("comment")
        {
            Self::LongText
        } else if name.contains("tag") || name.contains("keyword") || name.contains("category") {
            Self::Tags
        } else if name.contains("url") || name.contains("link") || name.contains("website") {
            Self::Link
        } else if name.contains("label") {
            Self::Label
        } else if name.contains("author") || name.contains("artist") || name.contains("composer") {
            Self::Author
        } else if name.contains("rating") || name.contains("score") {
            Self::Rating
        } else if name.contains("status") {
            Self::Status
        } else if name.contains("sequence") || name.contains("seqnum") {
            Self::SequenceNumber
        } else if name == "index" || name.ends_with("index") {
            Self::Index
        } else if name.contains("recurrence") || name.contains("recurs") {
            Self::Recurrence
        } else if name.ends_with("code") || name.ends_with("zip") || name.contains("postal") {
            Self::Code
        } else if name.contains("name") {
            Self::Text
        } else {
            Self::Default
        }
    }

    /// Zero value for a field of this type, used when back-filling records
    /// up to their definition's column count. Every type's empty form is the
    /// empty string today; routing construction through this table keeps the
    /// decision in one place.
    pub fn empty_value(&self) -> String {
        String::new()
    }

    pub fn ordering_class(&self) -> crate::data::OrderingClass {
        use crate::data::OrderingClass;
        match self {
            Self::Date | Self::DateAdded => OrderingClass::Chronological,
            Self::Rating | Self::SequenceNumber | Self::Index => OrderingClass::Numeric,
            _ => OrderingClass::Textual,
        }
    }

    /// Whether unequal values of this type may be reconciled by appending
    /// unless the definition says otherwise.
    fn appending_natural(&self) -> bool {
        matches!(self, Self::LongText | Self::Tags)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Text => "text",
            Self::Title => "title",
            Self::LongText => "long-text",
            Self::Tags => "tags",
            Self::Link => "link",
            Self::Label => "label",
            Self::Author => "author",
            Self::Date => "date",
            Self::Rating => "rating",
            Self::Status => "status",
            Self::SequenceNumber => "sequence-number",
            Self::Index => "index",
            Self::Recurrence => "recurrence",
            Self::Code => "code",
            Self::DateAdded => "date-added",
        }
    }
}

/// Calculated-field descriptor: a function name plus five string parameters.
/// The only function understood today is "lookup"; see the `calc` module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcSpec {
    pub function: String,
    pub params: [String; 5],
}

/// One logical field: display name as first seen, canonical identity,
/// semantic type, optional formatting rule, and merge behavior.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    proper_name: String,
    common_name: CommonName,
    semantic: SemanticType,
    rule: Option<FormatRule>,
    combine_by_appending: bool,
    calculated: Option<CalcSpec>,
}

impl FieldDefinition {
    pub fn new(proper_name: &str) -> Self {
        let common_name = CommonName::new(proper_name);
        let semantic = SemanticType::infer(&common_name);
        Self {
            proper_name: proper_name.to_string(),
            common_name,
            semantic,
            rule: None,
            combine_by_appending: semantic.appending_natural(),
            calculated: None,
        }
    }

    pub fn proper_name(&self) -> &str {
        &self.proper_name
    }

    pub fn common_name(&self) -> &CommonName {
        &self.common_name
    }

    pub fn semantic(&self) -> SemanticType {
        self.semantic
    }

    pub fn set_semantic(&mut self, semantic: SemanticType) {
        self.semantic = semantic;
    }

    pub fn rule(&self) -> Option<FormatRule> {
        self.rule
    }

    pub fn set_rule(&mut self, rule: Option<FormatRule>) {
        self.rule = rule;
    }

    pub fn combine_by_appending(&self) -> bool {
        self.combine_by_appending
    }

    pub fn set_combine_by_appending(&mut self, allowed: bool) {
        self.combine_by_appending = allowed;
    }

    pub fn calculated(&self) -> Option<&CalcSpec> {
        self.calculated.as_ref()
    }

    pub fn set_calculated(&mut self, spec: Option<CalcSpec>) {
        self.calculated = spec;
    }

    /// Rebinds this definition to a resolved canonical name. Used by
    /// [`Dictionary::put_def`] when the incoming name is an alias whose
    /// target has no definition yet: the stored entry belongs to the alias
    /// target, so callers must not assume the stored proper name matches
    /// their input.
    fn rebind(&mut self, resolved: CommonName) {
        self.proper_name = resolved.as_str().to_string();
        self.common_name = resolved;
    }
}

/// A canonical-name-to-canonical-name mapping. Lookups of `alias` resolve
/// transparently to `original`'s definition; aliases do not chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAlias {
    pub alias: CommonName,
    pub original: CommonName,
}

impl FieldAlias {
    pub fn new(alias: &str, original: &str) -> Self {
        Self {
            alias: CommonName::new(alias),
            original: CommonName::new(original),
        }
    }
}

/// Registry of field definitions and aliases. Definitions are append-only;
/// no two share a common name, aliasing being the only mechanism for
/// multiple names to reach one definition.
#[derive(Debug, Default)]
pub struct Dictionary {
    defs: Vec<FieldDefinition>,
    aliases: Vec<FieldAlias>,
}

/// Shared ownership handle for a dictionary. The core is single-threaded;
/// every record definition takes this handle explicitly at construction.
pub type SharedDictionary = Rc<RefCell<Dictionary>>;

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedDictionary {
        Rc::new(RefCell::new(self))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn defs(&self) -> &[FieldDefinition] {
        &self.defs
    }

    pub fn aliases(&self) -> &[FieldAlias] {
        &self.aliases
    }

    /// Follows exactly one alias hop: if `name` matches a known alias the
    /// original is returned, otherwise `name` comes back unchanged.
    pub fn resolve(&self, name: &CommonName) -> CommonName {
        self.aliases
            .iter()
            .find(|entry| &entry.alias == name)
            .map(|entry| entry.original.clone())
            .unwrap_or_else(|| name.clone())
    }

    /// Index of the definition for `name`, alias-resolved. `None` means the
    /// field is unknown, which callers treat as routine, not exceptional.
    pub fn def_index(&self, name: &CommonName) -> Option<usize> {
        let resolved = self.resolve(name);
        self.defs
            .iter()
            .position(|def| def.common_name == resolved)
    }

    pub fn def(&self, index: usize) -> Option<&FieldDefinition> {
        self.defs.get(index)
    }

    pub fn def_mut(&mut self, index: usize) -> Option<&mut FieldDefinition> {
        self.defs.get_mut(index)
    }

    /// Registers a definition, resolving its name through the alias table
    /// first. Idempotent: an already-known (possibly aliased) name returns
    /// the existing index without duplicating. A definition arriving under
    /// an unregistered alias target is stored bound to the resolved name.
    pub fn put_def(&mut self, mut def: FieldDefinition) -> usize {
        let resolved = self.resolve(&def.common_name);
        if let Some(existing) = self
            .defs
            .iter()
            .position(|entry| entry.common_name == resolved)
        {
            return existing;
        }
        if resolved != def.common_name {
            def.rebind(resolved);
        }
        self.defs.push(def);
        self.defs.len() - 1
    }

    pub fn add_alias(&mut self, alias: FieldAlias) {
        if alias.alias == alias.original {
            debug!("Ignoring self-referential alias '{}'", alias.alias.as_str());
            return;
        }
        self.aliases.push(alias);
    }

    /// Rebuilds a dictionary from an opened record source laid out per
    /// [`DICTIONARY_COLUMNS`]. A row with a non-empty "Alias For" is an
    /// alias; every other row is a definition.
    pub fn read_from(source: &mut dyn RecordSource) -> Result<Self> {
        let layout = source
            .rec_def()
            .ok_or_else(|| anyhow!("Dictionary source must be opened before reading"))?
            .clone();
        let column_of = |name: &str| layout.column_number(name);
        let proper_col = column_of("Proper Name");
        let common_col = column_of("Common Name");
        let alias_col = column_of("Alias For");
        let rule_col = column_of("Data Format Rule");
        let combine_col = column_of("Combine by Appending?");
        let function_col = column_of("Function Name");
        let parm_cols: Vec<Option<usize>> = (1..=5)
            .map(|n| column_of(&format!("Parm{n}")))
            .collect();

        let mut dictionary = Dictionary::new();
        while let Some(record) = source.next_record()? {
            let cell = |col: Option<usize>| {
                col.and_then(|idx| record.field(idx))
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            };
            let proper = {
                let value = cell(proper_col);
                if value.is_empty() { cell(common_col) } else { value }
            };
            if proper.is_empty() {
                continue;
            }
            let alias_for = cell(alias_col);
            if !alias_for.is_empty() {
                dictionary.add_alias(FieldAlias::new(&proper, &alias_for));
                continue;
            }
            let mut def = FieldDefinition::new(&proper);
            let rule_name = cell(rule_col);
            if !rule_name.is_empty() {
                let rule = FormatRule::from_name(&rule_name).ok_or_else(|| {
                    anyhow!("Unknown data format rule '{rule_name}' for field '{proper}'")
                })?;
                def.set_rule(Some(rule));
            }
            let combine = cell(combine_col);
            if !combine.is_empty() {
                def.set_combine_by_appending(parse_flag(&combine));
            }
            let function = cell(function_col);
            if !function.is_empty() {
                let mut params: [String; 5] = Default::default();
                for (slot, col) in params.iter_mut().zip(parm_cols.iter()) {
                    *slot = cell(*col);
                }
                def.set_calculated(Some(CalcSpec { function, params }));
            }
            dictionary.put_def(def);
        }
        debug!(
            "Dictionary loaded with {} definition(s) and {} alias(es)",
            dictionary.len(),
            dictionary.aliases.len()
        );
        Ok(dictionary)
    }

    /// Writes the dictionary through a sink using [`DICTIONARY_COLUMNS`]:
    /// definition rows first, alias rows after.
    pub fn write_to(&self, sink: &mut dyn RecordSink) -> Result<()> {
        use crate::{definition::RecordDefinition, record::Record};

        let layout_dict = Dictionary::new().into_shared();
        let mut layout = RecordDefinition::new(layout_dict);
        for column in DICTIONARY_COLUMNS {
            layout.add_column(column);
        }
        sink.open_for_output(&layout)
            .context("Opening dictionary sink")?;

        for def in &self.defs {
            let mut fields = vec![String::new(); DICTIONARY_COLUMNS.len()];
            fields[0] = def.proper_name.clone();
            fields[1] = def.common_name.as_str().to_string();
            if let Some(rule) = def.rule {
                fields[3] = rule.name().to_string();
            }
            fields[4] = if def.combine_by_appending {
                "yes".to_string()
            } else {
                "no".to_string()
            };
            if let Some(calc) = &def.calculated {
                fields[5] = calc.function.clone();
                for (slot, param) in fields[6..11].iter_mut().zip(calc.params.iter()) {
                    *slot = param.clone();
                }
            }
            sink.next_record_out(&Record::with_fields(fields))
                .with_context(|| format!("Writing definition '{}'", def.proper_name))?;
        }

        for alias in &self.aliases {
            let mut fields = vec![String::new(); DICTIONARY_COLUMNS.len()];
            fields[0] = alias.alias.as_str().to_string();
            fields[1] = alias.alias.as_str().to_string();
            fields[2] = alias.original.as_str().to_string();
            sink.next_record_out(&Record::with_fields(fields))
                .with_context(|| format!("Writing alias '{}'", alias.alias.as_str()))?;
        }

        sink.close().context("Closing dictionary sink")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "t" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_def_is_idempotent_across_equal_canonical_names() {
        let mut dictionary = Dictionary::new();
        let first = dictionary.put_def(FieldDefinition::new("First Name"));
        let second = dictionary.put_def(FieldDefinition::new("first-name"));
        assert_eq!(first, second);
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary.def(first).unwrap().proper_name(), "First Name");
    }

    #[test]
    fn alias_lookup_reaches_the_original_definition() {
        let mut dictionary = Dictionary::new();
        dictionary.add_alias(FieldAlias::new("addr", "address"));
        let idx = dictionary.put_def(FieldDefinition::new("Address"));
        assert_eq!(dictionary.def_index(&CommonName::new("addr")), Some(idx));
        assert_eq!(dictionary.def_index(&CommonName::new("Address")), Some(idx));
        assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn put_def_through_unregistered_alias_binds_to_resolved_name() {
        let mut dictionary = Dictionary::new();
        dictionary.add_alias(FieldAlias::new("addr", "address"));
        let idx = dictionary.put_def(FieldDefinition::new("Addr"));
        let stored = dictionary.def(idx).unwrap();
        assert_eq!(stored.common_name(), &CommonName::new("address"));
        assert_eq!(stored.proper_name(), "address");
    }

    #[test]
    fn unknown_name_lookup_is_none_not_an_error() {
        let dictionary = Dictionary::new();
        assert_eq!(dictionary.def_index(&CommonName::new("missing")), None);
    }

    #[test]
    fn aliases_do_not_chain() {
        let mut dictionary = Dictionary::new();
        dictionary.add_alias(FieldAlias::new("a", "b"));
        dictionary.add_alias(FieldAlias::new("b", "c"));
        assert_eq!(dictionary.resolve(&CommonName::new("a")), CommonName::new("b"));
    }

    #[test]
    fn semantic_types_infer_from_canonical_names() {
        assert_eq!(
            SemanticType::infer(&CommonName::new("Date Added")),
            SemanticType::DateAdded
        );
        assert_eq!(
            SemanticType::infer(&CommonName::new("Release Date")),
            SemanticType::Date
        );
        assert_eq!(SemanticType::infer(&CommonName::new("Tags")), SemanticType::Tags);
        assert_eq!(
            SemanticType::infer(&CommonName::new("Status")),
            SemanticType::Status
        );
        assert_eq!(
            SemanticType::infer(&CommonName::new("Notes")),
            SemanticType::LongText
        );
        assert_eq!(
            SemanticType::infer(&CommonName::new("Quantity")),
            SemanticType::Default
        );
    }

    #[test]
    fn long_text_fields_default_to_combine_by_appending() {
        assert!(FieldDefinition::new("Notes").combine_by_appending());
        assert!(FieldDefinition::new("Tags").combine_by_appending());
        assert!(!FieldDefinition::new("Phone").combine_by_appending());
    }
}
