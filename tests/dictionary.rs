use std::fs;

use record_managed::{
    definition::RecordDefinition,
    dictionary::{Dictionary, FieldAlias, FieldDefinition, SemanticType},
    name::CommonName,
    rules::FormatRule,
    source::{DelimitedSink, DelimitedSource, RecordSource},
};
use tempfile::tempdir;

#[test]
fn alias_resolves_to_the_same_column() {
    let mut dictionary = Dictionary::new();
    dictionary.add_alias(FieldAlias::new("addr", "address"));
    let shared = dictionary.into_shared();

    let mut definition = RecordDefinition::new(shared);
    definition.add_column("Address");

    let direct = definition.column_number("address");
    let via_alias = definition.column_number("addr");
    assert!(direct.is_some());
    assert_eq!(direct, via_alias);
}

#[test]
fn put_def_is_idempotent_across_name_variants() {
    let mut dictionary = Dictionary::new();
    let first = dictionary.put_def(FieldDefinition::new("Date Added"));
    let second = dictionary.put_def(FieldDefinition::new("DATE-ADDED"));
    assert_eq!(first, second);
    assert_eq!(dictionary.len(), 1);
}

#[test]
fn put_def_through_an_alias_lands_on_the_original() {
    let mut dictionary = Dictionary::new();
    dictionary.put_def(FieldDefinition::new("Address"));
    dictionary.add_alias(FieldAlias::new("addr", "address"));
    let index = dictionary.put_def(FieldDefinition::new("Addr"));
    assert_eq!(index, 0);
    assert_eq!(dictionary.len(), 1);
}

#[test]
fn unknown_names_return_none() {
    let dictionary = Dictionary::new();
    assert!(dictionary.def_index(&CommonName::new("missing")).is_none());
}

#[test]
fn dictionary_round_trips_through_a_delimited_file() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("fields.csv");

    let mut dictionary = Dictionary::new();
    let mut name = FieldDefinition::new("Artist");
    name.set_rule(Some(FormatRule::InitialCaps));
    dictionary.put_def(name);
    let mut notes = FieldDefinition::new("Notes");
    notes.set_combine_by_appending(true);
    dictionary.put_def(notes);
    dictionary.add_alias(FieldAlias::new("performer", "artist"));

    let mut sink = DelimitedSink::new(Some(path.as_path()), b',');
    dictionary.write_to(&mut sink).expect("write dictionary");

    let mut source = DelimitedSource::new(&path);
    source
        .open_for_input(Dictionary::new().into_shared())
        .expect("open dictionary file");
    let reloaded = Dictionary::read_from(&mut source).expect("reload dictionary");

    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.aliases().len(), 1);
    let artist = reloaded
        .def_index(&CommonName::new("performer"))
        .expect("alias resolves after reload");
    let def = reloaded.def(artist).expect("definition exists");
    assert_eq!(def.rule(), Some(FormatRule::InitialCaps));
    let notes = reloaded
        .def_index(&CommonName::new("notes"))
        .expect("notes definition");
    assert!(reloaded.def(notes).expect("definition").combine_by_appending());

    // The file itself carries the documented header row.
    let raw = fs::read_to_string(&path).expect("read raw file");
    let header = raw.lines().next().expect("header line");
    assert!(header.contains("Proper Name"));
    assert!(header.contains("Alias For"));
    assert!(header.contains("Parm5"));
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
    assert_eq!(
        SemanticType::infer(&CommonName::new("Notes")),
        SemanticType::LongText
    );
    assert_eq!(
        SemanticType::infer(&CommonName::new("Anything Else")),
        SemanticType::Default
    );
}
