use record_managed::{
    definition::RecordDefinition,
    dictionary::{Dictionary, FieldAlias},
    filter::{Filter, parse_filter},
    record::{CombineClass, Precedence, Record},
    recordset::RecordSet,
    sequence::SequenceSpec,
};

fn build_set(columns: &[&str]) -> RecordSet {
    let mut definition = RecordDefinition::new(Dictionary::new().into_shared());
    for column in columns {
        definition.add_column(column);
    }
    RecordSet::new(definition)
}

fn add(set: &mut RecordSet, fields: &[&str]) {
    set.add_record(Record::with_fields(
        fields.iter().map(|s| s.to_string()).collect(),
    ));
}

fn sequence_on(set: &RecordSet, directives: &[&str]) -> SequenceSpec {
    let directives: Vec<String> = directives.iter().map(|s| s.to_string()).collect();
    SequenceSpec::from_directives(&directives, set.definition()).expect("valid directives")
}

fn names(set: &RecordSet) -> Vec<String> {
    set.records()
        .iter()
        .map(|record| record.field(0).unwrap_or_default().to_string())
        .collect()
}

#[test]
fn aliased_lookup_reaches_the_same_column() {
    let mut dictionary = Dictionary::new();
    dictionary.add_alias(FieldAlias::new("addr", "address"));
    let mut definition = RecordDefinition::new(dictionary.into_shared());
    definition.add_column("Address");
    assert_eq!(
        definition.column_number("addr"),
        definition.column_number("address")
    );
}

#[test]
fn empty_to_nonempty_combine_needs_no_override() {
    let mut set = build_set(&["Name", "Phone"]);
    add(&mut set, &["Alice", ""]);
    add(&mut set, &["Alice", "555-1234"]);
    let spec = sequence_on(&set, &["Name"]);
    set.set_sequence(Some(spec));

    let combined = set
        .combine(Precedence::LaterWins, CombineClass::Override, 1)
        .expect("sequence is active");
    assert_eq!(combined, 1);
    assert_eq!(set.len(), 1);
    assert_eq!(set.record(0).unwrap().fields(), &["Alice", "555-1234"]);
}

#[test]
fn conflicting_values_fail_under_a_no_data_loss_ceiling() {
    let mut set = build_set(&["Name", "Tag"]);
    // "Tag" infers an appending-natural type; this scenario pins the
    // field to overwrite-only semantics.
    {
        let definition = set.definition();
        let def_index = definition.column(1).unwrap().def_index();
        definition
            .dictionary()
            .borrow_mut()
            .def_mut(def_index)
            .unwrap()
            .set_combine_by_appending(false);
    }
    add(&mut set, &["Alice", "x"]);
    add(&mut set, &["Alice", "y"]);
    let spec = sequence_on(&set, &["Name"]);
    set.set_sequence(Some(spec));

    let combined = set
        .combine(Precedence::LaterWins, CombineClass::NoDataLoss, 0)
        .expect("sequence is active");
    assert_eq!(combined, 0);
    assert_eq!(set.record(0).unwrap().fields(), &["Alice", "x"]);
    assert_eq!(set.record(1).unwrap().fields(), &["Alice", "y"]);
}

#[test]
fn set_sequence_orders_records_ascending() {
    let mut set = build_set(&["Name"]);
    for name in ["Charlie", "Alice", "Bob"] {
        add(&mut set, &[name]);
    }
    let spec = sequence_on(&set, &["Name"]);
    set.set_sequence(Some(spec));
    assert_eq!(names(&set), ["Alice", "Bob", "Charlie"]);
}

#[test]
fn input_filter_limits_iteration_to_matching_records() {
    let mut set = build_set(&["Name", "Status"]);
    for (name, status) in [
        ("a", "Open"),
        ("b", "Closed"),
        ("c", "Closed"),
        ("d", "Open"),
        ("e", "Closed"),
    ] {
        add(&mut set, &[name, status]);
    }
    set.set_filter(Some(parse_filter("Status = Open").expect("filter parses")));

    set.rewind().expect("filter evaluates");
    let mut seen = Vec::new();
    while let Some(record) = set.next_record().expect("filter evaluates") {
        seen.push(record.field(0).unwrap().to_string());
    }
    assert_eq!(seen, ["a", "d"]);
    assert!(set.at_end());
}

#[test]
fn compound_filters_combine_conditions() {
    let mut set = build_set(&["Name", "Status", "Rating"]);
    add(&mut set, &["a", "Open", "5"]);
    add(&mut set, &["b", "Open", "2"]);
    add(&mut set, &["c", "Closed", "5"]);
    let filter = Filter::AllOf(vec![
        parse_filter("Status = Open").unwrap(),
        parse_filter("Rating >= 4").unwrap(),
    ]);
    set.set_filter(Some(filter));

    set.rewind().unwrap();
    let mut seen = Vec::new();
    while let Some(record) = set.next_record().unwrap() {
        seen.push(record.field(0).unwrap().to_string());
    }
    assert_eq!(seen, ["a"]);
}

#[test]
fn ordered_insertion_matches_a_post_hoc_sort() {
    let values = ["pear", "Apple", "banana", "apple", "Cherry"];

    let mut incremental = build_set(&["Name"]);
    let spec = sequence_on(&incremental, &["Name"]);
    incremental.set_sequence(Some(spec));
    for value in values {
        add(&mut incremental, &[value]);
    }

    let mut post_hoc = build_set(&["Name"]);
    for value in values {
        add(&mut post_hoc, &[value]);
    }
    let spec = sequence_on(&post_hoc, &["Name"]);
    post_hoc.set_sequence(Some(spec));

    assert_eq!(names(&incremental), names(&post_hoc));
}

#[test]
fn descending_directive_reverses_order() {
    let mut set = build_set(&["Rating"]);
    for value in ["2", "10", "1"] {
        add(&mut set, &[value]);
    }
    let spec = sequence_on(&set, &["Rating:desc"]);
    set.set_sequence(Some(spec));
    assert_eq!(names(&set), ["10", "2", "1"]);
}

#[test]
fn merge_unifies_columns_and_fills_unmatched_with_empty() {
    use record_managed::source::RecordSource;
    use std::io::Write;

    let dir = tempfile::tempdir().expect("temp dir");
    let left = dir.path().join("left.csv");
    let right = dir.path().join("right.csv");
    std::fs::File::create(&left)
        .and_then(|mut f| writeln!(f, "Name,Phone\nAlice,111"))
        .expect("write left");
    std::fs::File::create(&right)
        .and_then(|mut f| writeln!(f, "Name,Email\nBob,bob@example.com"))
        .expect("write right");

    let dictionary = Dictionary::new().into_shared();
    let mut set = RecordSet::new(RecordDefinition::new(dictionary.clone()));
    for path in [&left, &right] {
        let mut source = record_managed::source::DelimitedSource::new(path);
        source.open_for_input(dictionary.clone()).expect("open");
        set.merge(&mut source, None).expect("merge");
    }

    let headers = set.definition().headers();
    assert_eq!(headers, ["Name", "Phone", "Email"]);
    assert_eq!(set.record(0).unwrap().fields(), &["Alice", "111", ""]);
    assert_eq!(set.record(1).unwrap().fields(), &["Bob", "", "bob@example.com"]);
}

#[test]
fn appending_combine_preserves_both_values_in_arrival_order() {
    let mut set = build_set(&["Name", "Notes"]);
    add(&mut set, &["Alice", "first"]);
    add(&mut set, &["Alice", "second"]);
    let spec = sequence_on(&set, &["Name"]);
    set.set_sequence(Some(spec));

    let combined = set
        .combine(Precedence::LaterWins, CombineClass::Append, 0)
        .expect("sequence is active");
    assert_eq!(combined, 1);
    assert_eq!(set.record(0).unwrap().field(1), Some("first; second"));
}
