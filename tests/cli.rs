use std::{fs, io::Write};

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

fn write_file(path: &std::path::Path, contents: &str) {
    let mut file = fs::File::create(path).expect("create file");
    write!(file, "{contents}").expect("write file");
}

fn cargo_bin() -> Command {
    Command::cargo_bin("record-managed").expect("binary exists")
}

#[test]
fn merge_unifies_two_inputs_and_sorts() {
    let dir = tempdir().expect("temp dir");
    let left = dir.path().join("left.csv");
    let right = dir.path().join("right.csv");
    let output = dir.path().join("merged.csv");
    write_file(&left, "Name,Phone\nCharlie,333\nAlice,111\n");
    write_file(&right, "Name,Email\nBob,bob@example.com\n");

    cargo_bin()
        .args([
            "merge",
            "-i",
            left.to_str().unwrap(),
            "-i",
            right.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--sort",
            "Name",
        ])
        .assert()
        .success()
        .stderr(contains("Merged").count(2));

    let written = fs::read_to_string(&output).expect("read output");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "\"Name\",\"Phone\",\"Email\"");
    assert_eq!(lines[1], "\"Alice\",\"111\",\"\"");
    assert_eq!(lines[2], "\"Bob\",\"\",\"bob@example.com\"");
    assert_eq!(lines[3], "\"Charlie\",\"333\",\"\"");
}

#[test]
fn merge_with_combine_folds_duplicate_keys() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("input.csv");
    let output = dir.path().join("combined.csv");
    write_file(&input, "Name,Phone\nAlice,\nAlice,555-1234\nBob,111\n");

    cargo_bin()
        .args([
            "merge",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--sort",
            "Name",
            "--combine",
        ])
        .assert()
        .success();

    let written = fs::read_to_string(&output).expect("read output");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "\"Alice\",\"555-1234\"");
    assert_eq!(lines[2], "\"Bob\",\"111\"");
}

#[test]
fn merge_applies_dictionary_aliases_across_inputs() {
    let dir = tempdir().expect("temp dir");
    let dictionary = dir.path().join("fields.csv");
    let left = dir.path().join("left.csv");
    let right = dir.path().join("right.csv");
    let output = dir.path().join("merged.csv");
    write_file(
        &dictionary,
        "\"Proper Name\",\"Common Name\",\"Alias For\",\"Data Format Rule\",\
\"Combine by Appending?\",\"Function Name\",\"Parm1\",\"Parm2\",\"Parm3\",\"Parm4\",\"Parm5\"\n\
Telephone,telephone,phone,,,,,,,,\n",
    );
    write_file(&left, "Name,Phone\nAlice,111\n");
    write_file(&right, "Name,Telephone\nBob,222\n");

    cargo_bin()
        .args([
            "merge",
            "-i",
            left.to_str().unwrap(),
            "-i",
            right.to_str().unwrap(),
            "-d",
            dictionary.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    // "Telephone" aliases "phone": both inputs land in one column.
    let written = fs::read_to_string(&output).expect("read output");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "\"Name\",\"Phone\"");
    assert_eq!(lines[1], "\"Alice\",\"111\"");
    assert_eq!(lines[2], "\"Bob\",\"222\"");
}

#[test]
fn dedupe_combines_records_sharing_the_key() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("input.csv");
    let output = dir.path().join("deduped.csv");
    write_file(&input, "Name,Phone\nAlice,111\nAlice,111\nAlice,\n");

    cargo_bin()
        .args([
            "dedupe",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--key",
            "Name",
        ])
        .assert()
        .success();

    let written = fs::read_to_string(&output).expect("read output");
    assert_eq!(written.lines().count(), 2);
}

#[test]
fn sort_renders_a_table_to_stdout() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("input.csv");
    write_file(&input, "Name,Rating\nBeta,2\nAlpha,10\n");

    cargo_bin()
        .args([
            "sort",
            "-i",
            input.to_str().unwrap(),
            "--sort",
            "Rating:desc",
            "--table",
        ])
        .assert()
        .success()
        .stdout(contains("Name"))
        .stdout(contains("Alpha"));
}

#[test]
fn sort_projects_requested_columns() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("input.csv");
    let output = dir.path().join("projected.csv");
    write_file(&input, "Name,Phone,Email\nAlice,111,alice@example.com\n");

    cargo_bin()
        .args([
            "sort",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-C",
            "Email,Name",
        ])
        .assert()
        .success();

    let written = fs::read_to_string(&output).expect("read output");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "\"Email\",\"Name\"");
    assert_eq!(lines[1], "\"alice@example.com\",\"Alice\"");
}

#[test]
fn profile_emits_json_per_column() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("input.csv");
    write_file(&input, "Name,Rating\nAlice,5\nBob,\n");

    let assert = cargo_bin()
        .args(["profile", "-i", input.to_str().unwrap(), "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let profile: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(profile["records"], 2);
    assert_eq!(profile["columns"][0]["name"], "Name");
    assert_eq!(profile["columns"][1]["type"], "rating");
    assert_eq!(profile["columns"][1]["non_empty"], 1);
}

#[test]
fn dictionary_command_lists_definitions_and_aliases() {
    let dir = tempdir().expect("temp dir");
    let dictionary = dir.path().join("fields.csv");
    write_file(
        &dictionary,
        "\"Proper Name\",\"Common Name\",\"Alias For\",\"Data Format Rule\",\
\"Combine by Appending?\",\"Function Name\",\"Parm1\",\"Parm2\",\"Parm3\",\"Parm4\",\"Parm5\"\n\
Artist,artist,,Initial Caps,no,,,,,,\n\
performer,performer,artist,,,,,,,,\n",
    );

    cargo_bin()
        .args(["dictionary", "-d", dictionary.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Artist"))
        .stdout(contains("alias for artist"));
}

#[test]
fn malformed_filter_expression_fails() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("input.csv");
    write_file(&input, "Name\nAlice\n");

    cargo_bin()
        .args([
            "merge",
            "-i",
            input.to_str().unwrap(),
            "--filter",
            "Name ~ Alice",
        ])
        .assert()
        .failure()
        .stderr(contains("filter"));
}
