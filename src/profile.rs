//! The `profile` command: per-column statistics for a delimited file,
//! as an elastic table or JSON.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    cli::ProfileArgs,
    dictionary::SemanticType,
    pipeline,
    recordset::RecordSet,
    source::RecordSource,
    table::{self, Alignment},
};

#[derive(Debug, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub semantic: SemanticType,
    pub max_length: usize,
    pub average_length: usize,
    pub non_empty: usize,
}

#[derive(Debug, Serialize)]
pub struct FileProfile {
    pub records: usize,
    pub columns: Vec<ColumnProfile>,
}

pub fn execute(args: &ProfileArgs) -> Result<()> {
    let dictionary = pipeline::load_dictionary(args.dictionary.as_deref(), args.delimiter)?;
    let mut source = pipeline::open_source(&args.input, args.delimiter, dictionary)?;
    let set = RecordSet::from_source(&mut source, args.limit)
        .with_context(|| format!("Loading {:?}", args.input))?;
    source.close()?;

    let profile = profile_set(&set);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    let headers = ["Column", "Type", "Max Len", "Avg Len", "Non-Empty"]
        .map(String::from)
        .to_vec();
    let rows: Vec<Vec<String>> = profile
        .columns
        .iter()
        .map(|column| {
            vec![
                column.name.clone(),
                column.semantic.label().to_string(),
                column.max_length.to_string(),
                column.average_length.to_string(),
                column.non_empty.to_string(),
            ]
        })
        .collect();
    let alignments = [
        Alignment::Left,
        Alignment::Left,
        Alignment::Right,
        Alignment::Right,
        Alignment::Right,
    ];
    println!("{} record(s)", profile.records);
    table::print_aligned_table(&headers, &rows, &alignments);
    Ok(())
}

pub fn profile_set(set: &RecordSet) -> FileProfile {
    let definition = set.definition();
    let columns = definition
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let non_empty = set
                .records()
                .iter()
                .filter(|record| {
                    !crate::data::is_empty_value(record.field(index).unwrap_or_default())
                })
                .count();
            ColumnProfile {
                name: definition
                    .column_name(index)
                    .unwrap_or_else(|| format!("column {index}")),
                semantic: definition.semantic(index),
                max_length: column.max_length(),
                average_length: column.average_length(),
                non_empty,
            }
        })
        .collect();
    FileProfile {
        records: set.len(),
        columns,
    }
}
