//! The `sort` command: order, filter, and project a single delimited
//! file, to a file or an elastic console table.

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::info;

use crate::{
    cli::SortArgs,
    filter::parse_filters,
    io_utils, pipeline,
    recordset::RecordSet,
    sequence::SequenceSpec,
    source::RecordSource,
    table::{self, Alignment},
};

pub fn execute(args: &SortArgs) -> Result<()> {
    let dictionary = pipeline::load_dictionary(args.dictionary.as_deref(), args.delimiter)?;
    let input_delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let mut source = pipeline::open_source(&args.input, args.delimiter, dictionary)?;
    let mut set = RecordSet::from_source(&mut source, args.limit)
        .with_context(|| format!("Loading {:?}", args.input))?;
    source.close()?;

    if !args.sort.is_empty() {
        let spec = SequenceSpec::from_directives(&args.sort, set.definition())?;
        set.set_sequence(Some(spec));
    }
    set.set_filter(parse_filters(&args.filters)?);

    let projection = resolve_projection(&args.columns, &set)?;
    let headers: Vec<String> = projection
        .iter()
        .map(|&index| {
            set.definition()
                .column_name(index)
                .unwrap_or_else(|| format!("column {index}"))
        })
        .collect();

    let mut rows = Vec::new();
    set.rewind()?;
    while let Some(record) = set.next_record()? {
        rows.push(
            projection
                .iter()
                .map(|&index| record.field(index).unwrap_or_default().to_string())
                .collect::<Vec<_>>(),
        );
    }

    if args.table {
        let alignments: Vec<Alignment> = projection
            .iter()
            .map(|&index| set.definition().ordering_class(index).into())
            .collect();
        table::print_aligned_table(&headers, &rows, &alignments);
    } else {
        let delimiter = io_utils::resolve_output_delimiter(
            args.output.as_deref(),
            args.output_delimiter,
            input_delimiter,
        );
        let mut writer = io_utils::open_writer(args.output.as_deref(), delimiter)?;
        writer.write_record(headers.iter()).context("Writing headers")?;
        for row in &rows {
            writer.write_record(row.iter()).context("Writing record")?;
        }
        writer.flush().context("Flushing output")?;
    }
    info!("Emitted {} record(s)", rows.len());
    Ok(())
}

/// Resolves `--columns` directives (comma-separated, alias-aware) into
/// column indices, or every column when none were given.
fn resolve_projection(columns: &[String], set: &RecordSet) -> Result<Vec<usize>> {
    if columns.is_empty() {
        return Ok((0..set.definition().column_count()).collect());
    }
    columns
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            set.definition()
                .column_number(name)
                .ok_or_else(|| anyhow!("Unknown column '{name}'"))
        })
        .try_collect()
}
