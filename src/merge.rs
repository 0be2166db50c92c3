//! The `merge` command: fold any number of delimited inputs into one
//! output with a unified column layout, optionally sorting, combining
//! same-key records, and filtering along the way.

use anyhow::{Context, Result, bail};
use log::info;

use crate::{
    cli::MergeArgs,
    definition::RecordDefinition,
    filter::parse_filters,
    io_utils, pipeline,
    recordset::RecordSet,
    sequence::SequenceSpec,
    source::RecordSource,
};

pub fn execute(args: &MergeArgs) -> Result<()> {
    if args.inputs.is_empty() {
        bail!("At least one input file is required");
    }

    let dictionary = pipeline::load_dictionary(args.dictionary.as_deref(), args.delimiter)?;
    let mut set = RecordSet::new(RecordDefinition::new(dictionary.clone()));
    let mut input_delimiter = io_utils::DEFAULT_CSV_DELIMITER;

    for input in &args.inputs {
        input_delimiter = io_utils::resolve_input_delimiter(input, args.delimiter);
        let mut source = pipeline::open_source(input, args.delimiter, dictionary.clone())?;
        let merged = set
            .merge(&mut source, args.limit)
            .with_context(|| format!("Merging {input:?}"))?;
        source.close()?;
        info!("Merged {merged} record(s) from {:?}", input);
    }

    if !args.sort.is_empty() {
        let spec = SequenceSpec::from_directives(&args.sort, set.definition())?;
        set.set_sequence(Some(spec));
    }
    if args.combine {
        let combined = set.combine(
            args.precedence.into(),
            args.max_allowed.into(),
            args.min_no_loss,
        )?;
        info!("Combined {combined} record pair(s)");
    }
    set.set_filter(parse_filters(&args.filters)?);

    let written = pipeline::write_record_set(
        &mut set,
        args.output.as_deref(),
        args.output_delimiter,
        input_delimiter,
    )?;
    info!("Wrote {written} record(s)");
    Ok(())
}
