//! The `dedupe` command: sort one input by a key and combine the records
//! that share it.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::DedupeArgs,
    io_utils, pipeline,
    recordset::RecordSet,
    sequence::SequenceSpec,
    source::RecordSource,
};

pub fn execute(args: &DedupeArgs) -> Result<()> {
    let dictionary = pipeline::load_dictionary(args.dictionary.as_deref(), args.delimiter)?;
    let input_delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let mut source = pipeline::open_source(&args.input, args.delimiter, dictionary)?;
    let mut set = RecordSet::from_source(&mut source, None)
        .with_context(|| format!("Loading {:?}", args.input))?;
    source.close()?;
    let loaded = set.len();

    let spec = SequenceSpec::from_directives(&args.keys, set.definition())?;
    set.set_sequence(Some(spec));
    let combined = set.combine(
        args.precedence.into(),
        args.max_allowed.into(),
        args.min_no_loss,
    )?;

    let written = pipeline::write_record_set(
        &mut set,
        args.output.as_deref(),
        args.output_delimiter,
        input_delimiter,
    )?;
    info!(
        "Read {loaded} record(s), combined {combined} pair(s), wrote {written}"
    );
    Ok(())
}
