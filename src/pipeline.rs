//! Shared plumbing for the CLI commands: dictionary loading, source
//! construction, and record-set output.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{
    dictionary::{Dictionary, SharedDictionary},
    io_utils,
    recordset::RecordSet,
    source::{DelimitedSink, DelimitedSource, RecordSink, RecordSource},
};

/// Loads a dictionary file, or provides an empty shared dictionary when no
/// path was given. The dictionary file itself is delimited text laid out
/// per [`crate::dictionary::DICTIONARY_COLUMNS`].
pub fn load_dictionary(path: Option<&Path>, delimiter: Option<u8>) -> Result<SharedDictionary> {
    let Some(path) = path else {
        return Ok(Dictionary::new().into_shared());
    };
    let mut source = open_source(path, delimiter, Dictionary::new().into_shared())?;
    let dictionary = Dictionary::read_from(&mut source)
        .with_context(|| format!("Reading dictionary from {path:?}"))?;
    source.close()?;
    info!(
        "Dictionary {:?} supplied {} definition(s) and {} alias(es)",
        path,
        dictionary.len(),
        dictionary.aliases().len()
    );
    Ok(dictionary.into_shared())
}

/// Opens a delimited source over the shared dictionary, resolving the
/// delimiter from the path's extension when not given explicitly.
pub fn open_source(
    path: &Path,
    delimiter: Option<u8>,
    dictionary: SharedDictionary,
) -> Result<DelimitedSource> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let mut source = DelimitedSource::new(path).with_delimiter(delimiter);
    source
        .open_for_input(dictionary)
        .with_context(|| format!("Opening {path:?}"))?;
    Ok(source)
}

/// Writes every record surviving the set's input filter to a delimited
/// sink (stdout when `output` is `None`). Returns the records written.
pub fn write_record_set(
    set: &mut RecordSet,
    output: Option<&Path>,
    delimiter: Option<u8>,
    input_delimiter: u8,
) -> Result<usize> {
    let delimiter = io_utils::resolve_output_delimiter(output, delimiter, input_delimiter);
    let mut sink = DelimitedSink::new(output, delimiter);
    sink.open_for_output(set.definition())?;
    let mut written = 0usize;
    set.rewind()?;
    while let Some(record) = set.next_record()? {
        sink.next_record_out(record)?;
        written += 1;
    }
    sink.close()?;
    Ok(written)
}
