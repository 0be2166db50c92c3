//! I/O utilities for delimited-text reading and writing.
//!
//! All file I/O in record-managed flows through this module. It provides:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` →
//!   comma, `.tsv` → tab) with manual override support.
//! - **Reader/writer construction** over plain files or standard streams.
//! - **stdin/stdout**: the `-` path convention routes through standard
//!   streams.
//! - **Quoting**: output uses `QuoteStyle::Always` for round-trip safety.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    if let Some(path) = path {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => return DEFAULT_TSV_DELIMITER,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => return DEFAULT_CSV_DELIMITER,
            _ => {}
        }
    }
    fallback
}

pub fn open_reader<R>(reader: R, delimiter: u8, has_headers: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(has_headers)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_reader_from_path(
    path: &Path,
    delimiter: u8,
    has_headers: bool,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_reader(reader, delimiter, has_headers))
}

pub fn open_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn reader_headers<R>(reader: &mut csv::Reader<R>) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.headers().context("Reading header row")?;
    Ok(headers.iter().map(|h| h.to_string()).collect())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn input_delimiter_resolves_by_extension_with_override() {
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("a.tsv"), None),
            DEFAULT_TSV_DELIMITER
        );
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("a.csv"), None),
            DEFAULT_CSV_DELIMITER
        );
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn output_delimiter_falls_back_to_input() {
        assert_eq!(
            resolve_output_delimiter(Some(&PathBuf::from("out.tsv")), None, b','),
            DEFAULT_TSV_DELIMITER
        );
        assert_eq!(resolve_output_delimiter(None, None, b'\t'), b'\t');
        assert_eq!(
            resolve_output_delimiter(Some(&PathBuf::from("out.dat")), None, b','),
            b','
        );
    }
}
