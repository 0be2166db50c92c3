//! The source/sink boundary: pull-based record producers and consumers.
//!
//! Format-specific readers and writers meet the core through these traits.
//! A source establishes its record definition against a caller-supplied
//! dictionary when opened, then yields one record per pull; a sink mirrors
//! that on the output side. [`DelimitedSource`]/[`DelimitedSink`] are the
//! delimited-text implementation, with the header row carrying column
//! names. Dictionary files load and store through the same interface.

use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;

use crate::{
    definition::RecordDefinition,
    dictionary::SharedDictionary,
    io_utils,
    record::Record,
};

/// Pull-based record producer. `open_for_input` must be called before any
/// other operation; it establishes the record definition the stream
/// conforms to, registered against the supplied dictionary.
pub trait RecordSource {
    fn open_for_input(&mut self, dictionary: SharedDictionary) -> Result<()>;

    /// Delivers the next record, or `None` at end of stream.
    fn next_record(&mut self) -> Result<Option<Record>>;

    /// Consultable before and after each pull.
    fn is_at_end(&self) -> bool;

    /// The definition records conform to; `None` before opening.
    fn rec_def(&self) -> Option<&RecordDefinition>;

    /// 1-based count of records delivered so far.
    fn record_number(&self) -> usize;

    /// Base path for resolving relative lookup-table references.
    fn data_parent(&self) -> Option<PathBuf>;

    fn close(&mut self) -> Result<()>;
}

/// Push-based record consumer mirroring [`RecordSource`].
pub trait RecordSink {
    fn open_for_output(&mut self, definition: &RecordDefinition) -> Result<()>;
    fn next_record_out(&mut self, record: &Record) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// Delimited-text record source. Reads one record ahead so `is_at_end` is
/// accurate before the first pull.
pub struct DelimitedSource {
    path: PathBuf,
    delimiter: u8,
    reader: Option<csv::Reader<Box<dyn Read>>>,
    definition: Option<RecordDefinition>,
    pending: Option<Record>,
    delivered: usize,
}

impl DelimitedSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: io_utils::resolve_input_delimiter(path, None),
            reader: None,
            definition: None,
            pending: None,
            delivered: 0,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn prefetch(&mut self) -> Result<()> {
        let Some(reader) = self.reader.as_mut() else {
            self.pending = None;
            return Ok(());
        };
        let mut raw = csv::StringRecord::new();
        let more = reader.read_record(&mut raw).with_context(|| {
            format!("Reading row {} of {:?}", self.delivered + 2, self.path)
        })?;
        self.pending = if more {
            Some(Record::with_fields(
                raw.iter().map(|field| field.to_string()).collect(),
            ))
        } else {
            None
        };
        Ok(())
    }
}

impl RecordSource for DelimitedSource {
    fn open_for_input(&mut self, dictionary: SharedDictionary) -> Result<()> {
        let mut reader = io_utils::open_reader_from_path(&self.path, self.delimiter, true)?;
        let headers = io_utils::reader_headers(&mut reader)
            .with_context(|| format!("Reading headers of {:?}", self.path))?;
        let mut definition = RecordDefinition::new(dictionary);
        for header in &headers {
            definition.add_column(header);
        }
        debug!(
            "Opened {:?} with {} column(s), delimiter '{}'",
            self.path,
            headers.len(),
            io_utils::printable_delimiter(self.delimiter)
        );
        self.reader = Some(reader);
        self.definition = Some(definition);
        self.delivered = 0;
        self.prefetch()
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        let Some(mut record) = self.pending.take() else {
            return Ok(None);
        };
        self.prefetch()?;
        self.delivered += 1;
        if let Some(definition) = &self.definition {
            record.pad_to(definition);
        }
        Ok(Some(record))
    }

    fn is_at_end(&self) -> bool {
        self.pending.is_none()
    }

    fn rec_def(&self) -> Option<&RecordDefinition> {
        self.definition.as_ref()
    }

    fn record_number(&self) -> usize {
        self.delivered
    }

    fn data_parent(&self) -> Option<PathBuf> {
        self.path.parent().map(Path::to_path_buf)
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        self.pending = None;
        Ok(())
    }
}

/// Delimited-text record sink. The header row is written from the
/// definition's proper names when the sink opens.
pub struct DelimitedSink {
    path: Option<PathBuf>,
    delimiter: u8,
    writer: Option<csv::Writer<Box<dyn Write>>>,
    column_count: usize,
}

impl DelimitedSink {
    /// `None` writes to stdout.
    pub fn new(path: Option<&Path>, delimiter: u8) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            delimiter,
            writer: None,
            column_count: 0,
        }
    }
}

impl RecordSink for DelimitedSink {
    fn open_for_output(&mut self, definition: &RecordDefinition) -> Result<()> {
        let mut writer = io_utils::open_writer(self.path.as_deref(), self.delimiter)?;
        writer
            .write_record(definition.headers().iter())
            .context("Writing output headers")?;
        self.writer = Some(writer);
        self.column_count = definition.column_count();
        Ok(())
    }

    fn next_record_out(&mut self, record: &Record) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .context("Sink must be opened before writing records")?;
        let mut fields: Vec<&str> = record.fields().iter().map(String::as_str).collect();
        while fields.len() < self.column_count {
            fields.push("");
        }
        writer.write_record(&fields).context("Writing record")
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().context("Flushing output")?;
        }
        Ok(())
    }
}
