//! The mutable, orderable record collection.
//!
//! A [`RecordSet`] owns its definition, its records, the active sequence
//! spec and input filter, and a single forward-iteration cursor. The core
//! is single-threaded and synchronous: running two iterations at once, or
//! mutating while iterating, is a caller precondition violation rather
//! than something enforced with locks.
//!
//! Mutating operations are ordered so that failure leaves previously
//! committed state untouched: a rejected combine never partially writes a
//! record, and a failed merge load stops after the records already added.

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};

use crate::{
    calc::Calculator,
    definition::RecordDefinition,
    filter::Filter,
    record::{CombineClass, Precedence, Record},
    sequence::SequenceSpec,
    source::RecordSource,
};

/// Record count standing in for a free-memory probe: crossing it logs one
/// advisory warning per record-set lifetime. Insertion is never refused.
pub const LOW_MEMORY_RECORD_THRESHOLD: usize = 500_000;

pub struct RecordSet {
    definition: RecordDefinition,
    records: Vec<Record>,
    sequence: Option<SequenceSpec>,
    filter: Option<Filter>,
    next_seq: u64,
    cursor: usize,
    low_memory_warned: bool,
}

impl RecordSet {
    pub fn new(definition: RecordDefinition) -> Self {
        Self {
            definition,
            records: Vec::new(),
            sequence: None,
            filter: None,
            next_seq: 0,
            cursor: 0,
            low_memory_warned: false,
        }
    }

    /// Builds a record set over an opened source's own definition and loads
    /// every record (up to `max_records`) without projection.
    pub fn from_source(
        source: &mut dyn RecordSource,
        max_records: Option<usize>,
    ) -> Result<Self> {
        let definition = source
            .rec_def()
            .ok_or_else(|| anyhow!("Source must be opened before loading"))?
            .clone();
        let mut set = Self::new(definition);
        set.merge_same(source, max_records)?;
        Ok(set)
    }

    pub fn definition(&self) -> &RecordDefinition {
        &self.definition
    }

    pub fn definition_mut(&mut self) -> &mut RecordDefinition {
        &mut self.definition
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Random access. Out-of-range indices are a bounds violation, fatal to
    /// the calling operation.
    pub fn record(&self, index: usize) -> Result<&Record> {
        self.records.get(index).ok_or_else(|| {
            anyhow!(
                "Record index {index} out of range ({} record(s))",
                self.records.len()
            )
        })
    }

    pub fn sequence(&self) -> Option<&SequenceSpec> {
        self.sequence.as_ref()
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn set_filter(&mut self, filter: Option<Filter>) {
        self.filter = filter;
    }

    /// Adds a record: assigns the next creation-sequence number, applies
    /// formatting rules, back-fills to the definition's column count,
    /// updates column statistics, and inserts in sequence order when a spec
    /// is active (linear front scan; the new record lands after any record
    /// comparing equal, keeping insertion stable). Appends otherwise.
    pub fn add_record(&mut self, mut record: Record) {
        record.set_seq(self.next_seq);
        self.next_seq += 1;
        record.pad_to(&self.definition);

        for index in 0..self.definition.column_count() {
            if let Some(def) = self.definition.field_def(index)
                && let Some(rule) = def.rule()
            {
                let raw = record.field(index).unwrap_or_default();
                let formatted = rule.transform(raw);
                if formatted != raw {
                    let formatted = formatted.into_owned();
                    record.set_field(index, formatted);
                }
            }
            self.definition
                .observe_value(record.field(index).unwrap_or_default(), index);
        }

        let position = match &self.sequence {
            Some(spec) => self
                .records
                .iter()
                .position(|existing| {
                    spec.compare(existing, &record, &self.definition)
                        == std::cmp::Ordering::Greater
                })
                .unwrap_or(self.records.len()),
            None => self.records.len(),
        };
        self.records.insert(position, record);

        if !self.low_memory_warned && self.records.len() >= LOW_MEMORY_RECORD_THRESHOLD {
            warn!(
                "Record set has grown to {} record(s); memory may be running low",
                self.records.len()
            );
            self.low_memory_warned = true;
        }
    }

    /// Installs a sequence spec and re-sorts. The sort is repeated bubble
    /// passes until no swap occurs: stable, and deliberately simple over
    /// fast, record counts being assumed to fit comfortably in memory.
    pub fn set_sequence(&mut self, sequence: Option<SequenceSpec>) {
        self.sequence = sequence;
        let Some(spec) = &self.sequence else {
            return;
        };
        if self.records.len() < 2 {
            return;
        }
        loop {
            let mut swapped = false;
            for index in 0..self.records.len() - 1 {
                if spec.compare(
                    &self.records[index],
                    &self.records[index + 1],
                    &self.definition,
                ) == std::cmp::Ordering::Greater
                {
                    self.records.swap(index, index + 1);
                    swapped = true;
                }
            }
            if !swapped {
                break;
            }
        }
        self.cursor = 0;
    }

    /// Combines adjacent records whose sequence keys compare equal. The
    /// first record of each pair absorbs the result and the second is
    /// removed; a pair that cannot be reconciled is skipped as a whole.
    /// Returns the number of successful combinations. Requires an active
    /// sequence spec, which is what defines key equality.
    pub fn combine(
        &mut self,
        precedence: Precedence,
        max_allowed: CombineClass,
        min_no_loss: usize,
    ) -> Result<usize> {
        let spec = self
            .sequence
            .clone()
            .ok_or_else(|| anyhow!("Combine requires an active sequence"))?;
        let mut combined = 0usize;
        let mut index = 0usize;
        while index + 1 < self.records.len() {
            if !spec.keys_equal(
                &self.records[index],
                &self.records[index + 1],
                &self.definition,
            ) {
                index += 1;
                continue;
            }
            let (left, right) = self.records.split_at_mut(index + 1);
            if left[index].combine(
                &right[0],
                &self.definition,
                precedence,
                max_allowed,
                min_no_loss,
            ) {
                self.records.remove(index + 1);
                combined += 1;
                // The absorbed result may also match the next neighbor.
            } else {
                index += 2;
            }
        }
        if combined > 0 {
            self.cursor = 0;
        }
        debug!("Combined {combined} record pair(s)");
        Ok(combined)
    }

    /// Merges an opened source into this set: reconciles the source's
    /// definition into ours, back-fills records already held to the grown
    /// column count, then projects every incoming record through
    /// the merged-column index (unmatched columns fill empty), recalculates
    /// calculated fields, and adds it. Returns the records merged.
    pub fn merge(
        &mut self,
        source: &mut dyn RecordSource,
        max_records: Option<usize>,
    ) -> Result<usize> {
        let incoming = source
            .rec_def()
            .ok_or_else(|| anyhow!("Source must be opened before merging"))?
            .clone();
        self.definition.merge(&incoming);
        for record in &mut self.records {
            record.pad_to(&self.definition);
        }
        let projection: Vec<Option<usize>> = self
            .definition
            .columns()
            .iter()
            .map(|column| column.merged_from())
            .collect();

        let mut calculator = Calculator::new(source.data_parent());
        let mut merged = 0usize;
        while !max_records.is_some_and(|limit| merged >= limit) {
            let Some(record) = source.next_record()? else {
                break;
            };
            let fields = projection
                .iter()
                .map(|mapped| match mapped {
                    Some(position) => record.field(*position).unwrap_or_default().to_string(),
                    None => String::new(),
                })
                .collect();
            let mut projected = Record::with_fields(fields);
            calculator.recalculate(&mut projected, &self.definition);
            self.add_record(projected);
            merged += 1;
        }
        debug!("Merged {merged} record(s) through projection");
        Ok(merged)
    }

    /// Identical-schema fast path: records are copied verbatim with no
    /// projection. The caller asserts both definitions already agree.
    pub fn merge_same(
        &mut self,
        source: &mut dyn RecordSource,
        max_records: Option<usize>,
    ) -> Result<usize> {
        let mut merged = 0usize;
        while !max_records.is_some_and(|limit| merged >= limit) {
            let Some(record) = source.next_record()? else {
                break;
            };
            self.add_record(record);
            merged += 1;
        }
        debug!("Loaded {merged} record(s) without projection");
        Ok(merged)
    }

    /// Resets the forward cursor to the first record passing the input
    /// filter. Iteration is re-entrant by rewinding; it is not safe to run
    /// two iterations over the same set concurrently.
    pub fn rewind(&mut self) -> Result<()> {
        self.cursor = 0;
        self.advance_past_filtered()
    }

    /// True once the cursor has passed the last record the filter accepts.
    pub fn at_end(&self) -> bool {
        self.cursor >= self.records.len()
    }

    /// Delivers the record under the cursor and advances past any records
    /// the input filter rejects, so every record observed through iteration
    /// passes the filter. The skip runs both before and after delivery:
    /// before, because a filter installed mid-iteration may reject the
    /// record the cursor currently rests on.
    pub fn next_record(&mut self) -> Result<Option<&Record>> {
        self.advance_past_filtered()?;
        if self.at_end() {
            return Ok(None);
        }
        let index = self.cursor;
        self.cursor += 1;
        self.advance_past_filtered()?;
        Ok(Some(&self.records[index]))
    }

    fn advance_past_filtered(&mut self) -> Result<()> {
        let Some(filter) = &self.filter else {
            return Ok(());
        };
        while self.cursor < self.records.len() {
            if filter
                .accepts(&self.records[self.cursor], &self.definition)
                .context("Evaluating input filter")?
            {
                break;
            }
            self.cursor += 1;
        }
        Ok(())
    }
}
