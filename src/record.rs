//! Records and the combine (conflict-resolution) algorithm.
//!
//! A [`Record`] is an ordered list of raw field values whose identity comes
//! from the owning definition's column at the same position, plus a
//! creation-order sequence number used to break combine ties. Combining two
//! records is strictly two-pass: every column is classified first, the
//! aggregate verdict is reached, and only then is the first record mutated.
//! A failed combine therefore never partially mutates anything.

use crate::{
    data::{is_empty_value, values_equal},
    definition::RecordDefinition,
};

/// Separator used when two values are reconciled by appending.
pub const APPEND_SEPARATOR: &str = "; ";

/// Which record wins when both sides hold non-empty, unequal values and the
/// column cannot append. Ties are broken by creation-sequence number:
/// `LaterWins` picks the larger, `EarlierWins` the smaller, and `NoOverride`
/// forbids the situation outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    EarlierWins,
    LaterWins,
    NoOverride,
}

/// Severity classification of one column's pairwise outcome, ordered from
/// harmless to irreconcilable. A combine succeeds only when the worst
/// observed class stays within the caller's ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CombineClass {
    NoDataLoss,
    Override,
    Append,
    Mismatch,
}

/// Planned mutation for one column, produced by the classification pass and
/// applied only if the whole combine is approved.
#[derive(Debug, Clone, PartialEq)]
enum ColumnPlan {
    Keep,
    Take(String),
}

/// One record: raw field values positionally bound to a record definition,
/// plus the creation-order sequence number assigned by the owning set.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<String>,
    seq: u64,
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl Record {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            seq: 0,
        }
    }

    pub fn with_fields(fields: Vec<String>) -> Self {
        Self { fields, seq: 0 }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn set_seq(&mut self, seq: u64) {
        self.seq = seq;
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Looks a field up by (alias-resolved) name through the definition.
    /// `None` means the record's definition has no such field.
    pub fn field_by_name(&self, definition: &RecordDefinition, name: &str) -> Option<&str> {
        let index = definition.column_number(name)?;
        Some(self.field(index).unwrap_or_default())
    }

    /// Sets a field, growing the record with empty values if needed so the
    /// index is always valid afterwards.
    pub fn set_field(&mut self, index: usize, value: String) {
        if index >= self.fields.len() {
            self.fields.resize(index + 1, String::new());
        }
        self.fields[index] = value;
    }

    /// Back-fills empty values up to the definition's column count. This is
    /// the single operation enforcing the at-rest invariant that a record
    /// never has fewer fields than its definition has columns.
    pub fn pad_to(&mut self, definition: &RecordDefinition) {
        let target = definition.column_count();
        while self.fields.len() < target {
            self.fields.push(definition.semantic(self.fields.len()).empty_value());
        }
    }

    /// Folds `other` into this record under the given precedence and
    /// data-loss ceiling. Returns `true` and mutates this record in place on
    /// success; returns `false` and leaves both records untouched otherwise.
    ///
    /// `min_no_loss` only gates the outcome when the worst per-column class
    /// sits exactly at the ceiling and that ceiling is `Override` or
    /// `Append`: it demands at least that many columns agreed losslessly
    /// before tolerating conflict resolution at the limit.
    pub fn combine(
        &mut self,
        other: &Record,
        definition: &RecordDefinition,
        precedence: Precedence,
        max_allowed: CombineClass,
        min_no_loss: usize,
    ) -> bool {
        let Some(plans) = classify(self, other, definition, precedence, max_allowed) else {
            return false;
        };

        let worst = plans
            .iter()
            .map(|(class, _)| *class)
            .max()
            .unwrap_or(CombineClass::NoDataLoss);
        if worst > max_allowed {
            return false;
        }
        if worst == max_allowed
            && matches!(worst, CombineClass::Override | CombineClass::Append)
        {
            let no_loss = plans
                .iter()
                .filter(|(class, _)| *class == CombineClass::NoDataLoss)
                .count();
            if no_loss < min_no_loss {
                return false;
            }
        }

        for (index, (_, plan)) in plans.into_iter().enumerate() {
            if let ColumnPlan::Take(value) = plan {
                self.set_field(index, value);
            }
        }
        true
    }
}

/// Classification pass: one `(class, plan)` per column, or `None` when a
/// column hits `NoOverride` with both sides populated and unequal (the
/// combination is forbidden before severity is even weighed).
fn classify(
    a: &Record,
    b: &Record,
    definition: &RecordDefinition,
    precedence: Precedence,
    max_allowed: CombineClass,
) -> Option<Vec<(CombineClass, ColumnPlan)>> {
    let mut plans = Vec::with_capacity(definition.column_count());
    for index in 0..definition.column_count() {
        let left = a.field(index).unwrap_or_default();
        let right = b.field(index).unwrap_or_default();
        let class = definition.ordering_class(index);

        let outcome = if is_empty_value(left) && is_empty_value(right) {
            (CombineClass::NoDataLoss, ColumnPlan::Keep)
        } else if values_equal(left, right, class) {
            (CombineClass::NoDataLoss, ColumnPlan::Keep)
        } else if is_empty_value(left) {
            // Filling an empty side discards nothing.
            (CombineClass::NoDataLoss, ColumnPlan::Take(right.to_string()))
        } else if is_empty_value(right) {
            (CombineClass::NoDataLoss, ColumnPlan::Keep)
        } else if definition.combine_by_appending(index) && max_allowed >= CombineClass::Append {
            let appended = if a.seq() <= b.seq() {
                format!("{left}{APPEND_SEPARATOR}{right}")
            } else {
                format!("{right}{APPEND_SEPARATOR}{left}")
            };
            (CombineClass::Append, ColumnPlan::Take(appended))
        } else if max_allowed >= CombineClass::Override {
            let other_wins = match precedence {
                Precedence::LaterWins => b.seq() > a.seq(),
                Precedence::EarlierWins => b.seq() < a.seq(),
                Precedence::NoOverride => return None,
            };
            let plan = if other_wins {
                ColumnPlan::Take(right.to_string())
            } else {
                ColumnPlan::Keep
            };
            (CombineClass::Override, plan)
        } else {
            (CombineClass::Mismatch, ColumnPlan::Keep)
        };
        plans.push(outcome);
    }
    Some(plans)
}
