//! Field-value helpers shared by sequencing, filtering, and combining.
//!
//! Record fields are stored as raw strings; the routines here decide how two
//! raw values relate given the ordering class of their column (textual,
//! numeric, or chronological). Empty values always order before non-empty
//! ones so that sparse records cluster predictably.

use std::cmp::Ordering;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};

/// How a column's values are interpreted when ordered or compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingClass {
    Textual,
    Numeric,
    Chronological,
}

pub fn is_empty_value(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

fn parse_chronological(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    parse_naive_datetime(trimmed)
        .ok()
        .or_else(|| parse_naive_date(trimmed).ok().map(|d| d.into()))
}

/// Compares two raw field values under the given ordering class.
///
/// Both sides must parse for the typed comparison to apply; otherwise the
/// comparison falls back to case-insensitive text. Case-folded-equal values
/// compare `Equal`, which is what keys-equal checks rely on; sorting stays
/// deterministic because the record-set sort is stable.
pub fn compare_values(left: &str, right: &str, class: OrderingClass) -> Ordering {
    match (is_empty_value(left), is_empty_value(right)) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    match class {
        OrderingClass::Numeric => {
            if let (Ok(a), Ok(b)) = (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
                return a.total_cmp(&b);
            }
        }
        OrderingClass::Chronological => {
            if let (Some(a), Some(b)) = (parse_chronological(left), parse_chronological(right)) {
                return a.cmp(&b);
            }
        }
        OrderingClass::Textual => {}
    }
    compare_text(left, right)
}

fn compare_text(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase))
}

/// Equality used by the combine classifier: chronological columns treat
/// differently-formatted spellings of the same instant as equal; everything
/// else compares exactly as stored.
pub fn values_equal(left: &str, right: &str, class: OrderingClass) -> bool {
    if class == OrderingClass::Chronological {
        if let (Some(a), Some(b)) = (parse_chronological(left), parse_chronological(right)) {
            return a == b;
        }
    }
    left == right
}
