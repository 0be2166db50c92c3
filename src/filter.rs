//! Record predicates: field conditions composable with and/or logic.
//!
//! Filters stay plain data until applied: the operator token is validated at
//! evaluation time, and an unknown column or operator surfaces there as an
//! error rather than at construction. Compound filters evaluate children
//! left to right with short-circuit.

use std::cmp::Ordering;

use anyhow::{Result, anyhow};

use crate::{data::compare_values, definition::RecordDefinition, record::Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
}

impl ComparisonOperator {
    /// Resolves an operator token. Called when a filter is applied, so an
    /// invalid token is an evaluation-time error.
    pub fn resolve(token: &str) -> Result<Self> {
        match token.to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::NotEq),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            "contains" => Ok(Self::Contains),
            "startswith" => Ok(Self::StartsWith),
            "endswith" => Ok(Self::EndsWith),
            other => Err(anyhow!("Invalid filter operator '{other}'")),
        }
    }
}

/// A predicate over one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Compares one (alias-resolvable) column against a literal. The
    /// operator is kept as its raw token; see [`ComparisonOperator::resolve`].
    Field {
        column: String,
        operator: String,
        value: String,
    },
    /// True iff every child accepts; empty accepts.
    AllOf(Vec<Filter>),
    /// True iff any child accepts; empty rejects.
    AnyOf(Vec<Filter>),
}

impl Filter {
    pub fn accepts(&self, record: &Record, definition: &RecordDefinition) -> Result<bool> {
        match self {
            Filter::Field {
                column,
                operator,
                value,
            } => {
                let operator = ComparisonOperator::resolve(operator)?;
                let index = definition
                    .column_number(column)
                    .ok_or_else(|| anyhow!("Column '{column}' not found for filter"))?;
                let actual = record.field(index).unwrap_or_default();
                Ok(evaluate(
                    operator,
                    actual,
                    value,
                    definition.ordering_class(index),
                ))
            }
            Filter::AllOf(children) => {
                for child in children {
                    if !child.accepts(record, definition)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::AnyOf(children) => {
                for child in children {
                    if child.accepts(record, definition)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn evaluate(
    operator: ComparisonOperator,
    actual: &str,
    expected: &str,
    class: crate::data::OrderingClass,
) -> bool {
    use ComparisonOperator::*;
    match operator {
        Contains => actual.contains(expected),
        StartsWith => actual.starts_with(expected),
        EndsWith => actual.ends_with(expected),
        Eq | NotEq | Gt | Ge | Lt | Le => {
            let ordering = compare_values(actual, expected, class);
            match operator {
                Eq => ordering == Ordering::Equal,
                NotEq => ordering != Ordering::Equal,
                Gt => ordering == Ordering::Greater,
                Ge => ordering != Ordering::Less,
                Lt => ordering == Ordering::Less,
                Le => ordering != Ordering::Greater,
                _ => unreachable!(),
            }
        }
    }
}

/// Parses one textual filter expression such as `amount>=100`,
/// `status = "Open"`, or `name contains smith` into a field filter.
pub fn parse_filter(filter: &str) -> Result<Filter> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty filter expression"));
    }

    let lowered = trimmed.to_ascii_lowercase();
    for needle in [" contains ", " startswith ", " endswith "] {
        if let Some(idx) = lowered.find(needle) {
            let (left, right_with_space) = trimmed.split_at(idx);
            let right = right_with_space[needle.len()..].trim();
            return Ok(Filter::Field {
                column: left.trim().to_string(),
                operator: needle.trim().to_string(),
                value: unquote(right).to_string(),
            });
        }
    }

    for needle in ["!=", ">=", "<=", "<>", "=", ">", "<"] {
        if let Some(idx) = trimmed.find(needle) {
            let left = trimmed[..idx].trim();
            let right = trimmed[idx + needle.len()..].trim();
            return Ok(Filter::Field {
                column: left.to_string(),
                operator: needle.to_string(),
                value: unquote(right).to_string(),
            });
        }
    }

    Err(anyhow!("Failed to parse filter expression '{trimmed}'"))
}

/// Parses a list of expressions into one all-of filter (or the single
/// filter when only one expression is given).
pub fn parse_filters(filters: &[String]) -> Result<Option<Filter>> {
    let mut parsed = filters
        .iter()
        .map(|f| parse_filter(f))
        .collect::<Result<Vec<_>>>()?;
    Ok(match parsed.len() {
        0 => None,
        1 => Some(parsed.remove(0)),
        _ => Some(Filter::AllOf(parsed)),
    })
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}
