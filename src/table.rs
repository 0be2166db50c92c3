//! Elastic console tables for record sets and dictionaries.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::data::OrderingClass;

/// Per-column display alignment. Numeric columns read better flush right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

impl From<OrderingClass> for Alignment {
    fn from(class: OrderingClass) -> Self {
        match class {
            OrderingClass::Numeric => Alignment::Right,
            _ => Alignment::Left,
        }
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    render_aligned_table(headers, rows, &[])
}

/// Renders rows under headers with elastic column widths. `alignments`
/// may be shorter than the header list; unlisted columns align left.
pub fn render_aligned_table(
    headers: &[String],
    rows: &[Vec<String>],
    alignments: &[Alignment],
) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(sanitize_cell(cell).chars().count());
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, alignments));

    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &[]));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, alignments));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

pub fn print_aligned_table(headers: &[String], rows: &[Vec<String>], alignments: &[Alignment]) {
    print!("{}", render_aligned_table(headers, rows, alignments));
}

fn format_row(values: &[String], widths: &[usize], alignments: &[Alignment]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        let Some(width) = widths.get(idx).copied() else {
            break;
        };
        let sanitized = sanitize_cell(value);
        let padding = width.saturating_sub(sanitized.chars().count());
        let alignment = alignments.get(idx).copied().unwrap_or(Alignment::Left);
        let mut cell = String::with_capacity(width);
        match alignment {
            Alignment::Left => {
                cell.push_str(sanitized.as_ref());
                cell.push_str(&" ".repeat(padding));
            }
            Alignment::Right => {
                cell.push_str(&" ".repeat(padding));
                cell.push_str(sanitized.as_ref());
            }
        }
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(
            value
                .chars()
                .map(|ch| match ch {
                    '\n' | '\r' | '\t' => ' ',
                    other => other,
                })
                .collect(),
        )
    } else {
        Cow::Borrowed(value)
    }
}
