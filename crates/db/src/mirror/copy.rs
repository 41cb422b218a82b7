//! Encoder for the Postgres `COPY ... FROM STDIN` text format.
//!
//! Columns are tab separated, rows newline terminated, null is `\N`, and
//! backslash, tab, newline and carriage return are backslash escaped.

use std::fmt::Write as _;

use chrono::SecondsFormat;

use super::models::{CellValue, StagedRow};

const NULL_MARKER: &str = "\\N";

/// Encode rows as one `COPY` text payload: key column first, then cells.
pub fn encode_rows(rows: &[StagedRow]) -> Vec<u8> {
    let mut out = String::with_capacity(rows.len() * 64);
    for row in rows {
        escape_into(&mut out, &row.key);
        for cell in &row.cells {
            out.push('\t');
            write_cell(&mut out, cell);
        }
        out.push('\n');
    }
    out.into_bytes()
}

fn write_cell(out: &mut String, cell: &CellValue) {
    match cell {
        CellValue::Null => out.push_str(NULL_MARKER),
        CellValue::Text(s) => escape_into(out, s),
        CellValue::Amount(d) => {
            let _ = write!(out, "{d}");
        }
        CellValue::Timestamp(ts) => {
            out.push_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true));
        }
    }
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
}
