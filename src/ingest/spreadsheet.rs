//! Excel story sheets (`.xlsx`, `.xls`). Only the first worksheet is read.

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

use super::normalize::serial_to_date;
use super::{RawRow, RawValue};
use crate::{Error, Result};

/// Read workbook bytes into raw rows keyed by the first row's headers.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::InvalidInput("Workbook contains no worksheets".to_string()))??;

    let mut lines = range.rows();
    let headers: Vec<String> = match lines.next() {
        Some(cells) => cells.iter().map(header_text).collect(),
        None => return Ok(Vec::new()),
    };

    let rows = lines
        .map(|cells| -> RawRow {
            headers
                .iter()
                .zip(cells.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, cell)| (header.clone(), cell_to_value(cell)))
                .collect()
        })
        .filter(|row| !row.values().all(RawValue::is_empty))
        .collect();

    Ok(rows)
}

fn cell_to_value(cell: &Data) -> RawValue {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) => RawValue::Text(s.clone()),
        Data::Float(f) => RawValue::Number(*f),
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Bool(b) => RawValue::Text(b.to_string()),
        Data::DateTime(dt) => serial_to_date(dt.as_f64()).map_or(RawValue::Empty, RawValue::Date),
        _ => RawValue::Empty,
    }
}

fn header_text(cell: &Data) -> String {
    match cell_to_value(cell) {
        RawValue::Text(s) => s.trim().to_string(),
        RawValue::Number(n) => n.to_string(),
        RawValue::Date(d) => d.to_rfc3339(),
        RawValue::Empty => String::new(),
    }
}
