//! CSV story sheets.

use super::RawRow;
use super::RawValue;
use crate::Result;

const UTF8_BOM: &str = "\u{feff}";

/// Read CSV bytes into raw rows keyed by header.
///
/// Row lengths may vary; missing trailing cells are simply absent and extra
/// cells without a header are dropped. Rows with no content are skipped.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches(UTF8_BOM) } else { h };
            h.trim().to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), RawValue::Text(cell.to_string())))
            .collect();

        if row.values().all(RawValue::is_empty) {
            continue;
        }
        rows.push(row);
    }

    Ok(rows)
}
