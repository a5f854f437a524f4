//! Raw row to [`StoryRecord`] normalization.
//!
//! Sheets come from different tools, so each field is looked up under several
//! header spellings and the first non-empty cell wins.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::{RawRow, RawValue};
use crate::models::{Priority, StoryRecord, StoryStatus, UNASSIGNED};

/// Header aliases, checked in order.
pub mod columns {
    pub const ID: &[&str] = &["id", "ID", "Id"];
    pub const DESCRIPTION: &[&str] = &["description", "Description"];
    pub const EPIC: &[&str] = &["epicDescription", "epic_description", "Epic Description"];
    pub const PROJECT: &[&str] = &[
        "projectDescription",
        "project_description",
        "Project Description",
    ];
    pub const DUE_DATE: &[&str] = &["dueDate", "due_date", "Due Date"];
    pub const DURATION: &[&str] = &["duration", "Duration"];
    pub const TIME_SPENT: &[&str] = &["timeSpent", "time_spent", "Time Spent"];
    pub const STATUS: &[&str] = &["status", "Status"];
    pub const PRIORITY: &[&str] = &["priority", "Priority"];
}

const TEXT_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Build a story from one sheet row.
pub fn normalize_row(row: &RawRow) -> StoryRecord {
    StoryRecord {
        id: first_present(row, columns::ID)
            .map(value_to_text)
            .unwrap_or_default(),
        description: first_present(row, columns::DESCRIPTION)
            .map(value_to_text)
            .unwrap_or_default(),
        epic_description: first_present(row, columns::EPIC)
            .map(value_to_text)
            .unwrap_or_else(|| UNASSIGNED.to_string()),
        project_description: first_present(row, columns::PROJECT)
            .map(value_to_text)
            .unwrap_or_else(|| UNASSIGNED.to_string()),
        due_date: first_present(row, columns::DUE_DATE).and_then(value_to_date),
        duration: first_present(row, columns::DURATION).map_or(0.0, value_to_hours),
        time_spent: first_present(row, columns::TIME_SPENT).map_or(0.0, value_to_hours),
        status: first_present(row, columns::STATUS)
            .map(|v| StoryStatus::parse(&value_to_text(v)))
            .unwrap_or_default(),
        priority: first_present(row, columns::PRIORITY)
            .map(|v| Priority::parse(&value_to_text(v)))
            .unwrap_or_default(),
    }
}

fn first_present<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a RawValue> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .find(|value| !value.is_empty())
}

fn value_to_text(value: &RawValue) -> String {
    match value {
        RawValue::Text(s) => s.trim().to_string(),
        RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        RawValue::Number(n) => n.to_string(),
        RawValue::Date(d) => d.to_rfc3339(),
        RawValue::Empty => String::new(),
    }
}

/// Coerce an effort cell to hours. Unparsable, negative, and non-finite input
/// becomes 0.
fn value_to_hours(value: &RawValue) -> f64 {
    let hours = match value {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => parse_leading_number(s).unwrap_or_else(|| {
            tracing::debug!(value = %s, "unparsable effort value, using 0");
            0.0
        }),
        RawValue::Date(_) | RawValue::Empty => 0.0,
    };
    if hours.is_finite() && hours > 0.0 { hours } else { 0.0 }
}

/// Parse the longest numeric prefix, so "12h" and "3.5 hours" both work.
pub fn parse_leading_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || ((*c == '-' || *c == '+') && *i == 0))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    (1..=end)
        .rev()
        .find_map(|len| trimmed[..len].parse::<f64>().ok())
}

fn value_to_date(value: &RawValue) -> Option<DateTime<Utc>> {
    match value {
        RawValue::Date(d) => Some(*d),
        RawValue::Number(serial) => serial_to_date(*serial),
        RawValue::Text(s) => parse_date_text(s),
        RawValue::Empty => None,
    }
}

/// Serial day number of 9999-12-31, the last date a spreadsheet can hold.
pub const MAX_SERIAL: f64 = 2_958_465.0;

/// Convert a spreadsheet serial day number to a UTC midnight.
///
/// The epoch is 1899-12-30, which is exact from serial 61 (1900-03-01) on
/// because of the phantom 1900-02-29. The time-of-day fraction is dropped.
pub fn serial_to_date(serial: f64) -> Option<DateTime<Utc>> {
    if !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::try_days(serial.floor() as i64)?)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Parse a textual date. Anything without an explicit offset is taken as UTC.
pub fn parse_date_text(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in TEXT_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in TEXT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    tracing::debug!(value = %trimmed, "unrecognized due date");
    None
}
