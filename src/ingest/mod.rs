//! Story sheet ingestion.
//!
//! Turns uploaded CSV or Excel bytes into canonical [`StoryRecord`]s ready for
//! the classifier:
//! - `delimited` - CSV reader
//! - `spreadsheet` - Excel reader (first worksheet)
//! - `normalize` - header aliasing and value coercion

pub mod delimited;
pub mod normalize;
pub mod spreadsheet;

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::models::{StoryRecord, UNASSIGNED};
use crate::{Error, Result};

pub use normalize::normalize_row;

/// File extensions accepted for upload, with the leading dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".csv", ".xlsx", ".xls"];

/// Maximum number of validation errors reported for one file.
pub const MAX_VALIDATION_ERRORS: usize = 10;

/// A single cell before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Empty,
}

impl RawValue {
    /// Blank text counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Empty => true,
            RawValue::Number(_) | RawValue::Date(_) => false,
        }
    }
}

/// One sheet row keyed by header.
pub type RawRow = HashMap<String, RawValue>;

/// Supported story sheet formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Excel,
}

impl SheetFormat {
    /// Detect the format from a file name's extension, case-insensitive.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = extension_of(file_name);
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xls" => Ok(Self::Excel),
            _ => Err(Error::UnsupportedFormat(extension)),
        }
    }
}

/// Lower-cased extension without the dot (empty if none).
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

/// Parse sheet bytes into stories, choosing the reader by file extension.
pub fn parse_file(bytes: &[u8], file_name: &str) -> Result<Vec<StoryRecord>> {
    let rows = match SheetFormat::from_file_name(file_name)? {
        SheetFormat::Csv => delimited::read_rows(bytes)?,
        SheetFormat::Excel => spreadsheet::read_rows(bytes)?,
    };

    let stories: Vec<StoryRecord> = rows.iter().map(normalize_row).collect();
    tracing::debug!(file = %file_name, count = stories.len(), "parsed story sheet");
    Ok(stories)
}

/// Check rows for the fields an operational view depends on.
///
/// Returns messages like `Row 3: Missing ID`, with 1-based row numbers, in
/// row order. An empty vector means the batch is valid.
pub fn validate_stories(stories: &[StoryRecord]) -> Vec<String> {
    let mut errors = Vec::new();
    for (index, story) in stories.iter().enumerate() {
        let row = index + 1;
        if story.id.trim().is_empty() {
            errors.push(format!("Row {}: Missing ID", row));
        }
        if story.description.trim().is_empty() {
            errors.push(format!("Row {}: Missing description", row));
        }
        if story.due_date.is_none() {
            errors.push(format!("Row {}: Missing or invalid due date", row));
        }
    }
    errors
}

/// Group stories by project, preserving row order within each group.
pub fn group_by_project(stories: &[StoryRecord]) -> BTreeMap<String, Vec<StoryRecord>> {
    group_by(stories, |story| &story.project_description)
}

/// Group stories by epic, preserving row order within each group.
pub fn group_by_epic(stories: &[StoryRecord]) -> BTreeMap<String, Vec<StoryRecord>> {
    group_by(stories, |story| &story.epic_description)
}

fn group_by<F>(stories: &[StoryRecord], key: F) -> BTreeMap<String, Vec<StoryRecord>>
where
    F: Fn(&StoryRecord) -> &String,
{
    let mut groups: BTreeMap<String, Vec<StoryRecord>> = BTreeMap::new();
    for story in stories {
        let raw = key(story).trim();
        let group = if raw.is_empty() { UNASSIGNED } else { raw };
        groups.entry(group.to_string()).or_default().push(story.clone());
    }
    groups
}
