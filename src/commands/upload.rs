//! Upload and validation of story sheets.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use super::analyze::{analyze_stories, file_name_of, save_run};
use super::{Output, to_json_string};
use crate::config::resolver::DEFAULT_MAX_UPLOAD_BYTES;
use crate::ingest::{self, MAX_VALIDATION_ERRORS, SheetFormat};
use crate::models::{AnalysisSummary, StoryRecord};
use crate::storage::{Storage, UploadedFile};
use crate::{Error, Result};

/// Stories shown back after a successful validation.
pub const VALIDATION_SAMPLE_SIZE: usize = 3;

pub const NO_STORIES_MESSAGE: &str = "File contains no valid stories";

/// Options for storing an upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadOptions {
    /// Largest accepted file, in bytes
    pub max_bytes: usize,
    /// Run the analysis job after storing
    pub analyze: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            analyze: true,
        }
    }
}

/// Result of an upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[serde(flatten)]
    pub file: UploadedFile,

    pub stories_count: usize,

    /// Summary of the analysis run triggered by the upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisSummary>,
}

impl Output for UploadResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Uploaded {} ({} stories)", self.file.file_name, self.stories_count),
            format!("  Location: {}", self.file.location),
            format!("  Size: {} bytes", self.file.size_bytes),
            format!("  SHA-256: {}", self.file.checksum),
        ];
        if let Some(ref summary) = self.analysis {
            lines.push(format!(
                "  Analysis: {} active, {} overdue, {} at risk, {} in progress",
                summary.total_active,
                summary.overdue_count,
                summary.at_risk_count,
                summary.in_progress_count
            ));
        }
        lines.join("\n")
    }
}

/// Check, store, and (optionally) analyze an uploaded story sheet.
///
/// The file is rejected before anything is stored if its extension is not a
/// supported sheet format, it exceeds the size limit, it fails to parse, or
/// it has no rows.
pub fn upload_bytes(
    storage: &mut Storage,
    bytes: &[u8],
    file_name: &str,
    options: UploadOptions,
    now: DateTime<Utc>,
) -> Result<UploadResult> {
    SheetFormat::from_file_name(file_name)?;
    if bytes.len() > options.max_bytes {
        return Err(Error::InvalidInput(format!(
            "File too large: {} bytes (limit {} bytes)",
            bytes.len(),
            options.max_bytes
        )));
    }

    let stories = ingest::parse_file(bytes, file_name)?;
    if stories.is_empty() {
        return Err(Error::InvalidInput(NO_STORIES_MESSAGE.to_string()));
    }
    tracing::info!(file = %file_name, count = stories.len(), "parsed upload");

    let file = storage.store_upload(bytes, file_name, now)?;

    let analysis = if options.analyze {
        let mut run = analyze_stories(&stories, file.file_name.clone(), now);
        save_run(storage, &mut run)?;
        Some(run.analysis.analysis.summary)
    } else {
        None
    };

    Ok(UploadResult {
        file,
        stories_count: stories.len(),
        analysis,
    })
}

/// Upload a local file.
pub fn upload(
    storage: &mut Storage,
    path: &Path,
    options: UploadOptions,
    now: DateTime<Utc>,
) -> Result<UploadResult> {
    let file_name = file_name_of(path)?;
    let bytes = fs::read(path)?;
    upload_bytes(storage, &bytes, &file_name, options, now)
}

/// Result of a successful validation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub stories_count: usize,
    /// First few stories, as parsed
    pub sample: Vec<StoryRecord>,
}

impl Output for ValidationResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Valid: {} stories", self.stories_count)];
        for story in &self.sample {
            lines.push(format!(
                "  {} [{}] {} ({})",
                story.id, story.status, story.description, story.project_description
            ));
        }
        lines.join("\n")
    }
}

/// Validate sheet bytes without storing them.
///
/// Fails with [`Error::Validation`] carrying at most
/// [`MAX_VALIDATION_ERRORS`] row messages.
pub fn validate_bytes(bytes: &[u8], file_name: &str) -> Result<ValidationResult> {
    let stories = ingest::parse_file(bytes, file_name)?;
    let errors = ingest::validate_stories(&stories);
    if !errors.is_empty() {
        tracing::debug!(file = %file_name, errors = errors.len(), "validation failed");
        return Err(Error::Validation(
            errors.into_iter().take(MAX_VALIDATION_ERRORS).collect(),
        ));
    }

    Ok(ValidationResult {
        stories_count: stories.len(),
        sample: stories.into_iter().take(VALIDATION_SAMPLE_SIZE).collect(),
    })
}

/// Validate a local file.
pub fn validate(path: &Path) -> Result<ValidationResult> {
    let file_name = file_name_of(path)?;
    let bytes = fs::read(path)?;
    validate_bytes(&bytes, &file_name)
}
