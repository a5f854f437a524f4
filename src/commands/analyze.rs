//! The analysis job: latest upload in, bucketed report out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Output, to_json_string};
use crate::analysis::classify;
use crate::ingest;
use crate::models::{AnalysisReport, AnalyzedStory, StoredAnalysis, StoryRecord};
use crate::storage::Storage;
use crate::{Error, Result};

/// Message reported when no analysis has been saved yet.
pub const NO_ANALYSIS_MESSAGE: &str = "No analysis found. Run analysis first.";

/// Result of one analysis run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRun {
    #[serde(flatten)]
    pub analysis: StoredAnalysis,

    /// Number of rows read from the source file
    pub stories_count: usize,

    /// Where the result was written, if it was saved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<PathBuf>,
}

impl AnalysisRun {
    pub fn report(&self) -> &AnalysisReport {
        &self.analysis.analysis
    }
}

impl Output for AnalysisRun {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = render_header(&self.analysis);
        let _ = writeln!(out, "Stories read: {}", self.stories_count);
        if let Some(ref path) = self.saved_to {
            let _ = writeln!(out, "Saved to: {}", path.display());
        }
        out.push('\n');
        out.push_str(&render_report(self.report()));
        out
    }
}

impl Output for StoredAnalysis {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = render_header(self);
        out.push('\n');
        out.push_str(&render_report(&self.analysis));
        out
    }
}

/// Classify stories and wrap them as a run from `source_file`.
pub(crate) fn analyze_stories(
    stories: &[StoryRecord],
    source_file: String,
    now: DateTime<Utc>,
) -> AnalysisRun {
    let report = classify(stories, now);
    tracing::info!(
        source = %source_file,
        stories = stories.len(),
        active = report.summary.total_active,
        overdue = report.summary.overdue_count,
        at_risk = report.summary.at_risk_count,
        "analysis complete"
    );
    AnalysisRun {
        analysis: StoredAnalysis {
            timestamp: now,
            source_file,
            analysis: report,
        },
        stories_count: stories.len(),
        saved_to: None,
    }
}

/// Save a run's report to the results directory.
pub(crate) fn save_run(storage: &Storage, run: &mut AnalysisRun) -> Result<()> {
    run.saved_to = Some(storage.save_analysis(&run.analysis)?);
    Ok(())
}

/// Analyze the most recent upload without saving the result.
pub fn analyze_upload(storage: &Storage, now: DateTime<Utc>) -> Result<AnalysisRun> {
    let latest = storage.latest_upload()?;
    tracing::info!(source = %latest.key, "analyzing latest upload");
    let bytes = storage.read_upload(&latest.key)?;
    let stories = ingest::parse_file(&bytes, &latest.key)?;
    Ok(analyze_stories(&stories, latest.key, now))
}

/// Run the analysis job: analyze the most recent upload and save the report.
pub fn run_analysis(storage: &Storage, now: DateTime<Utc>) -> Result<AnalysisRun> {
    let mut run = analyze_upload(storage, now)?;
    save_run(storage, &mut run)?;
    Ok(run)
}

/// Analyze a local story sheet without touching storage.
pub fn analyze_file(path: &Path, now: DateTime<Utc>) -> Result<AnalysisRun> {
    let bytes = fs::read(path)?;
    let file_name = file_name_of(path)?;
    let stories = ingest::parse_file(&bytes, &file_name)?;
    Ok(analyze_stories(&stories, file_name, now))
}

/// The most recently saved analysis.
pub fn report(storage: &Storage) -> Result<StoredAnalysis> {
    storage
        .latest_analysis()?
        .ok_or_else(|| Error::NotFound(NO_ANALYSIS_MESSAGE.to_string()))
}

pub(crate) fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("Not a file path: {}", path.display())))
}

fn render_header(analysis: &StoredAnalysis) -> String {
    format!(
        "Analysis of {} at {}\n",
        analysis.source_file,
        analysis.timestamp.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Render a report as plain text, one section per bucket.
pub fn render_report(report: &AnalysisReport) -> String {
    let s = &report.summary;
    let mut out = format!(
        "Active: {}  Overdue: {}  At risk: {}  In progress: {}  To do: {}\n",
        s.total_active, s.overdue_count, s.at_risk_count, s.in_progress_count, s.to_do_count
    );

    write_bucket(&mut out, "Overdue", &report.overdue, |story| {
        format!(
            "{} days overdue, urgency {:.1}",
            story.days_overdue.unwrap_or_default(),
            story.urgency()
        )
    });
    write_bucket(&mut out, "At risk", &report.at_risk, |story| {
        format!(
            "{}, {:.1}h left, urgency {:.1}",
            due_phrase(story),
            story.remaining_hours,
            story.urgency()
        )
    });
    write_bucket(&mut out, "Need to start", &report.need_to_start, |story| {
        format!("{}, urgency {:.1}", due_phrase(story), story.urgency())
    });
    write_bucket(&mut out, "In progress", &report.in_progress, |story| {
        format!(
            "{:.1}% done, {}",
            story.progress_percentage.unwrap_or_default(),
            due_phrase(story)
        )
    });

    out.trim_end().to_string()
}

fn write_bucket<F>(out: &mut String, title: &str, stories: &[AnalyzedStory], detail: F)
where
    F: Fn(&AnalyzedStory) -> String,
{
    let _ = writeln!(out, "\n{} ({}):", title, stories.len());
    if stories.is_empty() {
        out.push_str("  (none)\n");
        return;
    }
    for analyzed in stories {
        let story = &analyzed.story;
        let _ = writeln!(
            out,
            "  {} [{}] {} - {}",
            story.id,
            story.priority,
            story.description,
            detail(analyzed)
        );
    }
}

fn due_phrase(story: &AnalyzedStory) -> String {
    match story.days_until_due {
        Some(1) => "due in 1 day".to_string(),
        Some(days) if days > 0 => format!("due in {} days", days),
        Some(_) => "due now".to_string(),
        None => "no due date".to_string(),
    }
}
