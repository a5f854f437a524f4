//! Data models for storyboard.
//!
//! This module defines the core data structures:
//! - `StoryRecord` - A normalized row from an uploaded story sheet
//! - `StoryStatus` / `Priority` - Canonicalized workflow fields
//! - `AnalyzedStory` - A story annotated with computed metrics for one bucket
//! - `AnalysisReport` - The bucketed operational view plus summary counts
//! - `StoredAnalysis` - A report as persisted by the analysis job

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouping key used when a story has no epic or project.
pub const UNASSIGNED: &str = "Unassigned";

/// Workflow status of a story.
///
/// Serialized as the canonical sheet label ("To Do", "In progress", ...).
/// Free text that does not match a known status is kept verbatim in
/// [`StoryStatus::Other`]; such stories are never active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StoryStatus {
    #[default]
    ToDo,
    InProgress,
    InTest,
    InDeploy,
    Closed,
    Rejected,
    WontDo,
    Reopen,
    Other(String),
}

impl StoryStatus {
    /// Canonicalize a free-text status, case-insensitive.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "todo" | "to do" => Self::ToDo,
            "inprogress" | "in progress" => Self::InProgress,
            "intest" | "in test" => Self::InTest,
            "indeploy" | "in deploy" => Self::InDeploy,
            "closed" => Self::Closed,
            "rejected" => Self::Rejected,
            "wontdo" | "won't do" => Self::WontDo,
            "reopen" => Self::Reopen,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Canonical label as it appears in story sheets.
    pub fn label(&self) -> &str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In progress",
            Self::InTest => "In test",
            Self::InDeploy => "In deploy",
            Self::Closed => "Closed",
            Self::Rejected => "Rejected",
            Self::WontDo => "Won't do",
            Self::Reopen => "Reopen",
            Self::Other(label) => label,
        }
    }

    /// Whether a story in this status still needs work.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::ToDo | Self::InProgress | Self::InTest | Self::InDeploy | Self::Reopen
        )
    }

    /// Whether work on the story has started and not yet finished.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InProgress | Self::InTest | Self::InDeploy)
    }
}

impl From<String> for StoryStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<StoryStatus> for String {
    fn from(status: StoryStatus) -> Self {
        status.label().to_string()
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Story priority. Unrecognized input canonicalizes to `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Canonicalize a free-text priority, case-insensitive.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "h" | "high" => Self::High,
            "l" | "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn unassigned() -> String {
    UNASSIGNED.to_string()
}

/// A normalized story row, immutable for the duration of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
    /// Identifier from the sheet (empty when the row had none)
    #[serde(default)]
    pub id: String,

    /// Story description
    #[serde(default)]
    pub description: String,

    /// Epic grouping key
    #[serde(default = "unassigned")]
    pub epic_description: String,

    /// Project grouping key
    #[serde(default = "unassigned")]
    pub project_description: String,

    /// Deadline; absent means no deadline
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    /// Estimated effort in hours
    #[serde(default)]
    pub duration: f64,

    /// Effort consumed so far in hours
    #[serde(default)]
    pub time_spent: f64,

    #[serde(default)]
    pub status: StoryStatus,

    #[serde(default)]
    pub priority: Priority,
}

impl StoryRecord {
    /// Create a new to-do story with the given ID and description.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            epic_description: unassigned(),
            project_description: unassigned(),
            due_date: None,
            duration: 0.0,
            time_spent: 0.0,
            status: StoryStatus::default(),
            priority: Priority::default(),
        }
    }

    pub fn with_status(mut self, status: StoryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Set estimated and spent hours.
    pub fn with_effort(mut self, duration: f64, time_spent: f64) -> Self {
        self.duration = duration;
        self.time_spent = time_spent;
        self
    }

    pub fn with_epic(mut self, epic: impl Into<String>) -> Self {
        self.epic_description = epic.into();
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project_description = project.into();
        self
    }
}

/// A story plus the metrics computed for the bucket it landed in.
///
/// Which optional fields are present depends on the bucket:
/// overdue stories carry `days_overdue` and `urgency_score`, at-risk and
/// need-to-start stories carry `days_until_due` and `urgency_score`, and
/// in-progress stories carry `days_until_due` and `progress_percentage`.
/// `days_until_due` is omitted for stories without a deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedStory {
    #[serde(flatten)]
    pub story: StoryRecord,

    /// Hours of estimated work left (never negative)
    pub remaining_hours: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_due: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_overdue: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency_score: Option<f64>,

    /// Spent / estimated effort in percent, one decimal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<f64>,
}

impl AnalyzedStory {
    /// Urgency used for ranking; unscored stories rank last.
    pub fn urgency(&self) -> f64 {
        self.urgency_score.unwrap_or(0.0)
    }
}

/// Counts describing one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_active: usize,
    pub overdue_count: usize,
    pub at_risk_count: usize,
    pub in_progress_count: usize,
    pub to_do_count: usize,
}

/// The bucketed operational view of a story batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Active stories past their due date, most urgent first
    pub overdue: Vec<AnalyzedStory>,

    /// Active stories likely to miss their due date, most urgent first
    pub at_risk: Vec<AnalyzedStory>,

    /// Recommended unstarted stories, most urgent first
    pub need_to_start: Vec<AnalyzedStory>,

    /// Stories in progress, test, or deploy, in input order
    pub in_progress: Vec<AnalyzedStory>,

    pub summary: AnalysisSummary,
}

/// An analysis report as saved by the analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    /// When the analysis ran
    pub timestamp: DateTime<Utc>,

    /// Upload the stories were read from
    pub source_file: String,

    pub analysis: AnalysisReport,
}
