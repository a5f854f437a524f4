//! Story listing, lookup and grouping.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::analyze::file_name_of;
use super::{Output, to_json_string};
use crate::ingest;
use crate::models::StoryRecord;
use crate::storage::Storage;
use crate::{Error, Result};

pub const STORY_NOT_FOUND_MESSAGE: &str = "Story not found";

/// Read stories from `file`, or from the most recent upload when `None`.
///
/// Returns the source file name alongside the stories.
pub fn load_stories(storage: &Storage, file: Option<&Path>) -> Result<(String, Vec<StoryRecord>)> {
    match file {
        Some(path) => {
            let file_name = file_name_of(path)?;
            let bytes = fs::read(path)?;
            let stories = ingest::parse_file(&bytes, &file_name)?;
            Ok((file_name, stories))
        }
        None => {
            let latest = storage.latest_upload()?;
            let bytes = storage.read_upload(&latest.key)?;
            let stories = ingest::parse_file(&bytes, &latest.key)?;
            Ok((latest.key, stories))
        }
    }
}

/// All stories from one source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryList {
    pub source_file: String,
    pub count: usize,
    pub stories: Vec<StoryRecord>,
}

impl Output for StoryList {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        if self.stories.is_empty() {
            return format!("No stories in {}.", self.source_file);
        }
        let mut lines = vec![format!("{} stories in {}:", self.count, self.source_file)];
        lines.extend(self.stories.iter().map(|story| format!("  {}", summary_line(story))));
        lines.join("\n")
    }
}

pub fn list_stories(storage: &Storage, file: Option<&Path>) -> Result<StoryList> {
    let (source_file, stories) = load_stories(storage, file)?;
    Ok(StoryList {
        source_file,
        count: stories.len(),
        stories,
    })
}

/// One story and the file it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDetail {
    pub source_file: String,
    pub story: StoryRecord,
}

impl Output for StoryDetail {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let s = &self.story;
        let due = s
            .due_date
            .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        [
            format!("{} {}", s.id, s.description),
            format!("  Project:  {}", s.project_description),
            format!("  Epic:     {}", s.epic_description),
            format!("  Status:   {}", s.status),
            format!("  Priority: {}", s.priority),
            format!("  Due:      {}", due),
            format!("  Effort:   {}h spent of {}h", s.time_spent, s.duration),
            format!("  Source:   {}", self.source_file),
        ]
        .join("\n")
    }
}

/// Find a story by exact id. The first match wins if ids repeat.
pub fn show_story(storage: &Storage, file: Option<&Path>, id: &str) -> Result<StoryDetail> {
    let (source_file, stories) = load_stories(storage, file)?;
    let story = stories
        .into_iter()
        .find(|story| story.id == id)
        .ok_or_else(|| Error::NotFound(STORY_NOT_FOUND_MESSAGE.to_string()))?;
    Ok(StoryDetail { source_file, story })
}

/// Stories grouped by project or epic.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryGroups {
    pub source_file: String,
    /// "project" or "epic"
    pub grouped_by: &'static str,
    pub groups: BTreeMap<String, Vec<StoryRecord>>,
}

impl Output for StoryGroups {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        if self.groups.is_empty() {
            return format!("No stories in {}.", self.source_file);
        }
        let mut lines = Vec::new();
        for (name, stories) in &self.groups {
            lines.push(format!("{} ({}):", name, stories.len()));
            lines.extend(stories.iter().map(|story| format!("  {}", summary_line(story))));
        }
        lines.join("\n")
    }
}

pub fn stories_by_project(storage: &Storage, file: Option<&Path>) -> Result<StoryGroups> {
    let (source_file, stories) = load_stories(storage, file)?;
    Ok(StoryGroups {
        source_file,
        grouped_by: "project",
        groups: ingest::group_by_project(&stories),
    })
}

pub fn stories_by_epic(storage: &Storage, file: Option<&Path>) -> Result<StoryGroups> {
    let (source_file, stories) = load_stories(storage, file)?;
    Ok(StoryGroups {
        source_file,
        grouped_by: "epic",
        groups: ingest::group_by_epic(&stories),
    })
}

fn summary_line(story: &StoryRecord) -> String {
    let due = story
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "no due date".to_string());
    format!(
        "{} [{}] {} ({}, {})",
        story.id, story.status, story.description, story.priority, due
    )
}
