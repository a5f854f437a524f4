//! Aggregation of a story batch into the operational buckets.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::metrics::{days_until_due, progress_percentage, remaining_effort};
use super::scoring::{is_at_risk, urgency_score};
use crate::models::{AnalysisReport, AnalysisSummary, AnalyzedStory, StoryRecord, StoryStatus};

/// Maximum number of stories recommended in `need_to_start`.
pub const NEED_TO_START_LIMIT: usize = 10;

/// Classify a story batch at the given instant.
///
/// Terminal-status stories are ignored. Among active stories:
/// - `overdue`: due date passed
/// - `at_risk`: not overdue, remaining effort meets or exceeds the days left
/// - `need_to_start`: to-do stories in neither of the above, top
///   [`NEED_TO_START_LIMIT`] by urgency
/// - `in_progress`: in progress, test, or deploy, regardless of the above
///
/// Ranked buckets are sorted by urgency descending with a stable sort, so ties
/// keep input order. Stories with negative or non-finite effort figures are
/// skipped.
pub fn classify(stories: &[StoryRecord], now: DateTime<Utc>) -> AnalysisReport {
    let active: Vec<&StoryRecord> = stories
        .iter()
        .filter(|story| story.status.is_active())
        .filter(|story| {
            let conforming = is_conforming(story);
            if !conforming {
                tracing::warn!(
                    id = %story.id,
                    duration = story.duration,
                    time_spent = story.time_spent,
                    "skipping story with invalid effort figures"
                );
            }
            conforming
        })
        .collect();

    // Membership is tracked by position in `active`, which stays correct even
    // when a malformed sheet repeats an id.
    let mut overdue_idx = HashSet::new();
    let mut at_risk_idx = HashSet::new();

    let mut overdue = Vec::new();
    let mut at_risk = Vec::new();

    for (idx, story) in active.iter().enumerate() {
        let days = days_until_due(story, now);
        if days.is_overdue() {
            overdue_idx.insert(idx);
            overdue.push(AnalyzedStory {
                story: (*story).clone(),
                remaining_hours: remaining_effort(story),
                days_until_due: None,
                days_overdue: days.days().map(i64::abs),
                urgency_score: Some(urgency_score(story, now)),
                progress_percentage: None,
            });
        } else if is_at_risk(story, now) {
            at_risk_idx.insert(idx);
            at_risk.push(scored(story, now));
        }
    }

    let mut need_to_start: Vec<AnalyzedStory> = active
        .iter()
        .enumerate()
        .filter(|(idx, story)| {
            story.status == StoryStatus::ToDo
                && !overdue_idx.contains(idx)
                && !at_risk_idx.contains(idx)
        })
        .map(|(_, story)| scored(story, now))
        .collect();

    let in_progress: Vec<AnalyzedStory> = active
        .iter()
        .filter(|story| story.status.is_in_flight())
        .map(|story| AnalyzedStory {
            story: (*story).clone(),
            remaining_hours: remaining_effort(story),
            days_until_due: days_until_due(story, now).days(),
            days_overdue: None,
            urgency_score: None,
            progress_percentage: Some(progress_percentage(story)),
        })
        .collect();

    sort_by_urgency(&mut overdue);
    sort_by_urgency(&mut at_risk);
    sort_by_urgency(&mut need_to_start);
    need_to_start.truncate(NEED_TO_START_LIMIT);

    let summary = AnalysisSummary {
        total_active: active.len(),
        overdue_count: overdue.len(),
        at_risk_count: at_risk.len(),
        in_progress_count: in_progress.len(),
        to_do_count: active
            .iter()
            .filter(|story| story.status == StoryStatus::ToDo)
            .count(),
    };

    AnalysisReport {
        overdue,
        at_risk,
        need_to_start,
        in_progress,
        summary,
    }
}

fn is_conforming(story: &StoryRecord) -> bool {
    story.duration.is_finite()
        && story.time_spent.is_finite()
        && story.duration >= 0.0
        && story.time_spent >= 0.0
}

fn scored(story: &StoryRecord, now: DateTime<Utc>) -> AnalyzedStory {
    AnalyzedStory {
        story: story.clone(),
        remaining_hours: remaining_effort(story),
        days_until_due: days_until_due(story, now).days(),
        days_overdue: None,
        urgency_score: Some(urgency_score(story, now)),
        progress_percentage: None,
    }
}

/// Most urgent first. `sort_by` is stable, so equal scores keep input order.
fn sort_by_urgency(stories: &mut [AnalyzedStory]) {
    stories.sort_by(|a, b| b.urgency().total_cmp(&a.urgency()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn story(id: &str, status: StoryStatus, duration: f64, spent: f64, due_in: Option<i64>) -> StoryRecord {
        let mut record = StoryRecord::new(id, format!("Story {}", id))
            .with_status(status)
            .with_effort(duration, spent);
        if let Some(days) = due_in {
            record = record.with_due_date(now() + Duration::days(days));
        }
        record
    }

    fn ids(bucket: &[AnalyzedStory]) -> Vec<&str> {
        bucket.iter().map(|s| s.story.id.as_str()).collect()
    }

    #[test]
    fn test_empty_batch() {
        let report = classify(&[], now());
        assert_eq!(report, AnalysisReport::default());
    }

    #[test]
    fn test_scenario_tight_deadline_is_at_risk() {
        let stories = vec![
            story("A", StoryStatus::ToDo, 10.0, 0.0, Some(1)).with_priority(Priority::High),
        ];
        let report = classify(&stories, now());

        assert_eq!(ids(&report.at_risk), vec!["A"]);
        assert!(report.overdue.is_empty());
        assert!(report.need_to_start.is_empty());
        assert_eq!(report.at_risk[0].days_until_due, Some(1));
        assert_eq!(report.at_risk[0].remaining_hours, 10.0);
        assert_eq!(report.at_risk[0].urgency_score, Some(30.0));
        assert_eq!(report.summary.at_risk_count, 1);
        assert_eq!(report.summary.to_do_count, 1);
    }

    #[test]
    fn test_scenario_ample_deadline_needs_start() {
        let stories = vec![story("B", StoryStatus::ToDo, 4.0, 0.0, Some(10))];
        let report = classify(&stories, now());

        assert!(report.at_risk.is_empty());
        assert_eq!(ids(&report.need_to_start), vec!["B"]);
        let score = report.need_to_start[0].urgency_score.unwrap();
        assert!((score - 0.8).abs() < 1e-9);
        assert_eq!(report.need_to_start[0].days_until_due, Some(10));
        assert_eq!(report.need_to_start[0].remaining_hours, 4.0);
    }

    #[test]
    fn test_scenario_overspent_overdue_in_progress() {
        let stories = vec![story("C", StoryStatus::InProgress, 10.0, 12.0, Some(-1))];
        let report = classify(&stories, now());

        assert_eq!(ids(&report.overdue), vec!["C"]);
        let overdue = &report.overdue[0];
        assert_eq!(overdue.remaining_hours, 0.0);
        assert_eq!(overdue.days_overdue, Some(1));
        assert_eq!(overdue.urgency_score, Some(1000.0));

        assert_eq!(ids(&report.in_progress), vec!["C"]);
        assert_eq!(report.in_progress[0].progress_percentage, Some(120.0));
        assert_eq!(report.in_progress[0].days_until_due, Some(-1));
        assert_eq!(report.summary.overdue_count, 1);
        assert_eq!(report.summary.in_progress_count, 1);
    }

    #[test]
    fn test_scenario_closed_story_excluded_everywhere() {
        let stories = vec![story("D", StoryStatus::Closed, 8.0, 0.0, Some(-30))];
        let report = classify(&stories, now());

        assert!(report.overdue.is_empty());
        assert!(report.at_risk.is_empty());
        assert!(report.need_to_start.is_empty());
        assert!(report.in_progress.is_empty());
        assert_eq!(report.summary.total_active, 0);
    }

    #[test]
    fn test_undated_stories_never_overdue_or_at_risk() {
        let stories = vec![
            story("U1", StoryStatus::ToDo, 400.0, 0.0, None),
            story("U2", StoryStatus::InProgress, 400.0, 1.0, None),
        ];
        let report = classify(&stories, now());

        assert!(report.overdue.is_empty());
        assert!(report.at_risk.is_empty());
        assert_eq!(ids(&report.need_to_start), vec!["U1"]);
        assert_eq!(report.need_to_start[0].days_until_due, None);
        assert_eq!(report.need_to_start[0].urgency_score, Some(0.0));
        assert_eq!(ids(&report.in_progress), vec!["U2"]);
    }

    #[test]
    fn test_overdue_and_at_risk_are_disjoint() {
        let stories = vec![
            story("late", StoryStatus::ToDo, 80.0, 0.0, Some(-2)),
            story("tight", StoryStatus::Reopen, 80.0, 0.0, Some(2)),
            story("due-now", StoryStatus::ToDo, 80.0, 0.0, Some(0)),
        ];
        let report = classify(&stories, now());

        assert_eq!(ids(&report.overdue), vec!["late"]);
        assert_eq!(ids(&report.at_risk), vec!["tight"]);
        // Due exactly now: neither overdue nor at risk, but scored at the ceiling
        assert_eq!(ids(&report.need_to_start), vec!["due-now"]);
        assert_eq!(report.need_to_start[0].urgency_score, Some(2000.0));
    }

    #[test]
    fn test_reopen_is_active_but_not_started_or_in_flight() {
        let stories = vec![story("R", StoryStatus::Reopen, 2.0, 0.0, Some(30))];
        let report = classify(&stories, now());

        assert_eq!(report.summary.total_active, 1);
        assert!(report.need_to_start.is_empty());
        assert!(report.in_progress.is_empty());
        assert_eq!(report.summary.to_do_count, 0);
    }

    #[test]
    fn test_need_to_start_capped_and_sorted() {
        let stories: Vec<StoryRecord> = (0..15)
            .map(|i| story(&format!("S{}", i), StoryStatus::ToDo, i as f64, 0.0, Some(20)))
            .collect();
        let report = classify(&stories, now());

        assert_eq!(report.need_to_start.len(), NEED_TO_START_LIMIT);
        assert_eq!(report.need_to_start[0].story.id, "S14");
        assert_eq!(report.need_to_start[9].story.id, "S5");
        assert!(report
            .need_to_start
            .windows(2)
            .all(|w| w[0].urgency() >= w[1].urgency()));
        assert_eq!(report.summary.to_do_count, 15);
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let stories = vec![
            story("first", StoryStatus::ToDo, 4.0, 0.0, Some(10)),
            story("second", StoryStatus::ToDo, 4.0, 0.0, Some(10)),
            story("third", StoryStatus::ToDo, 4.0, 0.0, Some(10)),
            story("late-a", StoryStatus::ToDo, 1.0, 0.0, Some(-3)),
            story("late-b", StoryStatus::ToDo, 90.0, 0.0, Some(-1)),
        ];
        let report = classify(&stories, now());

        assert_eq!(ids(&report.need_to_start), vec!["first", "second", "third"]);
        assert_eq!(ids(&report.overdue), vec!["late-a", "late-b"]);
        assert_eq!(report.overdue[0].urgency_score, Some(2000.0));
        assert_eq!(report.overdue[1].urgency_score, Some(2000.0));
    }

    #[test]
    fn test_overdue_sorted_by_weights() {
        let stories = vec![
            story("low", StoryStatus::ToDo, 1.0, 0.0, Some(-1)).with_priority(Priority::Low),
            story("deploy", StoryStatus::InDeploy, 1.0, 0.0, Some(-1)),
            story("high", StoryStatus::Reopen, 1.0, 0.0, Some(-1)).with_priority(Priority::High),
        ];
        let report = classify(&stories, now());

        assert_eq!(ids(&report.overdue), vec!["high", "low", "deploy"]);
    }

    #[test]
    fn test_zero_duration_progress() {
        let stories = vec![story("Z", StoryStatus::InTest, 0.0, 3.0, Some(5))];
        let report = classify(&stories, now());

        assert_eq!(report.in_progress[0].progress_percentage, Some(0.0));
        assert_eq!(report.in_progress[0].remaining_hours, 0.0);
    }

    #[test]
    fn test_non_conforming_stories_skipped() {
        let stories = vec![
            story("nan", StoryStatus::ToDo, f64::NAN, 0.0, Some(3)),
            story("neg", StoryStatus::InProgress, 5.0, -1.0, Some(3)),
            story("ok", StoryStatus::ToDo, 5.0, 0.0, Some(3)),
        ];
        let report = classify(&stories, now());

        assert_eq!(report.summary.total_active, 1);
        assert_eq!(ids(&report.need_to_start), vec!["ok"]);
        assert!(report.in_progress.is_empty());
    }

    #[test]
    fn test_duplicate_ids_tracked_by_position() {
        let stories = vec![
            story("dup", StoryStatus::ToDo, 1.0, 0.0, Some(-1)),
            story("dup", StoryStatus::ToDo, 1.0, 0.0, Some(30)),
        ];
        let report = classify(&stories, now());

        assert_eq!(report.overdue.len(), 1);
        assert_eq!(report.need_to_start.len(), 1);
        assert_eq!(report.need_to_start[0].days_until_due, Some(30));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let stories = vec![
            story("A", StoryStatus::ToDo, 10.0, 0.0, Some(1)),
            story("B", StoryStatus::InProgress, 6.0, 2.0, Some(-4)),
            story("C", StoryStatus::ToDo, 3.0, 0.0, None),
            story("D", StoryStatus::WontDo, 3.0, 0.0, Some(-9)),
        ];
        assert_eq!(classify(&stories, now()), classify(&stories, now()));
    }
}
