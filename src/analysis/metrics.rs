//! Per-story leaf metrics: remaining effort and distance to the due date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::StoryRecord;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Whole calendar days until a story's due date.
///
/// `NoDeadline` stands for positive infinity: it compares greater than every
/// `Days` value, so an undated story is never overdue and never at risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DaysUntilDue {
    Days(i64),
    NoDeadline,
}

impl DaysUntilDue {
    /// Day count, or `None` for an undated story.
    pub fn days(self) -> Option<i64> {
        match self {
            Self::Days(days) => Some(days),
            Self::NoDeadline => None,
        }
    }

    /// Value as a real number, with `NoDeadline` mapped to `f64::INFINITY`.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Days(days) => days as f64,
            Self::NoDeadline => f64::INFINITY,
        }
    }

    /// Due date already passed (strictly negative day count).
    pub fn is_overdue(self) -> bool {
        matches!(self, Self::Days(days) if days < 0)
    }
}

impl Ord for DaysUntilDue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Days(a), Self::Days(b)) => a.cmp(b),
            (Self::Days(_), Self::NoDeadline) => Ordering::Less,
            (Self::NoDeadline, Self::Days(_)) => Ordering::Greater,
            (Self::NoDeadline, Self::NoDeadline) => Ordering::Equal,
        }
    }
}

impl PartialOrd for DaysUntilDue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Hours of estimated work left. Over-spent stories yield 0, never a negative.
pub fn remaining_effort(story: &StoryRecord) -> f64 {
    (story.duration - story.time_spent).max(0.0)
}

/// Days from `now` until the story is due, rounded up to whole days.
///
/// A deadline 30 minutes out and one 23 hours out are both 1 day away; a
/// deadline 25 hours in the past is -1.
pub fn days_until_due(story: &StoryRecord, now: DateTime<Utc>) -> DaysUntilDue {
    match story.due_date {
        None => DaysUntilDue::NoDeadline,
        Some(due) => {
            let diff_ms = (due - now).num_milliseconds() as f64;
            DaysUntilDue::Days((diff_ms / MILLIS_PER_DAY).ceil() as i64)
        }
    }
}

/// Spent effort as a percentage of the estimate, rounded to one decimal.
///
/// A zero (or non-positive) estimate yields 0.0 rather than a non-finite value.
pub fn progress_percentage(story: &StoryRecord) -> f64 {
    if story.duration <= 0.0 {
        return 0.0;
    }
    let percent = story.time_spent / story.duration * 100.0;
    (percent * 10.0).round() / 10.0
}
