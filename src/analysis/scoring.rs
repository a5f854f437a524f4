//! Risk predicate and urgency score.
//!
//! Urgency combines priority, status, remaining effort, and the time buffer
//! before the due date into a dimensionless ranking value:
//!
//! - due today or overdue: `priority_weight * status_weight * 1000`
//! - otherwise: `priority_weight * status_weight * remaining / max(days, 0.1)`
//!
//! The flat ceiling for the first branch is intentionally discontinuous so that
//! overdue stories with nonzero weights always outrank everything else.

use chrono::{DateTime, Utc};

use super::metrics::{DaysUntilDue, days_until_due, remaining_effort};
use crate::models::{Priority, StoryRecord, StoryStatus};

/// Weight tables and constants used by the scoring functions.
pub mod weights {
    use crate::models::{Priority, StoryStatus};

    /// Working hours assumed per day when converting effort to days.
    pub const WORKING_HOURS_PER_DAY: f64 = 8.0;

    /// Multiplier applied to weights for stories due today or overdue.
    pub const OVERDUE_CEILING: f64 = 1000.0;

    /// Smallest day count used as a divisor.
    pub const MIN_DAYS_DIVISOR: f64 = 0.1;

    /// Weight for any priority or status missing from the tables.
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    pub const PRIORITY_WEIGHTS: &[(Priority, f64)] = &[
        (Priority::High, 3.0),
        (Priority::Medium, 2.0),
        (Priority::Low, 1.0),
    ];

    /// Lower weight = less pressing to start. `StoryStatus::Other` is never
    /// listed and always gets [`DEFAULT_WEIGHT`].
    pub const STATUS_WEIGHTS: &[(StoryStatus, f64)] = &[
        (StoryStatus::ToDo, 1.0),
        (StoryStatus::Reopen, 1.2),
        (StoryStatus::InProgress, 0.5),
        (StoryStatus::InTest, 0.3),
        (StoryStatus::InDeploy, 0.1),
        (StoryStatus::Closed, 0.0),
        (StoryStatus::Rejected, 0.0),
        (StoryStatus::WontDo, 0.0),
    ];
}

pub fn priority_weight(priority: Priority) -> f64 {
    weights::PRIORITY_WEIGHTS
        .iter()
        .find(|(p, _)| *p == priority)
        .map_or(weights::DEFAULT_WEIGHT, |(_, w)| *w)
}

pub fn status_weight(status: &StoryStatus) -> f64 {
    weights::STATUS_WEIGHTS
        .iter()
        .find(|(s, _)| s == status)
        .map_or(weights::DEFAULT_WEIGHT, |(_, w)| *w)
}

/// Whole working days needed to finish the remaining effort.
pub fn days_needed(story: &StoryRecord) -> f64 {
    (remaining_effort(story) / weights::WORKING_HOURS_PER_DAY).ceil()
}

/// Whether a not-yet-overdue story is likely to miss its due date.
///
/// True when the days needed meet or exceed the days left and the due date is
/// still in the future. Overdue and undated stories are never at risk.
pub fn is_at_risk(story: &StoryRecord, now: DateTime<Utc>) -> bool {
    match days_until_due(story, now) {
        DaysUntilDue::Days(days) if days > 0 => days_needed(story) >= days as f64,
        _ => false,
    }
}

/// Ranking score; higher means more urgent. Only meaningful relative to other
/// scores from the same run.
pub fn urgency_score(story: &StoryRecord, now: DateTime<Utc>) -> f64 {
    let weight = priority_weight(story.priority) * status_weight(&story.status);
    let days = days_until_due(story, now).as_f64();

    if days <= 0.0 {
        return weight * weights::OVERDUE_CEILING;
    }

    weight * remaining_effort(story) / days.max(weights::MIN_DAYS_DIVISOR)
}
