//! Story classification engine.
//!
//! Pure functions over a batch of normalized [`StoryRecord`]s and an explicit
//! `now`. Nothing in this module reads the clock or touches I/O, so the same
//! batch and instant always produce the same report.
//!
//! - [`metrics`] - remaining effort, days until due, progress
//! - [`scoring`] - weight tables, risk predicate, urgency score
//! - [`classify()`] - bucket aggregation and summary counts
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use storyboard::analysis::classify;
//! use storyboard::models::{Priority, StoryRecord};
//!
//! let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
//! let story = StoryRecord::new("S-1", "Checkout flow")
//!     .with_priority(Priority::High)
//!     .with_effort(10.0, 0.0)
//!     .with_due_date(now + Duration::days(1));
//!
//! let report = classify(&[story], now);
//! assert_eq!(report.summary.at_risk_count, 1);
//! ```
//!
//! [`StoryRecord`]: crate::models::StoryRecord

pub mod classify;
pub mod metrics;
pub mod scoring;

pub use classify::{NEED_TO_START_LIMIT, classify};
pub use metrics::{DaysUntilDue, days_until_due, progress_percentage, remaining_effort};
pub use scoring::{days_needed, is_at_risk, priority_weight, status_weight, urgency_score};
