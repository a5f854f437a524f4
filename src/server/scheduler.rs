//! Daily analysis schedule.
//!
//! The job runs once a day at a configured local wall-clock time. Each run
//! takes the shared storage lock, so it never overlaps an analysis triggered
//! through the API.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::commands;
use crate::storage::Storage;

/// The first instant strictly after `now` whose local time is `at`.
///
/// A day on which `at` does not exist (a DST gap) is skipped; on a day where
/// it occurs twice, the earlier instant is used.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    for _ in 0..3 {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            if candidate > *now {
                return Some(candidate);
            }
        }
        date = date.succ_opt()?;
    }
    None
}

/// Run the analysis job every day at `at` (local time), forever.
///
/// Failures are logged and the loop moves on to the next day.
pub async fn run_daily(storage: Arc<Mutex<Storage>>, at: NaiveTime) {
    loop {
        let now = Local::now();
        let Some(next) = next_run_after(&now, at) else {
            tracing::error!(time = %at, "could not compute next scheduled run, schedule stopped");
            return;
        };
        tracing::info!(next_run = %next.to_rfc3339(), "next scheduled analysis");

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        tracing::info!("running scheduled story analysis");
        let storage = storage.lock().await;
        match commands::run_analysis(&storage, Utc::now()) {
            Ok(run) => tracing::info!(
                source = %run.analysis.source_file,
                overdue = run.report().summary.overdue_count,
                at_risk = run.report().summary.at_risk_count,
                "scheduled analysis completed"
            ),
            Err(e) => tracing::error!(error = %e, "scheduled analysis failed"),
        }
    }
}
