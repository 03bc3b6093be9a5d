//! Daily posting triggers.
//!
//! One trigger runs per configured hour. Each sleeps until the next `HH:00`
//! in local time, runs the pipeline and hands the outcome to
//! [`report_outcome`], which is the only place run results are logged. The
//! triggers are polled together on the current task, so two hours never run
//! the pipeline in parallel unless a run outlasts the gap between them.

use chrono::{DateTime, Days, Local, TimeZone};
use futures::future::join_all;
use itertools::Itertools;
use std::future::Future;
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::models::RunOutcome;

/// What fired a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Scheduled { hour: u32 },
}

/// Parse a comma-separated list of hours such as `"8, 20"`.
///
/// Hours are deduplicated and sorted.
///
/// # Errors
///
/// [`PipelineError::Config`] for an empty list or any value outside 0-23.
pub fn parse_posting_hours(raw: &str) -> Result<Vec<u32>, PipelineError> {
    let hours: Vec<u32> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .ok()
                .filter(|h| *h < 24)
                .ok_or_else(|| PipelineError::Config(format!("invalid posting hour {s:?}; expected 0-23")))
        })
        .collect::<Result<_, _>>()?;

    if hours.is_empty() {
        return Err(PipelineError::Config("POSTING_HOUR names no hours".to_string()));
    }
    Ok(hours.into_iter().sorted().dedup().collect())
}

/// The first `hour:00` strictly after `now`.
///
/// A wall-clock time skipped by a DST change moves to the next day.
pub fn next_fire<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();
    (0..=2u64).find_map(|offset| {
        let naive = today.checked_add_days(Days::new(offset))?.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&naive)
            .earliest()
            .filter(|candidate| candidate > now)
    })
}

/// Log the result of one run. Returns `true` on success.
pub fn report_outcome(trigger: Trigger, outcome: &Result<RunOutcome, PipelineError>) -> bool {
    match outcome {
        Ok(RunOutcome::Published { title, post_id, attempts }) => {
            info!(?trigger, %title, %post_id, attempts, "Posting succeeded");
            true
        }
        Ok(RunOutcome::DryRun { title, tags, html_len }) => {
            info!(?trigger, %title, ?tags, html_len, "Dry run finished");
            true
        }
        Err(e) => {
            error!(?trigger, kind = e.kind(), fatal = e.is_fatal(), error = %e, "Posting run failed");
            false
        }
    }
}

async fn daily_trigger<F, Fut>(hour: u32, run: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<RunOutcome, PipelineError>>,
{
    loop {
        let now = Local::now();
        let Some(next) = next_fire(&now, hour) else {
            warn!(hour, "Could not compute the next firing time; trigger stopped");
            return;
        };
        let wait = (next.clone() - now).to_std().unwrap_or_default();
        info!(hour, next = %next.to_rfc3339(), wait_secs = wait.as_secs(), "Trigger armed");
        tokio::time::sleep(wait).await;

        info!(hour, "Trigger fired");
        let outcome = run().await;
        report_outcome(Trigger::Scheduled { hour }, &outcome);
    }
}

/// Run `run` at every hour in `hours` until Ctrl-C.
pub async fn run_schedule<F, Fut>(hours: &[u32], run: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<RunOutcome, PipelineError>>,
{
    info!(?hours, "Scheduler started; waiting for the posting hours");
    let triggers = join_all(hours.iter().map(|hour| daily_trigger(*hour, &run)));

    tokio::select! {
        _ = triggers => warn!("All triggers stopped"),
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => info!("Shutdown requested; scheduler stopping"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C; scheduler stopping"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 14, h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_posting_hours() {
        assert_eq!(parse_posting_hours("8").unwrap(), vec![8]);
        assert_eq!(parse_posting_hours(" 20, 8 ,8,").unwrap(), vec![8, 20]);
        assert_eq!(parse_posting_hours("0,23").unwrap(), vec![0, 23]);
    }

    #[test]
    fn test_parse_posting_hours_rejects_bad_values() {
        for raw in ["", " , ", "24", "8,nine", "-1"] {
            assert!(
                matches!(parse_posting_hours(raw), Err(PipelineError::Config(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_next_fire_later_today() {
        let next = next_fire(&at(6, 30), 8).unwrap();
        assert_eq!(next, at(8, 0));
    }

    #[test]
    fn test_next_fire_is_strictly_after_now() {
        let next = next_fire(&at(8, 0), 8).unwrap();
        assert_eq!(next.hour(), 8);
        assert_eq!(next - at(8, 0), chrono::Duration::days(1));

        let next = next_fire(&at(21, 15), 20).unwrap();
        assert_eq!(next.date_naive(), at(0, 0).date_naive().succ_opt().unwrap());
    }

    #[test]
    fn test_report_outcome() {
        let ok = Ok(RunOutcome::Published {
            title: "T".to_string(),
            post_id: "1".to_string(),
            attempts: 2,
        });
        assert!(report_outcome(Trigger::Manual, &ok));

        let err = Err(PipelineError::SelectionExhausted { attempts: 5 });
        assert!(!report_outcome(Trigger::Scheduled { hour: 8 }, &err));
    }
}
