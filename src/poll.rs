//! Run status polling.
//!
//! Watches one run until it reaches a terminal status, printing the current
//! status and two elapsed counters each tick: seconds since the status last
//! changed and total seconds since polling began. The wait is bounded and
//! transient query failures are retried a fixed number of times, so a hung
//! run or a flaky network ends in a distinct outcome instead of a crash or
//! an endless loop.
use crate::api::TfcClient;
use anyhow::Result;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

/// Statuses after which a run makes no further transitions. Matched as
/// case-sensitive prefixes of the raw status string.
const TERMINAL_STATUS_PREFIXES: [&str; 7] = [
    "planned_and_finished",
    "applied",
    "policy_soft_failed",
    "discarded",
    "canceled",
    "errored",
    "force_canceled",
];

/// Terminal statuses that count as the run doing what was asked.
const SUCCESS_STATUS_PREFIXES: [&str; 2] = ["planned_and_finished", "applied"];

pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_STATUS_PREFIXES
        .iter()
        .any(|prefix| status.starts_with(prefix))
}

pub fn is_success_status(status: &str) -> bool {
    SUCCESS_STATUS_PREFIXES
        .iter()
        .any(|prefix| status.starts_with(prefix))
}

/// Where run statuses come from. `TfcClient` is the live source; tests
/// script one.
pub trait StatusSource {
    fn status(&self, run_id: &str) -> Result<String>;
}

impl StatusSource for TfcClient {
    fn status(&self, run_id: &str) -> Result<String> {
        self.run_status(run_id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Sleep between status queries.
    pub interval: Duration,
    /// Give up after this much wall-clock time.
    pub max_wait: Duration,
    /// Give up after this many consecutive failed status queries.
    pub max_retries: u32,
}

impl Default for PollOptions {
    fn default() -> PollOptions {
        PollOptions {
            interval: Duration::from_secs(1),
            max_wait: Duration::from_secs(3600),
            max_retries: 3,
        }
    }
}

/// How a watched run ended, from this process's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The run reached a terminal status.
    Finished { status: String },
    /// The wait bound elapsed before any terminal status was observed.
    TimedOut { last_status: Option<String> },
    /// Status queries kept failing; the run may still be in progress.
    Unknown { last_status: Option<String> },
}

/// Elapsed-time bookkeeping for one polled run.
#[derive(Debug, Default)]
struct StatusTracker {
    last_status: Option<String>,
    since_change: u64,
    total: u64,
}

impl StatusTracker {
    /// Record one observation, one tick after the previous one. Returns true
    /// when the status differs from the prior observation.
    fn observe(&mut self, status: &str) -> bool {
        self.total += 1;
        if self.last_status.as_deref() == Some(status) {
            self.since_change += 1;
            false
        } else {
            self.since_change = 0;
            self.last_status = Some(status.to_string());
            true
        }
    }
}

/// Poll `run_id` until it terminates, the wait bound elapses, or the API
/// becomes unreachable.
pub fn poll_run(source: &dyn StatusSource, run_id: &str, options: &PollOptions) -> PollOutcome {
    let deadline = Instant::now() + options.max_wait;
    let mut tracker = StatusTracker::default();
    let mut failures = 0u32;
    loop {
        thread::sleep(options.interval);
        let status = match source.status(run_id) {
            Ok(status) => {
                failures = 0;
                status
            }
            Err(err) => {
                failures += 1;
                tracing::warn!(attempt = failures, "status query failed: {err:#}");
                if failures >= options.max_retries {
                    return PollOutcome::Unknown {
                        last_status: tracker.last_status.clone(),
                    };
                }
                continue;
            }
        };
        if tracker.observe(&status) {
            println!();
        }
        print!(
            "\t{status} - {} seconds elapsed - {} seconds total\r",
            tracker.since_change, tracker.total
        );
        let _ = io::stdout().flush();
        if is_terminal_status(&status) {
            println!(
                "\n\nFinished - Status: {status} - Approximate total time elapsed: {} seconds\n",
                tracker.total
            );
            return PollOutcome::Finished { status };
        }
        if Instant::now() >= deadline {
            return PollOutcome::TimedOut {
                last_status: tracker.last_status.clone(),
            };
        }
    }
}
