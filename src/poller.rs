//! Bounded status polling for submitted jobs.
//!
//! The loop waits a fixed interval before every status query and gives up
//! after a fixed number of queries. Both the wait and the status source are
//! injected so the loop can be driven without a network or a real clock.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::job::{Job, JobEvent, JobStateMachine, JobStatus, Transition};
use crate::pdfco::{PdfCoError, RemoteStatus};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Spacing and budget for status queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollConfig {
    /// Longest time a poll can wait in total, excluding request latency.
    /// Saturates at [`Duration::MAX`] for absurd configurations.
    pub fn budget(&self) -> Duration {
        self.interval
            .checked_mul(self.max_attempts)
            .unwrap_or(Duration::MAX)
    }
}

/// Waits between status queries.
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Answers "what is the status of this job right now?".
pub trait JobStatusSource {
    async fn check_job(&self, job_id: &str) -> Result<RemoteStatus, PdfCoError>;
}

/// Drives one job at a time to a terminal status.
///
/// A `Poller` holds no per-job state, so the same instance can poll any
/// number of jobs concurrently.
pub struct Poller<S = TokioSleeper> {
    config: PollConfig,
    sleeper: S,
}

impl Poller<TokioSleeper> {
    pub fn new(config: PollConfig) -> Self {
        Self::with_sleeper(config, TokioSleeper)
    }
}

impl<S: Sleeper> Poller<S> {
    pub fn with_sleeper(config: PollConfig, sleeper: S) -> Self {
        Self { config, sleeper }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Poll until the job succeeds, fails, or the attempt budget runs out.
    pub async fn poll(
        &self,
        source: &impl JobStatusSource,
        job: &mut Job,
    ) -> Result<String, PdfCoError> {
        self.poll_with_progress(source, job, |_, _| {}).await
    }

    /// Same as [`poll`](Self::poll), reporting `(attempt, status)` after
    /// every status query.
    ///
    /// - Returns the result URL only after a `success` answer.
    /// - Returns `JobFailed` on the first failure answer, without spending
    ///   the rest of the budget.
    /// - Returns `JobTimeout` after exactly `max_attempts` non-terminal answers.
    /// - A job that is already terminal is answered from its own state,
    ///   without querying the source.
    pub async fn poll_with_progress(
        &self,
        source: &impl JobStatusSource,
        job: &mut Job,
        mut on_attempt: impl FnMut(u32, JobStatus),
    ) -> Result<String, PdfCoError> {
        if job.status().is_terminal() {
            return terminal_outcome(job);
        }

        for attempt in 1..=self.config.max_attempts {
            self.sleeper.sleep(self.config.interval).await;

            let remote = source.check_job(&job.id).await?;
            debug!(job_id = %job.id, local_id = %job.local_id, attempt, ?remote, "status checked");

            let transition = JobStateMachine::apply(job, JobEvent::from(remote));
            on_attempt(attempt, job.status());

            if let Transition::Complete(_) = transition {
                return terminal_outcome(job);
            }
        }

        JobStateMachine::apply(job, JobEvent::BudgetExhausted);
        warn!(
            job_id = %job.id,
            attempts = self.config.max_attempts,
            "job did not finish within the polling budget"
        );
        terminal_outcome(job)
    }
}

fn terminal_outcome(job: &Job) -> Result<String, PdfCoError> {
    match job.status() {
        JobStatus::Succeeded => {
            let url = job.result_url().unwrap_or_default().to_string();
            info!(job_id = %job.id, %url, attempts = job.attempts(), "job succeeded");
            Ok(url)
        }
        JobStatus::Failed => Err(PdfCoError::JobFailed {
            job_id: job.id.clone(),
            reason: job.failure().unwrap_or("job failed").to_string(),
        }),
        JobStatus::TimedOut | JobStatus::Submitted | JobStatus::InProgress => {
            Err(PdfCoError::JobTimeout {
                job_id: job.id.clone(),
                attempts: job.attempts(),
            })
        }
    }
}
