use chrono::Utc;

use super::model::{Job, JobStatus};
use crate::pdfco::RemoteStatus;

/// Something learned about a job since its last transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// A status query answered with a non-terminal status.
    Working,
    /// A status query answered `success` with a result location.
    Succeeded { url: String },
    /// The service reported the job as failed.
    Failed { reason: String },
    /// The polling budget ran out while the job was still non-terminal.
    BudgetExhausted,
}

impl From<RemoteStatus> for JobEvent {
    fn from(status: RemoteStatus) -> Self {
        match status {
            RemoteStatus::Working(_) => JobEvent::Working,
            RemoteStatus::Success { url } => JobEvent::Succeeded { url },
            RemoteStatus::Failed { reason } => JobEvent::Failed { reason },
        }
    }
}

/// The effect an event had on a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved to a new non-terminal status.
    Next(JobStatus),
    /// Still in the same non-terminal status.
    Unchanged(JobStatus),
    /// Reached a terminal status.
    Complete(JobStatus),
    /// The job was already terminal; nothing changed.
    Rejected(JobStatus),
}

/// Drives a [`Job`] through `submitted → in-progress → {succeeded | failed | timed-out}`.
pub struct JobStateMachine;

impl JobStateMachine {
    /// Apply an event to the job and report the resulting transition.
    ///
    /// - `Working`, `Succeeded` and `Failed` each count as one status query.
    /// - A terminal job is never mutated; every event returns `Rejected`.
    /// - `BudgetExhausted` on a live job completes it as `TimedOut`.
    pub fn apply(job: &mut Job, event: JobEvent) -> Transition {
        if job.status.is_terminal() {
            return Transition::Rejected(job.status);
        }

        if !matches!(event, JobEvent::BudgetExhausted) {
            job.attempts += 1;
        }

        let transition = match event {
            JobEvent::Working => match job.status {
                JobStatus::Submitted => Transition::Next(JobStatus::InProgress),
                current => Transition::Unchanged(current),
            },
            JobEvent::Succeeded { url } => {
                job.result_url = Some(url);
                Transition::Complete(JobStatus::Succeeded)
            }
            JobEvent::Failed { reason } => {
                job.failure = Some(reason);
                Transition::Complete(JobStatus::Failed)
            }
            JobEvent::BudgetExhausted => Transition::Complete(JobStatus::TimedOut),
        };

        match &transition {
            Transition::Next(next) | Transition::Complete(next) => {
                job.status_history.push(job.status);
                job.status = *next;
            }
            Transition::Unchanged(_) | Transition::Rejected(_) => {}
        }
        job.updated_at = Utc::now();

        transition
    }
}
