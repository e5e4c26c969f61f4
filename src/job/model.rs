use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pdfco::{Operation, OperationParams};

/// Lifecycle status of a conversion job on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Submitted,
    InProgress,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::TimedOut
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Submitted => write!(f, "submitted"),
            JobStatus::InProgress => write!(f, "in-progress"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::TimedOut => write!(f, "timed-out"),
        }
    }
}

/// A single asynchronous conversion request and where it stands.
///
/// Jobs are transient: created by a submission, driven by polling, then
/// dropped once the result reaches the caller. Status and result can only
/// change through [`JobStateMachine`](super::JobStateMachine).
#[derive(Debug, Clone)]
pub struct Job {
    /// Local correlation id for log spans; never sent to the service.
    pub local_id: Uuid,
    /// Identifier issued by the service.
    pub id: String,
    pub operation: Operation,
    pub inputs: Vec<String>,
    pub params: OperationParams,
    pub(super) status: JobStatus,
    pub(super) status_history: Vec<JobStatus>,
    pub(super) attempts: u32,
    pub(super) result_url: Option<String>,
    pub(super) failure: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        id: String,
        operation: Operation,
        inputs: Vec<String>,
        params: OperationParams,
    ) -> Self {
        let now = Utc::now();
        Self {
            local_id: Uuid::new_v4(),
            id,
            operation,
            inputs,
            params,
            status: JobStatus::Submitted,
            status_history: Vec::new(),
            attempts: 0,
            result_url: None,
            failure: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Number of status queries fed into this job so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The result location, only ever present once the job has succeeded.
    pub fn result_url(&self) -> Option<&str> {
        match self.status {
            JobStatus::Succeeded => self.result_url.as_deref(),
            _ => None,
        }
    }

    /// Reason reported by the service when the job failed.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

/// Summary printed once a job has reached a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub operation: Operation,
    pub inputs: Vec<String>,
    pub params: OperationParams,
    pub status: JobStatus,
    pub status_transitions: Vec<JobStatus>,
    pub attempts: u32,
    pub result_url: Option<String>,
    pub failure: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl JobReport {
    pub fn from_job(job: &Job) -> Self {
        let mut transitions = job.status_history.clone();
        transitions.push(job.status);

        Self {
            job_id: job.id.clone(),
            operation: job.operation,
            inputs: job.inputs.clone(),
            params: OperationParams {
                password: job.params.password.as_ref().map(|_| "********".to_string()),
                ..job.params.clone()
            },
            status: job.status,
            status_transitions: transitions,
            attempts: job.attempts,
            result_url: job.result_url().map(str::to_string),
            failure: job.failure.clone(),
            submitted_at: job.submitted_at,
            finished_at: job.updated_at,
            duration_ms: (job.updated_at - job.submitted_at).num_milliseconds(),
        }
    }
}
