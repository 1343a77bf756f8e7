use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::product::{RowRecord, RowResult};

/// Status of a batch processing job.
///
/// Transitions are one-directional: `Pending -> Processing -> Completed | Failed`.
/// Once a job reaches a terminal state it is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving to `next` respects the one-directional state machine.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match self {
            JobStatus::Pending => matches!(
                next,
                JobStatus::Processing | JobStatus::Completed | JobStatus::Failed
            ),
            JobStatus::Processing => matches!(next, JobStatus::Completed | JobStatus::Failed),
            JobStatus::Completed | JobStatus::Failed => false,
        }
    }
}

/// One batch processing run initiated by a single submission.
///
/// The input rows are persisted at submission time so a worker can pick the
/// job up after a restart. `results` is ordered by submission row index
/// regardless of the order rows finish processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub input_rows: Vec<RowRecord>,
    pub results: Vec<RowResult>,
    /// Path of the output CSV artifact. Set exactly once, at completion.
    pub output_path: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
