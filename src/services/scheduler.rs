use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::db::{JobOutcome, JobStore, StoreError};
use crate::models::job::JobStatus;
use crate::models::product::{RowRecord, RowResult};
use crate::services::artifact::{ArtifactError, ArtifactWriter};
use crate::services::notify::WebhookNotifier;
use crate::services::processor::RowProcessor;
use crate::services::queue::{JobDispatch, QueueError};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("submission contains no rows")]
    EmptySubmission,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("job {0} not found")]
    JobNotFound(Uuid),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("artifact write failed: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("row task failed: {0}")]
    Task(String),
}

/// The batch engine: accepts a parsed row set, runs it independently of the
/// submitting request, and drives the job to a terminal state.
///
/// `submit` only allocates the job and hands its id to the queue, so the
/// caller returns immediately. `run` is driven by the worker: rows fan out
/// on a `JoinSet` gated by a semaphore of `max_concurrent_rows` permits,
/// each finished row is written back at its submission index, and per-row
/// failure never aborts the batch. Only persistence faults, an artifact
/// write failure, or an internal task fault fail the whole job.
pub struct BatchScheduler {
    store: Arc<dyn JobStore>,
    dispatch: Arc<dyn JobDispatch>,
    processor: Arc<RowProcessor>,
    artifact: ArtifactWriter,
    notifier: Arc<WebhookNotifier>,
    max_concurrent_rows: usize,
}

impl BatchScheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        dispatch: Arc<dyn JobDispatch>,
        processor: Arc<RowProcessor>,
        artifact: ArtifactWriter,
        notifier: Arc<WebhookNotifier>,
        max_concurrent_rows: usize,
    ) -> Self {
        Self {
            store,
            dispatch,
            processor,
            artifact,
            notifier,
            max_concurrent_rows,
        }
    }

    /// Accept a batch: allocate the job, enqueue its id, return immediately.
    pub async fn submit(&self, rows: Vec<RowRecord>) -> Result<Uuid, SubmitError> {
        if rows.is_empty() {
            return Err(SubmitError::EmptySubmission);
        }

        let job = self.store.create_job(&rows).await?;
        self.dispatch.dispatch(job.id).await?;

        metrics::counter!("batch_jobs_submitted").increment(1);
        tracing::info!(job_id = %job.id, rows = rows.len(), "Batch job submitted");

        Ok(job.id)
    }

    /// Drive one job to a terminal state. Called from the worker loop.
    pub async fn run(&self, job_id: Uuid) -> Result<(), SchedulerError> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or(SchedulerError::JobNotFound(job_id))?;

        if job.status.is_terminal() {
            tracing::warn!(job_id = %job_id, status = %job.status, "Job already finalized, skipping");
            return Ok(());
        }

        self.store.mark_processing(job_id).await?;
        let start = Instant::now();

        let outcome = match self.process_rows(job_id, job.input_rows).await {
            Ok(output_path) => JobOutcome::Completed { output_path },
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Batch job failed");
                JobOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        // Notification always fires after durable finalization.
        self.store.finalize_job(job_id, &outcome).await?;
        metrics::histogram!("batch_processing_seconds").record(start.elapsed().as_secs_f64());

        let (status, output_path) = match &outcome {
            JobOutcome::Completed { output_path } => {
                metrics::counter!("batch_jobs_completed").increment(1);
                tracing::info!(
                    job_id = %job_id,
                    output_path = %output_path,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Batch job completed"
                );
                (JobStatus::Completed, Some(output_path.as_str()))
            }
            JobOutcome::Failed { .. } => {
                metrics::counter!("batch_jobs_failed").increment(1);
                (JobStatus::Failed, None)
            }
        };

        self.notifier.notify(job_id, status, output_path).await;

        Ok(())
    }

    /// Fan out over all rows with bounded parallelism, write each result
    /// back at its submission index, and serialize the output artifact.
    async fn process_rows(
        &self,
        job_id: Uuid,
        rows: Vec<RowRecord>,
    ) -> Result<String, SchedulerError> {
        let row_count = rows.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_rows.max(1)));
        let mut tasks = JoinSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| SchedulerError::Task("row semaphore closed".to_string()))?;
            let processor = Arc::clone(&self.processor);

            tasks.spawn(async move {
                let _permit = permit;
                let result = processor.process(&row).await;
                (index, result)
            });
        }

        // Completion order is arbitrary; the explicit index keeps the stored
        // sequence in submission order.
        let mut ordered: Vec<Option<RowResult>> = vec![None; row_count];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| SchedulerError::Task(e.to_string()))?;

            self.store.append_row_result(job_id, index, &result).await?;
            self.store.upsert_product(&result).await?;

            tracing::debug!(
                job_id = %job_id,
                row_index = index,
                serial_number = result.serial_number,
                failed_urls = result.failed_count(),
                "Row processed"
            );

            ordered[index] = Some(result);
        }

        let results: Vec<RowResult> = ordered
            .into_iter()
            .map(|slot| slot.ok_or_else(|| SchedulerError::Task("missing row result".to_string())))
            .collect::<Result<_, _>>()?;

        Ok(self.artifact.write(job_id, &results).await?)
    }
}
