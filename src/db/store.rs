use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{queries, JobOutcome, JobStore, StoreError};
use crate::models::job::{Job, JobStatus};
use crate::models::product::{RowRecord, RowResult};

/// PostgreSQL-backed job store.
///
/// Status survives process restarts and is shared across scheduler
/// instances; all write serialization happens in the database.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create_job(&self, rows: &[RowRecord]) -> Result<Job, StoreError> {
        Ok(queries::create_job(&self.pool, rows).await?)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(queries::get_job(&self.pool, job_id).await?)
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<(), StoreError> {
        Ok(queries::mark_processing(&self.pool, job_id).await?)
    }

    async fn append_row_result(
        &self,
        job_id: Uuid,
        index: usize,
        result: &RowResult,
    ) -> Result<(), StoreError> {
        Ok(queries::append_row_result(&self.pool, job_id, index, result).await?)
    }

    async fn finalize_job(&self, job_id: Uuid, outcome: &JobOutcome) -> Result<(), StoreError> {
        match outcome {
            JobOutcome::Completed { output_path } => {
                queries::finalize_job(
                    &self.pool,
                    job_id,
                    JobStatus::Completed,
                    Some(output_path),
                    None,
                )
                .await?
            }
            JobOutcome::Failed { error } => {
                queries::finalize_job(&self.pool, job_id, JobStatus::Failed, None, Some(error))
                    .await?
            }
        }
        Ok(())
    }

    async fn upsert_product(&self, result: &RowResult) -> Result<(), StoreError> {
        Ok(queries::upsert_product(&self.pool, result).await?)
    }
}
