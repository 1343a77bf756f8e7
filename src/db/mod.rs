use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::models::job::Job;
use crate::models::product::{RowRecord, RowResult};

/// Initialize PostgreSQL connection pool
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Terminal outcome handed to `finalize_job`.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed { output_path: String },
    Failed { error: String },
}

/// Durable record of jobs and their per-row results.
///
/// The store is the single source of truth for status queries and provides
/// the serialization for concurrent writers: multiple in-flight rows of the
/// same job append through this interface without any caller-side locking.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a job in `Pending` state with its input rows persisted.
    async fn create_job(&self, rows: &[RowRecord]) -> Result<Job, StoreError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError>;

    /// Move a pending job to `Processing`. No-op if the job already left `Pending`.
    async fn mark_processing(&self, job_id: Uuid) -> Result<(), StoreError>;

    /// Record the result for one row at its submission index.
    ///
    /// Idempotent: reapplying the same index does not duplicate.
    async fn append_row_result(
        &self,
        job_id: Uuid,
        index: usize,
        result: &RowResult,
    ) -> Result<(), StoreError>;

    /// Move a job to its terminal state. Guarded: a job that is already
    /// `Completed` or `Failed` is never mutated again.
    async fn finalize_job(&self, job_id: Uuid, outcome: &JobOutcome) -> Result<(), StoreError>;

    /// Upsert the persisted product record keyed by serial number.
    async fn upsert_product(&self, result: &RowResult) -> Result<(), StoreError>;
}

pub mod queries;
pub mod store;
