use async_trait::async_trait;
use redis::AsyncCommands;
use uuid::Uuid;

const QUEUE_KEY: &str = "imgbatch:jobs";
const PROCESSING_KEY: &str = "imgbatch:processing";

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("invalid job id in queue payload: {0}")]
    Payload(#[from] uuid::Error),
}

/// Hand-off seam between job submission and the worker.
#[async_trait]
pub trait JobDispatch: Send + Sync {
    async fn dispatch(&self, job_id: Uuid) -> Result<(), QueueError>;
}

/// Redis-backed job queue.
///
/// The payload is the bare job id: inputs are persisted in the job store at
/// submission time, so the worker reloads everything it needs from there.
pub struct JobQueue {
    client: redis::Client,
}

impl JobQueue {
    pub fn new(redis_url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url).map_err(QueueError::Redis)?;
        Ok(Self { client })
    }

    /// Enqueue a job for the worker.
    pub async fn enqueue(&self, job_id: Uuid) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, job_id.to_string())
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Dequeue the next job id, moving it to the processing list.
    pub async fn dequeue(&self) -> Result<Option<Uuid>, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let result: Option<String> = conn
            .rpoplpush(QUEUE_KEY, PROCESSING_KEY)
            .await
            .map_err(QueueError::Redis)?;

        match result {
            Some(payload) => Ok(Some(payload.parse()?)),
            None => Ok(None),
        }
    }

    /// Check Redis connectivity (for health checks).
    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Get the current queue depth (pending jobs).
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let depth: u64 = conn.llen(QUEUE_KEY).await.map_err(QueueError::Redis)?;
        Ok(depth)
    }

    /// Mark a job as done (remove from the processing list).
    pub async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, job_id.to_string())
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }
}

#[async_trait]
impl JobDispatch for JobQueue {
    async fn dispatch(&self, job_id: Uuid) -> Result<(), QueueError> {
        self.enqueue(job_id).await
    }
}
