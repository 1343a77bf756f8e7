use imgbatch::{
    config::AppConfig,
    db::{self, store::PgJobStore, JobStore},
    services::{
        artifact::ArtifactWriter,
        notify::WebhookNotifier,
        processor::RowProcessor,
        queue::{JobDispatch, JobQueue},
        scheduler::BatchScheduler,
        transform::LocalImageTransformer,
    },
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL_MS: u64 = 1000; // 1 second

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting batch processing worker");

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize database
    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Initialize services
    tracing::info!("Initializing services");
    let queue = Arc::new(JobQueue::new(&config.redis_url).expect("Failed to initialize job queue"));

    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(db_pool));
    let transformer = Arc::new(LocalImageTransformer::new(
        &config.image_dir,
        &config.public_base_url,
    ));
    let processor = Arc::new(RowProcessor::new(
        transformer,
        Duration::from_secs(config.fetch_timeout_secs),
    ));
    let scheduler = BatchScheduler::new(
        store,
        queue.clone() as Arc<dyn JobDispatch>,
        processor,
        ArtifactWriter::new(&config.output_dir),
        Arc::new(WebhookNotifier::new(config.webhook_url.clone())),
        config.max_concurrent_rows,
    );

    tracing::info!(
        max_concurrent_rows = config.max_concurrent_rows,
        "Worker ready, starting job processing loop"
    );

    // Main processing loop
    loop {
        match process_next_job(&queue, &scheduler).await {
            Ok(true) => {
                // Job processed, check for the next one immediately
                tracing::debug!("Job processed, checking for next job");
            }
            Ok(false) => {
                // No job available, sleep before next poll
                tracing::trace!("No jobs available, sleeping");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error processing job, will retry");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
        }
    }
}

/// Process the next job from the queue.
/// Returns Ok(true) if a job was processed, Ok(false) if no job available.
async fn process_next_job(
    queue: &JobQueue,
    scheduler: &BatchScheduler,
) -> Result<bool, Box<dyn std::error::Error>> {
    // Dequeue next job id
    let job_id = match queue.dequeue().await? {
        Some(id) => id,
        None => return Ok(false), // No job available
    };

    tracing::info!(job_id = %job_id, "Processing batch job");

    if let Ok(depth) = queue.queue_depth().await {
        metrics::gauge!("batch_queue_depth").set(depth as f64);
    }

    // Drive the job to a terminal state. Per-row failures are absorbed by
    // the scheduler; an error here means the store itself is unavailable.
    scheduler.run(job_id).await?;

    // Remove from the processing list
    queue.complete(job_id).await?;

    Ok(true)
}
