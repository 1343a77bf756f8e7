use axum::response::Html;
use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use imgbatch::{
    app_state::AppState,
    config::AppConfig,
    db::{self, store::PgJobStore, JobStore},
    routes,
    services::{
        artifact::ArtifactWriter,
        notify::WebhookNotifier,
        processor::RowProcessor,
        queue::{JobDispatch, JobQueue},
        scheduler::BatchScheduler,
        transform::LocalImageTransformer,
    },
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing imgbatch server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_histogram!(
        "batch_processing_seconds",
        "Time to process one batch job end to end"
    );
    metrics::describe_counter!("batch_jobs_submitted", "Total batch jobs submitted");
    metrics::describe_counter!("batch_jobs_completed", "Total batch jobs completed");
    metrics::describe_counter!("batch_jobs_failed", "Total batch jobs that failed");
    metrics::describe_counter!(
        "image_transforms_failed",
        "Total per-URL image transforms that failed"
    );
    metrics::describe_gauge!(
        "batch_queue_depth",
        "Current number of pending jobs in the queue"
    );

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize Redis job queue
    tracing::info!("Connecting to Redis job queue");
    let queue = Arc::new(JobQueue::new(&config.redis_url).expect("Failed to initialize job queue"));

    // Wire up the batch engine
    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(db_pool.clone()));
    let transformer = Arc::new(LocalImageTransformer::new(
        &config.image_dir,
        &config.public_base_url,
    ));
    let processor = Arc::new(RowProcessor::new(
        transformer,
        Duration::from_secs(config.fetch_timeout_secs),
    ));
    let scheduler = BatchScheduler::new(
        store.clone(),
        queue.clone() as Arc<dyn JobDispatch>,
        processor,
        ArtifactWriter::new(&config.output_dir),
        Arc::new(WebhookNotifier::new(config.webhook_url.clone())),
        config.max_concurrent_rows,
    );

    // Create shared application state
    let state = AppState::new(db_pool, store, queue, scheduler);

    // Build API routes
    let app = Router::new()
        // Static UI (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../static/index.html")) }))
        // API endpoints
        .route("/health", get(routes::health::health_check))
        .route("/upload", post(routes::upload::upload_csv))
        .route("/status/{request_id}", get(routes::status::get_status))
        .route("/webhook", post(routes::webhook::receive_webhook))
        .with_state(state)
        // Processed images, retrievable at the URLs the transformer returns
        .nest_service("/images", ServeDir::new(&config.image_dir))
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit

    tracing::info!("Starting imgbatch on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
