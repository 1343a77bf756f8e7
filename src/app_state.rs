use sqlx::PgPool;
use std::sync::Arc;

use crate::db::JobStore;
use crate::services::{queue::JobQueue, scheduler::BatchScheduler};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub store: Arc<dyn JobStore>,
    pub queue: Arc<JobQueue>,
    pub scheduler: Arc<BatchScheduler>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        store: Arc<dyn JobStore>,
        queue: Arc<JobQueue>,
        scheduler: BatchScheduler,
    ) -> Self {
        Self {
            db,
            store,
            queue,
            scheduler: Arc::new(scheduler),
        }
    }
}
