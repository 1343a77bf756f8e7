use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobStatus;

/// Response from POST /upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub request_id: Uuid,
}

/// Response from GET /status/{request_id}.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub request_id: Uuid,
    pub status: JobStatus,
    pub output_path: Option<String>,
    pub error: Option<String>,
}

/// Error body for rejected requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Payload POSTed to the configured webhook when a job reaches a terminal state.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub request_id: Uuid,
    pub status: JobStatus,
    pub output_path: Option<String>,
}
