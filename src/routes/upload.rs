use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::ingest;
use crate::models::api::{ErrorResponse, UploadResponse};
use crate::services::scheduler::SubmitError;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// POST /upload — submit a product CSV for batch processing.
///
/// The CSV is parsed and validated synchronously; on acceptance the job id
/// is returned immediately and all image work happens in the worker.
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut csv_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("failed to read file field: {}", e)))?;
            csv_data = Some(data.to_vec());
        }
    }

    let csv_data = csv_data.ok_or_else(|| bad_request("missing 'file' field"))?;

    let rows = ingest::parse_rows(&csv_data).map_err(|e| bad_request(e.to_string()))?;

    let request_id = state.scheduler.submit(rows).await.map_err(|e| match e {
        SubmitError::EmptySubmission => bad_request(e.to_string()),
        other => {
            tracing::error!(error = %other, "Failed to accept batch submission");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to accept submission".to_string(),
                }),
            )
        }
    })?;

    Ok(Json(UploadResponse { request_id }))
}
