use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::api::{ErrorResponse, StatusResponse};

/// GET /status/{request_id} — poll a batch job.
///
/// Reads the job store snapshot only; never touches in-flight processing.
pub async fn get_status(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get_job(request_id).await {
        Ok(Some(job)) => Ok(Json(StatusResponse {
            request_id,
            status: job.status,
            output_path: job.output_path,
            error: job.error,
        })),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Request ID not found".to_string(),
            }),
        )),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Status lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "status lookup failed".to_string(),
                }),
            ))
        }
    }
}
