use axum::Json;

/// POST /webhook — receiver stub for completion callbacks.
///
/// Accepts any JSON payload, logs it, and acknowledges receipt.
pub async fn receive_webhook(Json(payload): Json<serde_json::Value>) -> Json<serde_json::Value> {
    tracing::info!(payload = %payload, "Webhook received");
    Json(serde_json::json!({ "status": "Webhook received" }))
}
