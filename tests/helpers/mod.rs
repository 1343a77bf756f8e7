//! Test helper utilities for E2E testing

use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

/// Response from POST /upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub request_id: Uuid,
}

/// Response from GET /status/{request_id}
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub request_id: Uuid,
    pub status: String,
    pub output_path: Option<String>,
    pub error: Option<String>,
}

/// Upload a CSV to the submission endpoint
pub async fn upload_csv(
    client: &reqwest::Client,
    base_url: &str,
    csv: &str,
) -> Result<UploadResponse, Box<dyn std::error::Error + Send + Sync>> {
    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(csv.as_bytes().to_vec())
            .file_name("products.csv")
            .mime_str("text/csv")?,
    );

    let response = client
        .post(format!("{}/upload", base_url))
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await?;
        return Err(format!("Upload failed with status {}: {}", status, error_text).into());
    }

    let body = response.json::<UploadResponse>().await?;
    Ok(body)
}

/// Poll job status until completed or failed (with timeout)
pub async fn poll_status(
    client: &reqwest::Client,
    base_url: &str,
    request_id: &str,
    timeout_secs: u64,
) -> Result<StatusResponse, Box<dyn std::error::Error + Send + Sync>> {
    let max_attempts = timeout_secs * 2; // Poll every 500ms

    for attempt in 0..max_attempts {
        let response = client
            .get(format!("{}/status/{}", base_url, request_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Status check failed: {}", error_text).into());
        }

        let status_response = response.json::<StatusResponse>().await?;

        match status_response.status.as_str() {
            "completed" | "failed" => return Ok(status_response),
            "pending" | "processing" => {
                if attempt % 10 == 0 && attempt > 0 {
                    println!("  ... still waiting (attempt {}/{})", attempt, max_attempts);
                }
                sleep(Duration::from_millis(500)).await;
            }
            _ => {
                return Err(format!("Unknown job status: {}", status_response.status).into());
            }
        }
    }

    Err(format!("Job did not complete within {} seconds", timeout_secs).into())
}

/// Wait for the worker to finish a job (with timeout)
pub async fn wait_for_completion(
    client: &reqwest::Client,
    base_url: &str,
    request_id: &str,
) -> Result<StatusResponse, Box<dyn std::error::Error + Send + Sync>> {
    poll_status(client, base_url, request_id, 120).await
}
