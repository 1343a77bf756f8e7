use reqwest::Client;
use uuid::Uuid;

use crate::models::api::WebhookPayload;
use crate::models::job::JobStatus;

/// Best-effort completion webhook.
///
/// Single attempt, fired only after the job is durably finalized. Delivery
/// failure is logged and swallowed: it never changes job state and never
/// surfaces to the submission pipeline.
pub struct WebhookNotifier {
    http: Client,
    webhook_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: Client::new(),
            webhook_url,
        }
    }

    pub async fn notify(&self, job_id: Uuid, status: JobStatus, output_path: Option<&str>) {
        let Some(url) = &self.webhook_url else {
            tracing::debug!(job_id = %job_id, "No webhook URL configured, skipping notification");
            return;
        };

        let payload = WebhookPayload {
            request_id: job_id,
            status,
            output_path: output_path.map(String::from),
        };

        match self.http.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(job_id = %job_id, status = %status, "Completion webhook delivered");
            }
            Ok(response) => {
                tracing::warn!(
                    job_id = %job_id,
                    webhook_status = %response.status(),
                    "Webhook endpoint returned non-success"
                );
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Failed to deliver completion webhook");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_notifier_is_a_no_op() {
        let notifier = WebhookNotifier::new(None);
        notifier
            .notify(Uuid::new_v4(), JobStatus::Completed, Some("outputs/x.csv"))
            .await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_swallowed() {
        // Port 9 (discard) on localhost refuses the connection immediately.
        let notifier = WebhookNotifier::new(Some("http://127.0.0.1:9/webhook".to_string()));
        notifier.notify(Uuid::new_v4(), JobStatus::Failed, None).await;
    }
}
