use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::models::product::{ImageOutcome, RowRecord, RowResult};
use crate::services::transform::ImageTransformer;

/// Processes one input row by fanning out over its image URLs.
///
/// Infallible to the caller: every per-URL failure is captured in place as
/// a `Failed` outcome so the result stays index-aligned with the inputs and
/// sibling URLs keep processing.
pub struct RowProcessor {
    transformer: Arc<dyn ImageTransformer>,
    fetch_timeout: Duration,
}

impl RowProcessor {
    pub fn new(transformer: Arc<dyn ImageTransformer>, fetch_timeout: Duration) -> Self {
        Self {
            transformer,
            fetch_timeout,
        }
    }

    pub async fn process(&self, row: &RowRecord) -> RowResult {
        let outcomes = join_all(
            row.input_urls
                .iter()
                .map(|url| self.transform_one(row.serial_number, url)),
        )
        .await;

        RowResult {
            serial_number: row.serial_number,
            product_name: row.product_name.clone(),
            input_urls: row.input_urls.clone(),
            outputs: outcomes,
        }
    }

    /// Transform a single URL under a hard timeout so a hung fetch cannot
    /// wedge the whole job.
    async fn transform_one(&self, serial_number: i64, url: &str) -> ImageOutcome {
        match timeout(self.fetch_timeout, self.transformer.transform(url)).await {
            Ok(Ok(output_url)) => ImageOutcome::Processed { url: output_url },
            Ok(Err(e)) => {
                tracing::warn!(
                    serial_number,
                    url = %url,
                    error = %e,
                    "Image transform failed"
                );
                metrics::counter!("image_transforms_failed").increment(1);
                ImageOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                tracing::warn!(
                    serial_number,
                    url = %url,
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "Image transform timed out"
                );
                metrics::counter!("image_transforms_failed").increment(1);
                ImageOutcome::Failed {
                    reason: format!("timed out after {}s", self.fetch_timeout.as_secs()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::transform::TransformError;
    use async_trait::async_trait;

    /// Transformer that fails any URL containing "bad" and hangs on any URL
    /// containing "slow".
    struct FakeTransformer;

    #[async_trait]
    impl ImageTransformer for FakeTransformer {
        async fn transform(&self, url: &str) -> Result<String, TransformError> {
            if url.contains("slow") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if url.contains("bad") {
                return Err(TransformError::Status {
                    url: url.to_string(),
                    status: reqwest::StatusCode::NOT_FOUND,
                });
            }
            Ok(format!("http://localhost:3000/images/processed_{}", url))
        }
    }

    fn row(urls: &[&str]) -> RowRecord {
        RowRecord {
            serial_number: 1,
            product_name: "Widget".to_string(),
            input_urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    fn processor() -> RowProcessor {
        RowProcessor::new(Arc::new(FakeTransformer), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn outputs_align_with_inputs() {
        let result = processor().process(&row(&["a.jpg", "bad.jpg", "c.jpg"])).await;

        assert_eq!(result.outputs.len(), 3);
        assert!(result.outputs[0].is_processed());
        assert!(!result.outputs[1].is_processed());
        assert!(result.outputs[2].is_processed());
    }

    #[tokio::test]
    async fn all_failed_urls_still_produce_a_full_result() {
        let result = processor().process(&row(&["bad1.jpg", "bad2.jpg"])).await;

        assert_eq!(result.outputs.len(), 2);
        assert_eq!(result.failed_count(), 2);
        assert_eq!(result.output_urls_joined(), ",");
    }

    #[tokio::test]
    async fn hung_fetch_times_out_into_failed_outcome() {
        let result = processor().process(&row(&["slow.jpg", "ok.jpg"])).await;

        assert_eq!(result.outputs.len(), 2);
        match &result.outputs[0] {
            ImageOutcome::Failed { reason } => assert!(reason.contains("timed out")),
            other => panic!("expected timeout failure, got {:?}", other),
        }
        assert!(result.outputs[1].is_processed());
    }

    #[tokio::test]
    async fn failure_reason_is_preserved() {
        let result = processor().process(&row(&["bad.jpg"])).await;

        match &result.outputs[0] {
            ImageOutcome::Failed { reason } => assert!(reason.contains("404")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
