use garde::Validate;
use serde::{Deserialize, Serialize};

/// One validated input row: a product and its source image URLs.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RowRecord {
    /// Caller-supplied serial number. Natural key within a batch and the
    /// upsert key for the persisted product record across batches.
    #[garde(range(min = 1))]
    pub serial_number: i64,

    #[garde(length(min = 1, max = 200))]
    pub product_name: String,

    /// Non-empty after ingest validation.
    #[garde(length(min = 1), inner(length(min = 1, max = 2048)))]
    pub input_urls: Vec<String>,
}

/// Outcome of transforming a single source URL.
///
/// A failed transform keeps its position in the row so outputs stay
/// index-aligned with inputs; the failure reason is carried for logging
/// and status inspection, and collapses to an empty field only at the
/// CSV artifact boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImageOutcome {
    Processed { url: String },
    Failed { reason: String },
}

impl ImageOutcome {
    /// Retrievable URL of the processed asset, if the transform succeeded.
    pub fn output_url(&self) -> Option<&str> {
        match self {
            ImageOutcome::Processed { url } => Some(url),
            ImageOutcome::Failed { .. } => None,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, ImageOutcome::Processed { .. })
    }
}

/// Processed outcome for one row, index-aligned with its inputs:
/// `outputs.len() == input_urls.len()` always, including total failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowResult {
    pub serial_number: i64,
    pub product_name: String,
    pub input_urls: Vec<String>,
    pub outputs: Vec<ImageOutcome>,
}

impl RowResult {
    pub fn input_urls_joined(&self) -> String {
        self.input_urls.join(",")
    }

    /// Comma-joined output URLs with an empty field per failed URL,
    /// as required by the artifact CSV and the product record.
    pub fn output_urls_joined(&self) -> String {
        self.outputs
            .iter()
            .map(|o| o.output_url().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn failed_count(&self) -> usize {
        self.outputs.iter().filter(|o| !o.is_processed()).count()
    }
}

/// Persisted product record, keyed by unique serial number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub serial_number: i64,
    pub product_name: String,
    pub input_image_urls: String,
    pub output_image_urls: String,
    pub processed: bool,
}
