use std::path::PathBuf;
use uuid::Uuid;

use crate::ingest::{COLUMN_INPUT_URLS, COLUMN_PRODUCT_NAME, COLUMN_SERIAL};
use crate::models::product::RowResult;

/// Column header for processed image URLs in the output artifact.
pub const COLUMN_OUTPUT_URLS: &str = "Output Image Urls";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes the per-job output CSV: one row per input row, output URLs
/// comma-joined with an empty field per failed image.
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Serialize the results table to `output_{job_id}.csv` and return its path.
    pub async fn write(&self, job_id: Uuid, results: &[RowResult]) -> Result<String, ArtifactError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            COLUMN_SERIAL,
            COLUMN_PRODUCT_NAME,
            COLUMN_INPUT_URLS,
            COLUMN_OUTPUT_URLS,
        ])?;

        for result in results {
            writer.write_record([
                result.serial_number.to_string(),
                result.product_name.clone(),
                result.input_urls_joined(),
                result.output_urls_joined(),
            ])?;
        }

        let data = writer.into_inner().map_err(|e| e.into_error())?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!("output_{}.csv", job_id));
        tokio::fs::write(&path, data).await?;

        Ok(path.to_string_lossy().into_owned())
    }
}
