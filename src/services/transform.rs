use async_trait::async_trait;
use image::imageops::FilterType;
use reqwest::Client;
use std::path::PathBuf;

/// JPEG re-encode quality for compressed output images.
const JPEG_QUALITY: u8 = 50;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns one source image URL into a retrievable processed-asset URL.
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    async fn transform(&self, url: &str) -> Result<String, TransformError>;
}

/// Fetches a source image, resizes it to half its dimensions, re-encodes it
/// as JPEG, and writes it to a local directory served by the API binary.
pub struct LocalImageTransformer {
    http: Client,
    image_dir: PathBuf,
    public_base_url: String,
}

impl LocalImageTransformer {
    pub fn new(image_dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            http: Client::new(),
            image_dir: image_dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageTransformer for LocalImageTransformer {
    async fn transform(&self, url: &str) -> Result<String, TransformError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(TransformError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        let bytes = response.bytes().await?;

        let decoded = image::load_from_memory(&bytes)?;
        let (width, height) = (decoded.width(), decoded.height());
        let resized = decoded.resize_exact(
            (width / 2).max(1),
            (height / 2).max(1),
            FilterType::Triangle,
        );

        // JPEG has no alpha channel
        let rgb = image::DynamicImage::ImageRgb8(resized.to_rgb8());
        let mut encoded = Vec::new();
        rgb.write_with_encoder(image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut encoded,
            JPEG_QUALITY,
        ))?;

        let file_name = processed_file_name(url);
        tokio::fs::create_dir_all(&self.image_dir).await?;
        let output_path = self.image_dir.join(&file_name);
        tokio::fs::write(&output_path, &encoded).await?;

        tracing::debug!(
            source = %url,
            output = %output_path.display(),
            original_bytes = bytes.len(),
            compressed_bytes = encoded.len(),
            "Image processed"
        );

        Ok(format!("{}/images/{}", self.public_base_url, file_name))
    }
}

/// Output file name for a source URL: `processed_` plus the URL's final path
/// segment with any query string stripped.
fn processed_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let base = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("processed_{}", base)
}
