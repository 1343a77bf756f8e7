use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Optional for worker processes.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string for job queue
    pub redis_url: String,

    /// Outbound completion webhook URL. Notification is skipped when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Directory for output CSV artifacts
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory for processed images, served by the API binary at /images
    #[serde(default = "default_image_dir")]
    pub image_dir: String,

    /// Public base URL under which processed images are retrievable
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Maximum rows of one job processed concurrently
    #[serde(default = "default_max_concurrent_rows")]
    pub max_concurrent_rows: usize,

    /// Hard timeout per image fetch, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_output_dir() -> String {
    "outputs".to_string()
}

fn default_image_dir() -> String {
    "images/processed".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_max_concurrent_rows() -> usize {
    16
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
