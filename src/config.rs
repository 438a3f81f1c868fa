use anyhow::Context;

/// Everything read from the environment at startup. The credential
/// file itself is parsed later by [`crate::firebase::ServiceAccount`].
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub credentials_path: String,
    /// Defaults to `{project_id}.appspot.com` when unset.
    pub storage_bucket: Option<String>,
    pub maps_api_key: String,
    pub startup_probe: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_owned()),
            credentials_path: dotenv::var("GOOGLE_APPLICATION_CREDENTIALS")
                .context("GOOGLE_APPLICATION_CREDENTIALS not set")?,
            storage_bucket: dotenv::var("STORAGE_BUCKET").ok(),
            maps_api_key: dotenv::var("GOOGLE_API_KEY")
                .context("GOOGLE_API_KEY not set")?,
            startup_probe: dotenv::var("STARTUP_PROBE").map(|v| v == "1").unwrap_or(false),
        })
    }
}
