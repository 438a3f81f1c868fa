use async_trait::async_trait;
use serde_json::Value;

use super::GoogleToken;
use crate::error::BackendError;

const SERVICE: &str = "storage";

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the bytes at `path` and return a publicly reachable URL.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError>;
}

/// Blob Store over the Firebase Storage v0 upload endpoint.
pub struct FirebaseStorage {
    http: reqwest::Client,
    token: GoogleToken,
    bucket: String,
}

impl FirebaseStorage {
    pub fn new(http: reqwest::Client, token: GoogleToken, bucket: String) -> Self {
        Self { http, token, bucket }
    }
}

#[async_trait]
impl BlobStore for FirebaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let bearer = self.token.bearer().await?;
        let object = urlencoding::encode(path);
        let resp = self
            .http
            .post(format!(
                "https://firebasestorage.googleapis.com/v0/b/{}/o?name={object}",
                self.bucket
            ))
            .bearer_auth(bearer)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| BackendError::new(SERVICE, e))?;

        let body = super::json_or_error(SERVICE, resp).await?;

        let mut url = format!(
            "https://firebasestorage.googleapis.com/v0/b/{}/o/{object}?alt=media",
            self.bucket
        );
        if let Some(tokens) = body.get("downloadTokens").and_then(Value::as_str) {
            if let Some(first) = tokens.split(',').next() {
                url.push_str("&token=");
                url.push_str(first);
            }
        }
        Ok(url)
    }
}
