use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use super::GoogleToken;
use crate::error::BackendError;
use crate::GetField;

const SERVICE: &str = "identitytoolkit";

#[derive(Debug, Clone)]
pub struct IdentityUser {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The directory refused the account (duplicate email, weak
    /// password, …). Not a transport failure.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<String, IdentityError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityUser>, BackendError>;
}

/// Identity Directory over the identitytoolkit v1 project endpoints,
/// authenticated with the service-account bearer token.
pub struct FirebaseIdentity {
    http: reqwest::Client,
    token: GoogleToken,
    base: String,
}

impl FirebaseIdentity {
    pub fn new(http: reqwest::Client, token: GoogleToken, project_id: &str) -> Self {
        Self {
            http,
            token,
            base: format!("https://identitytoolkit.googleapis.com/v1/projects/{project_id}"),
        }
    }
}

#[async_trait]
impl IdentityDirectory for FirebaseIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let bearer = self.token.bearer().await?;
        let resp = self
            .http
            .post(format!("{}/accounts", self.base))
            .bearer_auth(bearer)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| BackendError::new(SERVICE, e))?;

        // 400 means the directory itself said no (EMAIL_EXISTS and
        // friends); everything else non-2xx is a backend failure.
        if resp.status() == reqwest::StatusCode::BAD_REQUEST {
            let body: Value = resp
                .json()
                .await
                .map_err(|e| BackendError::new(SERVICE, e))?;
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("rejected")
                .to_owned();
            return Err(IdentityError::Rejected(message));
        }

        let body = super::json_or_error(SERVICE, resp).await?;
        let uid = body
            .get_str_field("localId")
            .map_err(|e| BackendError::new(SERVICE, e))?;
        Ok(uid)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityUser>, BackendError> {
        let bearer = self.token.bearer().await?;
        let resp = self
            .http
            .post(format!("{}/accounts:lookup", self.base))
            .bearer_auth(bearer)
            .json(&json!({ "email": [email] }))
            .send()
            .await
            .map_err(|e| BackendError::new(SERVICE, e))?;

        let body = super::json_or_error(SERVICE, resp).await?;
        let Some(user) = body
            .get("users")
            .and_then(Value::as_array)
            .and_then(|users| users.first())
        else {
            return Ok(None);
        };

        Ok(Some(IdentityUser {
            uid: user
                .get_str_field("localId")
                .map_err(|e| BackendError::new(SERVICE, e))?,
            email: user
                .get_str_field("email")
                .map_err(|e| BackendError::new(SERVICE, e))?,
        }))
    }
}
