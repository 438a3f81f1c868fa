//! Service-account credentials and the OAuth bearer token shared by
//! every Firebase adapter.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::BackendError;
use crate::GetField;

const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The fields of a Firebase service-account JSON file that we use.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub private_key: String,
    pub client_email: String,
    pub token_uri: String,
}

impl ServiceAccount {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

struct TokenInner {
    http: reqwest::Client,
    account: ServiceAccount,
    key: EncodingKey,
    // never held across an await; a lost race just fetches twice
    cached: Mutex<Option<CachedToken>>,
}

/// Signs a JWT assertion with the service-account key and exchanges it
/// for an access token, cached until shortly before expiry. Cloneable
/// handle, shared by all adapters.
#[derive(Clone)]
pub struct GoogleToken {
    inner: Arc<TokenInner>,
}

impl GoogleToken {
    pub fn new(http: reqwest::Client, account: ServiceAccount) -> anyhow::Result<Self> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;
        Ok(Self {
            inner: Arc::new(TokenInner {
                http,
                account,
                key,
                cached: Mutex::new(None),
            }),
        })
    }

    pub async fn bearer(&self) -> Result<String, BackendError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();

        if let Ok(guard) = self.inner.cached.lock() {
            if let Some(token) = guard.as_ref() {
                if token.expires_at - 60 > now {
                    return Ok(token.value.clone());
                }
            }
        }

        let assertion = self.sign_assertion(now)?;
        let resp = self
            .inner
            .http
            .post(&self.inner.account.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| BackendError::new("oauth", e))?;

        let body: Value = super::json_or_error("oauth", resp).await?;
        let value = body
            .get_str_field("access_token")
            .map_err(|e| BackendError::new("oauth", e))?;
        let expires_in = body
            .get("expires_in")
            .and_then(Value::as_i64)
            .unwrap_or(3600);

        if let Ok(mut guard) = self.inner.cached.lock() {
            *guard = Some(CachedToken {
                value: value.clone(),
                expires_at: now + expires_in,
            });
        }

        Ok(value)
    }

    fn sign_assertion(&self, now: i64) -> Result<String, BackendError> {
        let claims = Claims {
            iss: &self.inner.account.client_email,
            scope: SCOPE,
            aud: &self.inner.account.token_uri,
            iat: now,
            exp: now + 3600,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.inner.key)
            .map_err(|e| BackendError::new("oauth", e))
    }
}
