//! Adapters over the managed Google/Firebase services that hold all
//! durable state: the identity directory, the document store and the
//! blob store. Each adapter is a thin reqwest client behind a trait so
//! the services can be exercised against in-memory fakes.

mod credentials;
mod firestore;
mod identity;
mod storage;

pub use credentials::{GoogleToken, ServiceAccount};
pub use firestore::{DocumentStore, Firestore};
pub use identity::{FirebaseIdentity, IdentityDirectory, IdentityError, IdentityUser};
pub use storage::{BlobStore, FirebaseStorage};

use serde_json::Value;

use crate::error::BackendError;

/// Reads the response body as JSON and turns any non-2xx status into a
/// [`BackendError`] carrying Google's `error.message` when present.
pub(crate) async fn json_or_error(
    service: &'static str,
    resp: reqwest::Response,
) -> Result<Value, BackendError> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| BackendError::new(service, e))?;
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

    if !status.is_success() {
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or(text.as_str());
        return Err(BackendError::new(service, format!("{status}: {message}")));
    }
    if body.is_null() && !text.trim().is_empty() {
        return Err(BackendError::new(service, "unparseable response body"));
    }

    Ok(body)
}
