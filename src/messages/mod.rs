mod received;
mod send;

use std::sync::Arc;

use axum::{routing::{get, post}, Router};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::error::AppResult;
use crate::firebase::DocumentStore;
use crate::AppState;

pub const MESSAGES_COLLECTION: &str = "messages";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-message", post(send::send_message))
        .route("/received-messages", get(received::received_messages))
}

/// One document of the `messages` collection. Neither UID is checked
/// against the directory; a message to nobody is stored all the same.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender_uid: String,
    pub receiver_uid: String,
    pub text: String,
    pub timestamp: String,
}

/// What a receiver sees when listing their inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub sender_uid: String,
    pub text: String,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn DocumentStore>,
}

impl MessageService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn send(&self, sender_uid: String, receiver_uid: String, text: String) -> AppResult<()> {
        let message = Message {
            sender_uid,
            receiver_uid,
            text,
            timestamp: now_timestamp(),
        };
        self.store
            .add(MESSAGES_COLLECTION, &serde_json::to_value(&message)?)
            .await?;
        Ok(())
    }

    /// Messages addressed to `receiver_uid`, in no particular order.
    pub async fn list_received(&self, receiver_uid: &str) -> AppResult<Vec<ReceivedMessage>> {
        let docs = self
            .store
            .find_by_field(MESSAGES_COLLECTION, "receiver_uid", receiver_uid, None)
            .await?;

        let mut out = Vec::with_capacity(docs.len());
        for (id, doc) in docs {
            match serde_json::from_value::<ReceivedMessage>(doc) {
                Ok(message) => out.push(message),
                Err(e) => warn!(%id, %e, "skipping malformed message document"),
            }
        }
        Ok(out)
    }
}

fn now_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
