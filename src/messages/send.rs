use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::MessageService;
use crate::error::AppResult;
use crate::AppState;

#[derive(Deserialize)]
pub(crate) struct SendMessageRequest {
    sender_uid: String,
    receiver_uid: String,
    text: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn send_message(
    State(messages): State<MessageService>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<Value>> {
    messages
        .send(req.sender_uid, req.receiver_uid, req.text)
        .await?;
    Ok(Json(json!({ "message": "Mensaje enviado con éxito" })))
}
