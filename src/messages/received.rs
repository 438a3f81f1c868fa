use axum::{debug_handler, extract::{Query, State}, Json};
use serde::Deserialize;

use super::{MessageService, ReceivedMessage};
use crate::error::AppResult;
use crate::AppState;

#[derive(Deserialize)]
pub(crate) struct ReceivedQuery {
    receiver_uid: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn received_messages(
    Query(ReceivedQuery { receiver_uid }): Query<ReceivedQuery>,
    State(messages): State<MessageService>,
) -> AppResult<Json<Vec<ReceivedMessage>>> {
    Ok(Json(messages.list_received(&receiver_uid).await?))
}
