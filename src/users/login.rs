use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::UserService;
use crate::error::AppResult;
use crate::AppState;

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    email: String,
    // accepted for wire compatibility; never checked against the directory
    #[allow(dead_code)]
    password: Option<String>,
    rol_deseado: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(users): State<UserService>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let check = users.check_role(&req.email, &req.rol_deseado).await?;
    Ok(Json(json!({
        "message": "Inicio de sesión exitoso",
        "uid": check.uid,
        "email": check.email,
        "tipo_usuario": check.role,
    })))
}
