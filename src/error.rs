use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::users::Role;

pub type AppResult<T> = Result<T, AppError>;

/// Failure of one of the external collaborators (directory, store,
/// blob storage, geocoder). Carries which service failed so the log
/// line is useful; the client only ever sees a uniform message.
#[derive(Debug, Error)]
#[error("{service}: {message}")]
pub struct BackendError {
    pub service: &'static str,
    pub message: String,
}

impl BackendError {
    pub fn new(service: &'static str, message: impl ToString) -> Self {
        Self { service, message: message.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("tipo de usuario no válido: {0}")]
    InvalidRole(String),
    #[error("el usuario ya tiene el rol {0}")]
    RoleAlreadyGranted(Role),
    #[error("no se pudo crear el usuario: {0}")]
    IdentityCreateFailed(String),
    #[error("no se pudo geocodificar la dirección")]
    GeocodeFailed,
    #[error("usuario no encontrado")]
    UserNotFound,
    #[error("el usuario no tiene datos registrados")]
    UserRecordMissing,
    #[error("el usuario no tiene el rol {wanted}")]
    RoleNotGranted { wanted: Role, granted: Vec<Role> },
    #[error("servicio externo no disponible")]
    Backend(#[from] BackendError),
    #[error("solicitud inválida: {0}")]
    BadRequest(String),
    #[error("error interno")]
    Internal(#[from] serde_json::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            InvalidRole(_) | RoleAlreadyGranted(_) | IdentityCreateFailed(_)
            | GeocodeFailed | BadRequest(_) => StatusCode::BAD_REQUEST,
            UserNotFound | UserRecordMissing => StatusCode::NOT_FOUND,
            RoleNotGranted { .. } => StatusCode::FORBIDDEN,
            Backend(_) => StatusCode::BAD_GATEWAY,
            Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Backend(e) => error!(service = e.service, message = %e.message, "collaborator call failed"),
            AppError::Internal(e) => error!(%e, "internal error"),
            _ => {}
        }

        let mut body = json!({ "detail": self.to_string() });
        if let AppError::RoleNotGranted { granted, .. } = &self {
            body["roles"] = json!(granted);
        }

        (self.status(), Json(body)).into_response()
    }
}
