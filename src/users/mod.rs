mod login;
mod register;
mod service;

use std::fmt;
use std::str::FromStr;

use axum::{routing::post, Router};
use serde::{Deserialize, Serialize};

use crate::maps::Location;
use crate::{AppError, AppState};

pub use service::{Document, Registered, Registration, RoleCheck, UserService};

pub const USERS_COLLECTION: &str = "usuarios";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/crear-usuario", post(register::crear_usuario))
        .route("/login", post(login::login))
}

/// The two account roles. An account may hold both at once; the wire
/// and stored representation is the Spanish tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "cliente")]
    Client,
    #[serde(rename = "proveedor")]
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "cliente",
            Role::Provider => "proveedor",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cliente" => Ok(Role::Client),
            "proveedor" => Ok(Role::Provider),
            other => Err(AppError::InvalidRole(other.to_owned())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document of the `usuarios` collection, keyed by UID. Field
/// names match what the original service stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub roles: Vec<Role>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "direccion", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}
