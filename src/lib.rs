pub mod config;
pub mod error;
pub mod firebase;
pub mod maps;
pub mod messages;
pub mod users;

use std::sync::Arc;

use axum::extract::FromRef;
use serde_json::Value;

pub use error::{AppError, AppResult, BackendError};

use crate::maps::Geocoder;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub users: users::UserService,
    pub messages: messages::MessageService,
    pub geocoder: Arc<dyn Geocoder>,
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> anyhow::Result<String>;
    fn get_f64_field(&self, field: &str) -> anyhow::Result<f64>;
    fn get_obj_field(&self, field: &str) -> anyhow::Result<&Value>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> anyhow::Result<String> {
        Ok(
            self.get(field)
            .ok_or_else(|| anyhow::anyhow!("expected {field} in {self}"))?
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }

    fn get_f64_field(&self, field: &str) -> anyhow::Result<f64> {
        self.get(field)
        .ok_or_else(|| anyhow::anyhow!("expected {field} in {self}"))?
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("expected {field} in {self} to be number"))
    }

    fn get_obj_field(&self, field: &str) -> anyhow::Result<&Value> {
        self.get(field)
        .ok_or_else(|| anyhow::anyhow!("expected {field} in {self}"))
    }
}
