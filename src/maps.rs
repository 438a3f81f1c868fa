//! Geocoding and distance lookups against the Google Maps web APIs.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{debug_handler, extract::{Query, State}, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;
use crate::{AppResult, AppState, GetField};

const SERVICE: &str = "maps";
const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DISTANCE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// A latitude/longitude pair, both as geocoder output and as the
/// `location` field of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistanceLeg {
    pub distance: String,
    pub meters: i64,
    pub duration: String,
    pub seconds: i64,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Candidate coordinates for a free-text address, best match first.
    /// An unknown address is an empty list, not an error.
    async fn geocode(&self, address: &str) -> Result<Vec<Location>, BackendError>;
    /// Driving distance between two free-text places; `None` when the
    /// matrix cannot resolve a route.
    async fn distance(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Option<DistanceLeg>, BackendError>;
}

pub struct GoogleMaps {
    http: reqwest::Client,
    api_key: String,
}

impl GoogleMaps {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, BackendError> {
        self.http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| BackendError::new(SERVICE, e))?
            .json()
            .await
            .map_err(|e| BackendError::new(SERVICE, e))
    }
}

#[async_trait]
impl Geocoder for GoogleMaps {
    async fn geocode(&self, address: &str) -> Result<Vec<Location>, BackendError> {
        let body = self
            .get_json(GEOCODE_URL, &[("address", address), ("key", &self.api_key)])
            .await?;

        match body.get("status").and_then(Value::as_str) {
            Some("OK") => {}
            Some("ZERO_RESULTS") => return Ok(Vec::new()),
            other => {
                return Err(BackendError::new(
                    SERVICE,
                    format!("geocode status {other:?}"),
                ));
            }
        }

        let results = body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        results
            .iter()
            .map(|result| {
                let location = result.get_obj_field("geometry")?.get_obj_field("location")?;
                Ok(Location {
                    lat: location.get_f64_field("lat")?,
                    lng: location.get_f64_field("lng")?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| BackendError::new(SERVICE, e))
    }

    async fn distance(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Option<DistanceLeg>, BackendError> {
        let body = self
            .get_json(
                DISTANCE_URL,
                &[
                    ("origins", origin),
                    ("destinations", destination),
                    ("key", &self.api_key),
                ],
            )
            .await?;

        if body.get("status").and_then(Value::as_str) != Some("OK") {
            return Err(BackendError::new(
                SERVICE,
                format!("distance status {:?}", body.get("status")),
            ));
        }

        let Some(element) = body.pointer("/rows/0/elements/0") else {
            return Ok(None);
        };
        if element.get("status").and_then(Value::as_str) != Some("OK") {
            return Ok(None);
        }

        let read = |e: &Value, part: &str| -> anyhow::Result<(String, i64)> {
            let part = e.get_obj_field(part)?;
            let text = part.get_str_field("text")?;
            let value = part
                .get("value")
                .and_then(Value::as_i64)
                .ok_or_else(|| anyhow::anyhow!("expected numeric value in {part}"))?;
            Ok((text, value))
        };

        let (distance, meters) =
            read(element, "distance").map_err(|e| BackendError::new(SERVICE, e))?;
        let (duration, seconds) =
            read(element, "duration").map_err(|e| BackendError::new(SERVICE, e))?;

        Ok(Some(DistanceLeg {
            distance,
            meters,
            duration,
            seconds,
        }))
    }
}

#[derive(Deserialize)]
pub(crate) struct DistanceQuery {
    origen: String,
    destino: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/distancia", get(distancia))
}

#[debug_handler(state = AppState)]
pub(crate) async fn distancia(
    Query(DistanceQuery { origen, destino }): Query<DistanceQuery>,
    State(geocoder): State<Arc<dyn Geocoder>>,
) -> AppResult<Json<DistanceLeg>> {
    let leg = geocoder
        .distance(&origen, &destino)
        .await?
        .ok_or_else(|| crate::AppError::BadRequest("sin ruta entre origen y destino".to_owned()))?;
    Ok(Json(leg))
}
