use std::sync::Arc;

use axum::{debug_handler, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use servihogar::{
    config::Config,
    firebase::{
        BlobStore, DocumentStore, Firestore, FirebaseIdentity, FirebaseStorage, GoogleToken,
        IdentityDirectory, ServiceAccount,
    },
    maps::{self, Geocoder, GoogleMaps},
    messages::{self, MessageService},
    users::{self, UserService},
    AppState,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let account = ServiceAccount::load(&config.credentials_path)?;
    let bucket = config
        .storage_bucket
        .clone()
        .unwrap_or_else(|| format!("{}.appspot.com", account.project_id));

    let http = reqwest::Client::new();
    let token = GoogleToken::new(http.clone(), account.clone())?;

    let identity: Arc<dyn IdentityDirectory> =
        Arc::new(FirebaseIdentity::new(http.clone(), token.clone(), &account.project_id));
    let store: Arc<dyn DocumentStore> =
        Arc::new(Firestore::new(http.clone(), token.clone(), &account.project_id));
    let blobs: Arc<dyn BlobStore> = Arc::new(FirebaseStorage::new(http.clone(), token, bucket));
    let geocoder: Arc<dyn Geocoder> = Arc::new(GoogleMaps::new(http, config.maps_api_key.clone()));

    let app_state = AppState {
        users: UserService::new(identity, store.clone(), geocoder.clone(), blobs),
        messages: MessageService::new(store),
        geocoder,
    };

    if config.startup_probe {
        match app_state.users.probe_store().await {
            Ok(()) => info!("firestore reachable"),
            Err(e) => warn!(error = %e, "firestore probe failed"),
        }
    }

    // the original allowed every origin, method and header
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/healthcheck", get(healthcheck))
        .merge(users::router())
        .merge(messages::router())
        .merge(maps::router())
        .with_state(app_state)
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[debug_handler]
async fn healthcheck() -> impl IntoResponse {
    Json(json!({ "message": "API en funcionamiento" }))
}
