// Axum API server module.
//
// Purpose: REST surface over the scoring orchestrator, with a Moka
// response cache in front (scoring is deterministic, so identical
// requests can be served from cache).
// Usage: cargo run --features api --bin api_server

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::elevation::EpqsClient;
use crate::error::ScoringError;
use crate::orchestrator::{Orchestrator, RatingRequest};
use crate::requirements::Requirements;
use crate::scorer::SoilScorer;
use crate::ssurgo::SdaClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator<SdaClient, EpqsClient>>,
    pub cache: Cache<String, serde_json::Value>,
}

impl AppState {
    pub async fn new(data_dir: &str, sda_url: &str, epqs_url: &str) -> anyhow::Result<AppState> {
        tracing::info!("Loading requirement tables...");
        let requirements = Requirements::load(std::path::Path::new(data_dir))?;
        let scorer = SoilScorer::new(requirements);

        tracing::info!("Initializing upstream clients...");
        let sda = SdaClient::new(sda_url, Default::default())?;
        let epqs = EpqsClient::new(epqs_url, Default::default())?;

        tracing::info!("Initializing Moka cache...");
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build();

        Ok(AppState {
            orchestrator: Arc::new(Orchestrator::new(scorer, sda, epqs)),
            cache,
        })
    }
}

/// Build the router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/rating", post(rate_point))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn rate_point(
    State(state): State<AppState>,
    Json(request): Json<RatingRequest>,
) -> Response {
    let cache_key = match serde_json::to_string(&request) {
        Ok(key) => key,
        Err(err) => {
            return error_response(ScoringError::InvalidRequest(err.to_string()));
        }
    };

    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!("Cache hit for rating request");
        return (StatusCode::OK, Json(cached)).into_response();
    }

    match state.orchestrator.score_point(&request).await {
        Ok(response) => match serde_json::to_value(&response) {
            Ok(value) => {
                state.cache.insert(cache_key, value.clone()).await;
                (StatusCode::OK, Json(value)).into_response()
            }
            Err(err) => error_response(ScoringError::Internal(err.to_string())),
        },
        Err(err) => error_response(err),
    }
}

fn error_response(err: ScoringError) -> Response {
    let status = match &err {
        ScoringError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ScoringError::DataUnavailable(_) => StatusCode::NOT_FOUND,
        ScoringError::TransientUpstream(_) => StatusCode::BAD_GATEWAY,
        ScoringError::InvalidRequirement(_)
        | ScoringError::EmptyProfile
        | ScoringError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::debug!("Request failed: {} → {}", err, status);
    (
        status,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}
