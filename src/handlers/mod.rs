pub mod cache;
pub mod dashboard;
pub mod forecasts;
pub mod health;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::DashboardConfig;
use crate::pipeline::Pipeline;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub dashboard: DashboardConfig,
    /// SHA-256 of the cache admin key, if one is configured.
    pub admin_key_hash: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard::index))
        .route("/forecast.csv", get(forecasts::export_csv))
        .route("/health", get(health::health_check))
        .route("/api/v1/forecast", get(forecasts::get_forecast))
        .layer(cors)
        // added after the CORS layer so browsers get no cross-origin grant for it
        .route("/api/v1/cache/invalidate", post(cache::invalidate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
