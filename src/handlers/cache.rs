use axum::{extract::State, http::HeaderMap, Json};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::errors::AppError;
use crate::handlers::AppState;

pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Drops every cached series. Requires `Authorization: Bearer <cache.admin_key>`.
pub async fn invalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let Some(expected) = state.admin_key_hash.as_deref() else {
        return Err(AppError::forbidden("Cache invalidation is disabled"));
    };

    let presented = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented.map(hash_key).as_deref() != Some(expected) {
        tracing::warn!("Rejected cache invalidation with missing or wrong key");
        return Err(AppError::unauthorized("Invalid or missing admin key"));
    }

    let removed = state.pipeline.cache().invalidate_all().await;
    tracing::info!(removed, "Series cache invalidated");
    Ok(Json(json!({ "invalidated": removed })))
}
