//! Routes: `POST {delivery_path}`, `GET /healthz`

use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use pushbridge_core::QueueBridge;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Clone)]
struct AppState {
    bridge: Arc<QueueBridge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    pub ok: bool,
    pub queue_name: String,
    pub message_id: String,
    pub job_id: String,
    pub deduplicated: bool,
}

pub fn router(bridge: Arc<QueueBridge>, delivery_path: &str) -> Router {
    Router::new()
        .route(delivery_path, post(deliver))
        .route("/healthz", get(health))
        .with_state(AppState { bridge })
        .layer(TraceLayer::new_for_http())
}

async fn deliver(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DeliveryResponse>, ApiError> {
    let outcome = state.bridge.handle_delivery(&body).await.map_err(|e| {
        warn!(error = %e, "Delivery rejected");
        ApiError(e)
    })?;

    Ok(Json(DeliveryResponse {
        ok: true,
        queue_name: outcome.queue_name.to_string(),
        message_id: outcome.message_id.to_string(),
        job_id: outcome.engine_job_id,
        deduplicated: outcome.deduplicated,
    }))
}

async fn health() -> &'static str {
    "ok"
}
