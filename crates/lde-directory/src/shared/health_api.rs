//! Health Check Endpoints
//!
//! - /health - Liveness, always 200 while the process serves requests
//! - /health/ready - Readiness, pings the backing store

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::service::EntityService;

pub const SERVICE_NAME: &str = "lotus-directory-engine";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthResponse {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: SERVICE_NAME.to_string(),
            message: None,
        }
    }

    fn unavailable(message: String) -> Self {
        Self {
            status: "unavailable".to_string(),
            service: SERVICE_NAME.to_string(),
            message: Some(message),
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Readiness probe
///
/// Returns 503 when the store cannot be reached.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    )
)]
pub async fn get_readiness(State(entities): State<Arc<EntityService>>) -> Response {
    match entities.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::ok())).into_response(),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse::unavailable(e.to_string()))).into_response()
        }
    }
}

pub fn health_router(entities: Arc<EntityService>) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_health))
        .routes(routes!(get_readiness))
        .with_state(entities)
}
