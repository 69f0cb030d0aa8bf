//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Comunica Hub
//! API.

use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use utoipa::ToSchema;

pub mod history;
pub mod notifications;
pub mod publications;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health response payload
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status; "ok" when the database responds
    pub status: String,
}

/// Liveness and database health check
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unavailable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    crate::db::health_check(&state.db).await.map_err(|e| {
        tracing::error!("health check failed: {:?}", e);
        ApiError::new(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database is unreachable",
        )
    })?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}
