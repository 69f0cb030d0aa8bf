//! # Notifications Endpoint Handlers
//!
//! Listing derived notifications and the read/unread lifecycle.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::notification::Model as Notification;
use crate::repositories::NotificationRepository;
use crate::server::AppState;

/// Query parameters for the notification listing
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct NotificationQueryParams {
    /// Only return unread notifications (default: false)
    pub unread_only: Option<bool>,
}

/// Notification representation for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationInfo {
    pub id: Uuid,
    pub kind: String,
    pub priority: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    /// External id of the originating publication, when kind is publication
    pub source_external_id: Option<i64>,
    pub read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

impl From<Notification> for NotificationInfo {
    fn from(model: Notification) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            priority: model.priority,
            title: model.title,
            message: model.message,
            link: model.link,
            source_external_id: model.source_external_id,
            read: model.read,
            read_at: model.read_at.map(|t| t.to_rfc3339()),
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Response payload for the notification listing
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub count: usize,
    pub results: Vec<NotificationInfo>,
}

/// List notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    params(NotificationQueryParams),
    responses(
        (status = 200, description = "Notifications", body = NotificationListResponse)
    ),
    tag = "notifications"
)]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<NotificationQueryParams>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let rows = NotificationRepository::new(&state.db)
        .list(params.unread_only.unwrap_or(false))
        .await?;

    Ok(Json(NotificationListResponse {
        count: rows.len(),
        results: rows.into_iter().map(Into::into).collect(),
    }))
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification identifier")),
    responses(
        (status = 200, description = "Notification updated", body = NotificationInfo),
        (status = 404, description = "Notification not found", body = ApiError)
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationInfo>, ApiError> {
    let updated = NotificationRepository::new(&state.db).mark_read(id).await?;
    Ok(Json(updated.into()))
}

/// Mark one notification as unread
#[utoipa::path(
    post,
    path = "/notifications/{id}/unread",
    params(("id" = Uuid, Path, description = "Notification identifier")),
    responses(
        (status = 200, description = "Notification updated", body = NotificationInfo),
        (status = 404, description = "Notification not found", body = ApiError)
    ),
    tag = "notifications"
)]
pub async fn mark_unread(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationInfo>, ApiError> {
    let updated = NotificationRepository::new(&state.db)
        .mark_unread(id)
        .await?;
    Ok(Json(updated.into()))
}
