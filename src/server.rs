//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Comunica
//! Hub API.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::comunica::CommunicationSource;
use crate::config::AppConfig;
use crate::handlers;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub source: Arc<dyn CommunicationSource>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/publications/search", get(handlers::publications::search))
        .route(
            "/publications/today",
            get(handlers::publications::search_today),
        )
        .route(
            "/publications",
            get(handlers::publications::list).delete(handlers::publications::delete_all),
        )
        .route(
            "/publications/delete",
            post(handlers::publications::delete_many),
        )
        .route(
            "/publications/{external_id}",
            get(handlers::publications::get_one).delete(handlers::publications::delete_one),
        )
        .route(
            "/history",
            get(handlers::history::list).delete(handlers::history::clear),
        )
        .route("/history/{id}", get(handlers::history::detail))
        .route("/notifications", get(handlers::notifications::list))
        .route(
            "/notifications/{id}/read",
            post(handlers::notifications::mark_read),
        )
        .route(
            "/notifications/{id}/unread",
            post(handlers::notifications::mark_unread),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
    source: Arc<dyn CommunicationSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState {
        config: Arc::new(config),
        db,
        source,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server listening on: {}", addr);
    println!("Running in profile: {}", profile);

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::publications::search,
        crate::handlers::publications::search_today,
        crate::handlers::publications::list,
        crate::handlers::publications::get_one,
        crate::handlers::publications::delete_one,
        crate::handlers::publications::delete_many,
        crate::handlers::publications::delete_all,
        crate::handlers::history::list,
        crate::handlers::history::detail,
        crate::handlers::history::clear,
        crate::handlers::notifications::list,
        crate::handlers::notifications::mark_read,
        crate::handlers::notifications::mark_unread,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::handlers::publications::PublicationInfo,
            crate::handlers::publications::RunReportResponse,
            crate::handlers::publications::RunFailureResponse,
            crate::handlers::publications::PublicationListResponse,
            crate::handlers::publications::DeleteBody,
            crate::handlers::publications::BulkDeleteBody,
            crate::handlers::publications::DeleteResponse,
            crate::handlers::history::SearchRunInfo,
            crate::handlers::history::HistoryPage,
            crate::handlers::history::SearchRunDetail,
            crate::handlers::history::ClearResponse,
            crate::handlers::notifications::NotificationInfo,
            crate::handlers::notifications::NotificationListResponse,
            crate::fetcher::QueryFailure,
            crate::error::ApiError,
        )
    ),
    info(
        title = "Comunica Hub API",
        description = "Aggregation service for judicial publications",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
