//! # Publications Endpoint Handlers
//!
//! Aggregation runs (search, today) plus listing and soft deletion of stored
//! publications.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::aggregator::{Aggregator, RunParams, RunReport};
use crate::error::ApiError;
use crate::fetcher::QueryFailure;
use crate::models::publication::Model as Publication;
use crate::repositories::PublicationRepository;
use crate::server::AppState;

/// Query parameters for an aggregation run
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SearchQueryParams {
    /// Start of the availability-date window (YYYY-MM-DD)
    pub period_start: Option<String>,
    /// End of the availability-date window (YYYY-MM-DD)
    pub period_end: Option<String>,
    /// Comma-separated tribunal codes; defaults to the configured set
    pub tribunals: Option<String>,
    /// Retroactive window for notification derivation; defaults from config
    pub retroactive_days: Option<u32>,
}

/// Publication representation for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicationInfo {
    pub external_id: i64,
    pub process_number: Option<String>,
    pub tribunal: String,
    pub communication_type: String,
    pub issuing_body: String,
    pub channel: String,
    pub availability_date: NaiveDate,
    pub summary_text: String,
    pub full_text: String,
    pub official_link: Option<String>,
    pub content_hash: Option<String>,
    pub deleted: bool,
    pub created_at: String,
}

impl From<Publication> for PublicationInfo {
    fn from(model: Publication) -> Self {
        Self {
            external_id: model.external_id,
            process_number: model.process_number,
            tribunal: model.tribunal,
            communication_type: model.communication_type,
            issuing_body: model.issuing_body,
            channel: model.channel,
            availability_date: model.availability_date,
            summary_text: model.summary_text,
            full_text: model.full_text,
            official_link: model.official_link,
            content_hash: model.content_hash,
            deleted: model.deleted,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Response payload for an aggregation run
#[derive(Debug, Serialize, ToSchema)]
pub struct RunReportResponse {
    pub success: bool,
    pub run_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub tribunals_queried: usize,
    pub total_found: usize,
    pub total_new: usize,
    pub notifications_created: usize,
    pub publications: Vec<PublicationInfo>,
    /// Per-tribunal per-query failures; absent when every query succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<QueryFailure>>,
    pub duration_seconds: f64,
}

impl From<RunReport> for RunReportResponse {
    fn from(report: RunReport) -> Self {
        Self {
            success: true,
            run_id: report.run_id,
            period_start: report.period_start,
            period_end: report.period_end,
            tribunals_queried: report.tribunals_queried,
            total_found: report.total_found,
            total_new: report.total_new,
            notifications_created: report.notifications_created,
            publications: report.publications.into_iter().map(Into::into).collect(),
            errors: if report.errors.is_empty() {
                None
            } else {
                Some(report.errors)
            },
            duration_seconds: report.duration_seconds,
        }
    }
}

/// Failure envelope for a run that could not complete
#[derive(Debug, Serialize, ToSchema)]
pub struct RunFailureResponse {
    pub success: bool,
    /// What stopped the run
    pub message: String,
}

/// Fetch publications from the upstream source and store the new ones
#[utoipa::path(
    get,
    path = "/publications/search",
    params(SearchQueryParams),
    responses(
        (status = 200, description = "Run completed", body = RunReportResponse),
        (status = 400, description = "Missing or invalid parameters", body = ApiError),
        (status = 500, description = "Run failed mid-flight", body = RunFailureResponse)
    ),
    tag = "publications"
)]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Response, ApiError> {
    let period_start = parse_required_date(params.period_start.as_deref(), "period_start")?;
    let period_end = parse_required_date(params.period_end.as_deref(), "period_end")?;
    if period_end < period_start {
        return Err(ApiError::validation(
            "period_end must not be before period_start",
        ));
    }

    let tribunals = resolve_tribunals(params.tribunals.as_deref(), &state);
    let retroactive_days = params
        .retroactive_days
        .unwrap_or(state.config.default_retroactive_days);

    Ok(run_aggregation(&state, period_start, period_end, tribunals, retroactive_days).await)
}

/// Fetch today's publications across the configured tribunals
#[utoipa::path(
    get,
    path = "/publications/today",
    params(
        ("tribunals" = Option<String>, Query, description = "Comma-separated tribunal codes"),
        ("retroactive_days" = Option<u32>, Query, description = "Retroactive window override")
    ),
    responses(
        (status = 200, description = "Run completed", body = RunReportResponse),
        (status = 500, description = "Run failed mid-flight", body = RunFailureResponse)
    ),
    tag = "publications"
)]
pub async fn search_today(
    State(state): State<AppState>,
    Query(params): Query<SearchQueryParams>,
) -> Response {
    let today = Utc::now().date_naive();
    let tribunals = resolve_tribunals(params.tribunals.as_deref(), &state);
    let retroactive_days = params
        .retroactive_days
        .unwrap_or(state.config.default_retroactive_days);

    run_aggregation(&state, today, today, tribunals, retroactive_days).await
}

/// Runs the pipeline. A failure mid-run still reports `success: false` with
/// the underlying message instead of an opaque internal error.
async fn run_aggregation(
    state: &AppState,
    period_start: NaiveDate,
    period_end: NaiveDate,
    tribunals: Vec<String>,
    retroactive_days: u32,
) -> Response {
    let aggregator = Aggregator::new(
        &state.db,
        state.source.clone(),
        state.config.oab_number.clone(),
        state.config.advocate_name.clone(),
    );

    let result = aggregator
        .run(RunParams {
            period_start,
            period_end,
            tribunals,
            retroactive_days,
        })
        .await;

    match result {
        Ok(report) => Json(RunReportResponse::from(report)).into_response(),
        Err(error) => {
            tracing::error!(%error, "aggregation run failed");
            let body = RunFailureResponse {
                success: false,
                message: error.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Query parameters for listing stored publications
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListQueryParams {
    /// Start of the availability-date window (YYYY-MM-DD)
    pub period_start: Option<String>,
    /// End of the availability-date window (YYYY-MM-DD)
    pub period_end: Option<String>,
    /// Comma-separated tribunal codes; defaults to the configured set
    pub tribunals: Option<String>,
    /// Include soft-deleted rows (default: false)
    pub include_deleted: Option<bool>,
    /// Text or process-number filter
    pub q: Option<String>,
}

/// Response payload for the publication listing
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicationListResponse {
    pub count: usize,
    pub results: Vec<PublicationInfo>,
}

/// List stored publications
#[utoipa::path(
    get,
    path = "/publications",
    params(ListQueryParams),
    responses(
        (status = 200, description = "Stored publications", body = PublicationListResponse),
        (status = 400, description = "Invalid parameters", body = ApiError)
    ),
    tag = "publications"
)]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListQueryParams>,
) -> Result<Json<PublicationListResponse>, ApiError> {
    let repository = PublicationRepository::new(&state.db);

    let rows = match (params.period_start.as_deref(), params.period_end.as_deref()) {
        (Some(start), Some(end)) => {
            let start = parse_required_date(Some(start), "period_start")?;
            let end = parse_required_date(Some(end), "period_end")?;
            let tribunals = resolve_tribunals(params.tribunals.as_deref(), &state);
            repository
                .find_by_date_range_and_tribunals(
                    &tribunals,
                    start,
                    end,
                    params.include_deleted.unwrap_or(false),
                )
                .await?
        }
        (None, None) => repository.all_active().await?,
        _ => {
            return Err(ApiError::validation(
                "period_start and period_end must be provided together",
            ));
        }
    };

    let rows = match params.q.as_deref() {
        Some(q) if !q.trim().is_empty() => crate::search::filter_publications(rows, q),
        _ => rows,
    };

    Ok(Json(PublicationListResponse {
        count: rows.len(),
        results: rows.into_iter().map(Into::into).collect(),
    }))
}

/// Body for soft-delete operations
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeleteBody {
    /// Operator-supplied reason recorded on the deleted rows
    pub reason: Option<String>,
}

/// Body for the bulk soft-delete operation
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkDeleteBody {
    pub external_ids: Vec<i64>,
    pub reason: Option<String>,
}

/// Result of a soft-delete operation
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// Soft-delete one publication by external id
#[utoipa::path(
    delete,
    path = "/publications/{external_id}",
    params(("external_id" = i64, Path, description = "Upstream publication id")),
    request_body = DeleteBody,
    responses(
        (status = 200, description = "Publication soft-deleted", body = DeleteResponse),
        (status = 404, description = "Not found or already deleted", body = ApiError)
    ),
    tag = "publications"
)]
pub async fn delete_one(
    State(state): State<AppState>,
    Path(external_id): Path<i64>,
    body: Option<Json<DeleteBody>>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let reason = body.and_then(|Json(b)| b.reason);
    PublicationRepository::new(&state.db)
        .soft_delete(external_id, reason)
        .await?;
    Ok(Json(DeleteResponse { deleted: 1 }))
}

/// Soft-delete a batch of publications
#[utoipa::path(
    post,
    path = "/publications/delete",
    request_body = BulkDeleteBody,
    responses(
        (status = 200, description = "Publications soft-deleted", body = DeleteResponse),
        (status = 400, description = "Empty id list", body = ApiError),
        (status = 404, description = "No active publication matched", body = ApiError)
    ),
    tag = "publications"
)]
pub async fn delete_many(
    State(state): State<AppState>,
    Json(body): Json<BulkDeleteBody>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if body.external_ids.is_empty() {
        return Err(ApiError::validation("external_ids must not be empty"));
    }

    let deleted = PublicationRepository::new(&state.db)
        .soft_delete_many(&body.external_ids, body.reason)
        .await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// Soft-delete every publication and clear the search history
#[utoipa::path(
    delete,
    path = "/publications",
    request_body = DeleteBody,
    responses(
        (status = 200, description = "All publications soft-deleted", body = DeleteResponse)
    ),
    tag = "publications"
)]
pub async fn delete_all(
    State(state): State<AppState>,
    body: Option<Json<DeleteBody>>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let reason = body.and_then(|Json(b)| b.reason);
    let deleted = PublicationRepository::new(&state.db)
        .soft_delete_all(reason)
        .await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// Fetch a single publication by its external id
#[utoipa::path(
    get,
    path = "/publications/{external_id}",
    params(
        ("external_id" = i64, Path, description = "Upstream publication id"),
        ("include_deleted" = Option<bool>, Query, description = "Include soft-deleted rows (default: true)")
    ),
    responses(
        (status = 200, description = "Publication", body = PublicationInfo),
        (status = 404, description = "Not found", body = ApiError)
    ),
    tag = "publications"
)]
pub async fn get_one(
    State(state): State<AppState>,
    Path(external_id): Path<i64>,
    Query(params): Query<GetQueryParams>,
) -> Result<Json<PublicationInfo>, ApiError> {
    let model = PublicationRepository::new(&state.db)
        .get_by_external_id(external_id, params.include_deleted.unwrap_or(true))
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("publication with external id {} not found", external_id))
        })?;
    Ok(Json(model.into()))
}

/// Query parameters for the single-publication lookup
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct GetQueryParams {
    /// Include soft-deleted rows; defaults to true so notifications resolve
    pub include_deleted: Option<bool>,
}

fn parse_required_date(raw: Option<&str>, field: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.filter(|s| !s.trim().is_empty()).ok_or_else(|| {
        ApiError::validation(format!("{} is required (YYYY-MM-DD)", field))
    })?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{} must be a YYYY-MM-DD date", field)))
}

fn resolve_tribunals(raw: Option<&str>, state: &AppState) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
    })
    .filter(|v| !v.is_empty())
    .unwrap_or_else(|| state.config.default_tribunals.clone())
}
