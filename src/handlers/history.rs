//! # Search History Endpoint Handlers
//!
//! Paginated listing of aggregation runs, run detail with live-recomputed
//! publications, and ledger clearing.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::publications::PublicationInfo;
use crate::models::search_history::Model as SearchRun;
use crate::repositories::search_history::{
    CorrelationKey, DEFAULT_PAGE_SIZE, HistoryOrdering, MAX_PAGE_SIZE,
};
use crate::repositories::{PublicationRepository, SearchHistoryRepository};
use crate::server::AppState;

/// Query parameters for the history listing
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQueryParams {
    /// Page size (default 20, silently clamped to 1..=100)
    pub limit: Option<u64>,
    /// Offset into the result set
    pub offset: Option<u64>,
    /// Ordering expression: executed_at, total_found or duration_seconds,
    /// prefixed with '-' for descending. Unknown values fall back to
    /// -executed_at.
    pub order_by: Option<String>,
    /// Text or process-number query resolved against publications; restricts
    /// the listing to runs that could have found a matching publication
    pub q: Option<String>,
}

/// One recorded aggregation run
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchRunInfo {
    pub id: Uuid,
    pub executed_at: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub tribunals: Vec<String>,
    pub total_found: i32,
    pub total_new: i32,
    pub duration_seconds: Option<f64>,
}

impl From<SearchRun> for SearchRunInfo {
    fn from(model: SearchRun) -> Self {
        let tribunals = SearchHistoryRepository::tribunals_of(&model);
        Self {
            id: model.id,
            executed_at: model.executed_at.to_rfc3339(),
            period_start: model.period_start,
            period_end: model.period_end,
            tribunals,
            total_found: model.total_found,
            total_new: model.total_new,
            duration_seconds: model.duration_seconds,
        }
    }
}

/// Offset-paginated history page
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryPage {
    /// Total number of runs matching the query
    pub count: u64,
    /// Offset of the next page, absent on the last page
    pub next: Option<u64>,
    /// Offset of the previous page, absent on the first page
    pub previous: Option<u64>,
    pub results: Vec<SearchRunInfo>,
}

/// List recorded aggregation runs
#[utoipa::path(
    get,
    path = "/history",
    params(HistoryQueryParams),
    responses(
        (status = 200, description = "History page", body = HistoryPage)
    ),
    tag = "history"
)]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HistoryQueryParams>,
) -> Result<Json<HistoryPage>, ApiError> {
    // Out-of-range limits are clamped, never rejected.
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);
    let ordering = HistoryOrdering::parse(params.order_by.as_deref());

    let correlation = match params.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => Some(resolve_correlation(&state, q).await?),
        _ => None,
    };

    let repository = SearchHistoryRepository::new(&state.db);
    let (count, page) = repository
        .list(limit, offset, ordering, correlation.as_deref())
        .await?;

    let next = (offset + limit < count).then_some(offset + limit);
    let previous = (offset > 0).then(|| offset.saturating_sub(limit));

    Ok(Json(HistoryPage {
        count,
        next,
        previous,
        results: page.into_iter().map(Into::into).collect(),
    }))
}

/// Run detail plus all non-deleted publications within its scope
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchRunDetail {
    #[serde(flatten)]
    pub run: SearchRunInfo,
    /// Recomputed live from the run's tribunals and period
    pub publications: Vec<PublicationInfo>,
}

/// Fetch one recorded run and its correlated publications
#[utoipa::path(
    get,
    path = "/history/{id}",
    params(("id" = Uuid, Path, description = "Run identifier")),
    responses(
        (status = 200, description = "Run detail", body = SearchRunDetail),
        (status = 404, description = "Run not found", body = ApiError)
    ),
    tag = "history"
)]
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SearchRunDetail>, ApiError> {
    let run = SearchHistoryRepository::new(&state.db).detail(id).await?;

    let tribunals = SearchHistoryRepository::tribunals_of(&run);
    let publications = PublicationRepository::new(&state.db)
        .find_by_date_range_and_tribunals(&tribunals, run.period_start, run.period_end, false)
        .await?;

    Ok(Json(SearchRunDetail {
        run: run.into(),
        publications: publications.into_iter().map(Into::into).collect(),
    }))
}

/// Response for the ledger clear operation
#[derive(Debug, Serialize, ToSchema)]
pub struct ClearResponse {
    pub deleted: u64,
}

/// Irreversibly delete the whole run ledger
#[utoipa::path(
    delete,
    path = "/history",
    responses(
        (status = 200, description = "Ledger cleared", body = ClearResponse)
    ),
    tag = "history"
)]
pub async fn clear(State(state): State<AppState>) -> Result<Json<ClearResponse>, ApiError> {
    let deleted = SearchHistoryRepository::new(&state.db).clear().await?;
    Ok(Json(ClearResponse { deleted }))
}

/// Resolve a text query into (tribunal, availability date) pairs from
/// matching non-deleted publications.
async fn resolve_correlation(
    state: &AppState,
    query: &str,
) -> Result<Vec<CorrelationKey>, ApiError> {
    let active = PublicationRepository::new(&state.db).all_active().await?;
    let matching = crate::search::filter_publications(active, query);

    Ok(matching
        .into_iter()
        .map(|p| CorrelationKey {
            tribunal: p.tribunal,
            availability_date: p.availability_date,
        })
        .collect())
}
