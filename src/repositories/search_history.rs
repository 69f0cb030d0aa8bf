//! # Search History Repository
//!
//! Append-only ledger of aggregation runs. Rows are recorded once and never
//! mutated; the only destructive operation is a full clear.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue::Set, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::search_history::{ActiveModel, Column, Entity as SearchHistory, Model};

/// Hard ceiling on page size.
pub const MAX_PAGE_SIZE: u64 = 100;
/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Sort orders accepted by the history listing. Unrecognized orderings fall
/// back to newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryOrdering {
    #[default]
    ExecutedAtDesc,
    ExecutedAtAsc,
    TotalFoundDesc,
    TotalFoundAsc,
    DurationDesc,
    DurationAsc,
}

impl HistoryOrdering {
    /// Parse an ordering expression (`executed_at`, `-total_found`, ...).
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("executed_at") => HistoryOrdering::ExecutedAtAsc,
            Some("-executed_at") => HistoryOrdering::ExecutedAtDesc,
            Some("total_found") => HistoryOrdering::TotalFoundAsc,
            Some("-total_found") => HistoryOrdering::TotalFoundDesc,
            Some("duration_seconds") => HistoryOrdering::DurationAsc,
            Some("-duration_seconds") => HistoryOrdering::DurationDesc,
            _ => HistoryOrdering::default(),
        }
    }
}

/// A (tribunal, availability date) pair from a matched publication, used to
/// restrict the run listing to runs that could have found it.
#[derive(Debug, Clone)]
pub struct CorrelationKey {
    pub tribunal: String,
    pub availability_date: NaiveDate,
}

/// Parameters for recording one completed run.
#[derive(Debug, Clone)]
pub struct NewSearchRun {
    pub executed_at: sea_orm::prelude::DateTimeWithTimeZone,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub tribunals: Vec<String>,
    pub total_found: i32,
    pub total_new: i32,
    pub duration_seconds: Option<f64>,
    pub run_parameters: JsonValue,
}

/// Repository for the search-history ledger
pub struct SearchHistoryRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SearchHistoryRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append one completed run to the ledger.
    pub async fn record(&self, run: NewSearchRun) -> Result<Model, RepositoryError> {
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            executed_at: Set(run.executed_at),
            period_start: Set(run.period_start),
            period_end: Set(run.period_end),
            tribunals: Set(JsonValue::from(run.tribunals)),
            total_found: Set(run.total_found),
            total_new: Set(run.total_new),
            duration_seconds: Set(run.duration_seconds),
            run_parameters: Set(run.run_parameters),
        };

        let inserted = SearchHistory::insert(model)
            .exec_with_returning(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(inserted)
    }

    /// List runs with offset pagination, returning `(total, page)`.
    ///
    /// When `correlation` is present the listing is restricted to runs whose
    /// period contains a matched publication's availability date and whose
    /// tribunal set contains its tribunal; an empty correlation set therefore
    /// yields an empty page.
    pub async fn list(
        &self,
        limit: u64,
        offset: u64,
        ordering: HistoryOrdering,
        correlation: Option<&[CorrelationKey]>,
    ) -> Result<(u64, Vec<Model>), RepositoryError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        match correlation {
            None => {
                let base = Self::apply_ordering(SearchHistory::find(), ordering);
                let total = base
                    .clone()
                    .count(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
                let page = base
                    .offset(offset)
                    .limit(limit)
                    .all(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
                Ok((total, page))
            }
            Some(keys) => {
                // The tribunal set is stored as a JSON array, so the
                // correlation filter runs in memory over the ordered ledger.
                let all = Self::apply_ordering(SearchHistory::find(), ordering)
                    .all(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;

                let matching: Vec<Model> = all
                    .into_iter()
                    .filter(|run| keys.iter().any(|key| Self::run_covers(run, key)))
                    .collect();

                let total = matching.len() as u64;
                let page = matching
                    .into_iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .collect();
                Ok((total, page))
            }
        }
    }

    /// Fetch one run by id; NotFound when absent.
    pub async fn detail(&self, id: Uuid) -> Result<Model, RepositoryError> {
        SearchHistory::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found(format!("search run {} not found", id)))
    }

    /// Irreversibly delete the whole ledger. Publications are untouched.
    pub async fn clear(&self) -> Result<u64, RepositoryError> {
        let result = SearchHistory::delete_many()
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(result.rows_affected)
    }

    fn apply_ordering(
        query: sea_orm::Select<SearchHistory>,
        ordering: HistoryOrdering,
    ) -> sea_orm::Select<SearchHistory> {
        match ordering {
            HistoryOrdering::ExecutedAtDesc => query.order_by_desc(Column::ExecutedAt),
            HistoryOrdering::ExecutedAtAsc => query.order_by_asc(Column::ExecutedAt),
            HistoryOrdering::TotalFoundDesc => query
                .order_by_desc(Column::TotalFound)
                .order_by_desc(Column::ExecutedAt),
            HistoryOrdering::TotalFoundAsc => query
                .order_by_asc(Column::TotalFound)
                .order_by_desc(Column::ExecutedAt),
            HistoryOrdering::DurationDesc => query
                .order_by_desc(Column::DurationSeconds)
                .order_by_desc(Column::ExecutedAt),
            HistoryOrdering::DurationAsc => query
                .order_by_asc(Column::DurationSeconds)
                .order_by_desc(Column::ExecutedAt),
        }
    }

    fn run_covers(run: &Model, key: &CorrelationKey) -> bool {
        let within_period =
            run.period_start <= key.availability_date && key.availability_date <= run.period_end;
        if !within_period {
            return false;
        }
        run.tribunals
            .as_array()
            .map(|list| list.iter().any(|t| t.as_str() == Some(&key.tribunal)))
            .unwrap_or(false)
    }

    /// Tribunal codes recorded on a run, tolerating malformed entries.
    pub fn tribunals_of(run: &Model) -> Vec<String> {
        run.tribunals
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
