//! Aggregation run orchestration
//!
//! One run fetches publications across tribunals, stores the new ones,
//! derives notifications, and appends the run to the search-history ledger.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::comunica::CommunicationSource;
use crate::error::RepositoryError;
use crate::fetcher::{DualQueryFetcher, QueryFailure};
use crate::models::publication::Model as Publication;
use crate::notifier::NotificationDeriver;
use crate::repositories::search_history::NewSearchRun;
use crate::repositories::{PublicationRepository, SearchHistoryRepository};

/// Parameters of one aggregation run.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub tribunals: Vec<String>,
    pub retroactive_days: u32,
}

/// Outcome of one completed aggregation run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub tribunals_queried: usize,
    /// Publications returned by the source after in-run dedup
    pub total_found: usize,
    /// Publications that did not yet exist locally
    pub total_new: usize,
    pub notifications_created: usize,
    /// Stored rows for everything the run fetched, new or pre-existing
    pub publications: Vec<Publication>,
    pub errors: Vec<QueryFailure>,
    pub duration_seconds: f64,
}

/// Runs the fetch-store-notify-record pipeline.
pub struct Aggregator<'a> {
    db: &'a DatabaseConnection,
    source: Arc<dyn CommunicationSource>,
    oab_number: String,
    advocate_name: String,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        source: Arc<dyn CommunicationSource>,
        oab_number: String,
        advocate_name: String,
    ) -> Self {
        Self {
            db,
            source,
            oab_number,
            advocate_name,
        }
    }

    /// Execute one aggregation run.
    ///
    /// Upstream query failures are carried in the report; only storage
    /// failures abort the run.
    #[instrument(skip(self), fields(start = %params.period_start, end = %params.period_end))]
    pub async fn run(&self, params: RunParams) -> Result<RunReport, RepositoryError> {
        let started = Instant::now();

        let fetcher = DualQueryFetcher::new(
            Arc::clone(&self.source),
            self.oab_number.clone(),
            self.advocate_name.clone(),
        );
        let outcome = fetcher
            .fetch(&params.tribunals, params.period_start, params.period_end)
            .await;

        let publication_repo = PublicationRepository::new(self.db);

        let mut publications = Vec::with_capacity(outcome.drafts.len());
        let mut new_publications = Vec::new();
        for draft in &outcome.drafts {
            let created = publication_repo
                .upsert_if_new(draft, params.period_end)
                .await?;

            // The row exists either way; re-read it for the report.
            let stored = publication_repo
                .get_by_external_id(draft.external_id, true)
                .await?
                .ok_or_else(|| {
                    RepositoryError::not_found(format!(
                        "publication {} vanished after upsert",
                        draft.external_id
                    ))
                })?;

            if created {
                new_publications.push(stored.clone());
            }
            publications.push(stored);
        }

        let total_found = outcome.total_fetched;
        let total_new = new_publications.len();

        let notifications_created = NotificationDeriver::new(self.db)
            .derive(
                &new_publications,
                params.retroactive_days,
                Utc::now().date_naive(),
            )
            .await?;

        let duration_seconds = started.elapsed().as_secs_f64();

        let run = SearchHistoryRepository::new(self.db)
            .record(NewSearchRun {
                executed_at: Utc::now().into(),
                period_start: params.period_start,
                period_end: params.period_end,
                tribunals: params.tribunals.clone(),
                total_found: total_found as i32,
                total_new: total_new as i32,
                duration_seconds: Some(duration_seconds),
                run_parameters: json!({
                    "oabNumber": self.oab_number,
                    "advocateName": self.advocate_name,
                    "retroactiveDays": params.retroactive_days,
                    "queriesPerTribunal": 2,
                }),
            })
            .await?;

        metrics::counter!("aggregation_runs_total").increment(1);
        metrics::counter!("publications_stored_total").increment(total_new as u64);

        info!(
            run_id = %run.id,
            total_found,
            total_new,
            notifications_created,
            errors = outcome.errors.len(),
            "aggregation run completed"
        );

        Ok(RunReport {
            run_id: run.id,
            period_start: params.period_start,
            period_end: params.period_end,
            tribunals_queried: outcome.tribunals_queried,
            total_found,
            total_new,
            notifications_created,
            publications,
            errors: outcome.errors,
            duration_seconds,
        })
    }
}
