//! Dual-query fetching across tribunals
//!
//! For each tribunal two independent queries are issued, one by bar number
//! and one by advocate name, and the union of their results is deduplicated
//! by source id across the whole run. A failed query is recorded and never
//! aborts the run.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crate::comunica::{AdvocateQuery, CommunicationSource, SourceError, SourcedItem};
use crate::normalization::{PublicationDraft, normalize};

/// One failed upstream query, scoped to a tribunal and strategy.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct QueryFailure {
    pub tribunal: String,
    /// Which query strategy failed ("oab" or "name")
    pub strategy: String,
    pub message: String,
}

/// Result of one fetch pass over all tribunals.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Normalized drafts in tribunal order, OAB results before name results
    pub drafts: Vec<PublicationDraft>,
    pub errors: Vec<QueryFailure>,
    pub tribunals_queried: usize,
    pub total_fetched: usize,
}

/// Fetches publications for one advocate across a set of tribunals.
pub struct DualQueryFetcher {
    source: Arc<dyn CommunicationSource>,
    oab_number: String,
    advocate_name: String,
}

impl DualQueryFetcher {
    pub fn new(source: Arc<dyn CommunicationSource>, oab_number: String, advocate_name: String) -> Self {
        Self {
            source,
            oab_number,
            advocate_name,
        }
    }

    /// Run both queries against every tribunal over the given window.
    ///
    /// Tribunals are processed in order; within a tribunal the two queries run
    /// concurrently but OAB results are merged first so the output order is
    /// deterministic.
    pub async fn fetch(
        &self,
        tribunals: &[String],
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> FetchOutcome {
        let mut drafts = Vec::new();
        let mut errors = Vec::new();
        let mut seen_ids: HashSet<i64> = HashSet::new();

        let oab_query = AdvocateQuery::ByOab(self.oab_number.clone());
        let name_query = AdvocateQuery::ByName(self.advocate_name.clone());

        for tribunal in tribunals {
            let (by_oab, by_name) = tokio::join!(
                self.source.query(tribunal, &oab_query, period_start, period_end),
                self.source.query(tribunal, &name_query, period_start, period_end),
            );

            self.merge(tribunal, &oab_query, by_oab, &mut seen_ids, &mut drafts, &mut errors);
            self.merge(tribunal, &name_query, by_name, &mut seen_ids, &mut drafts, &mut errors);
        }

        let total_fetched = drafts.len();
        FetchOutcome {
            drafts,
            errors,
            tribunals_queried: tribunals.len(),
            total_fetched,
        }
    }

    fn merge(
        &self,
        tribunal: &str,
        query: &AdvocateQuery,
        result: Result<Vec<SourcedItem>, SourceError>,
        seen_ids: &mut HashSet<i64>,
        drafts: &mut Vec<PublicationDraft>,
        errors: &mut Vec<QueryFailure>,
    ) {
        match result {
            Ok(items) => {
                for sourced in &items {
                    // First-seen wins across the whole run, so the same notice
                    // found by both strategies is stored once.
                    if seen_ids.insert(sourced.item.id) {
                        drafts.push(normalize(sourced, tribunal));
                    }
                }
            }
            Err(err) => {
                warn!(
                    tribunal,
                    strategy = query.strategy(),
                    error = %err,
                    "upstream query failed, continuing run"
                );
                errors.push(QueryFailure {
                    tribunal: tribunal.to_string(),
                    strategy: query.strategy().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }
}
