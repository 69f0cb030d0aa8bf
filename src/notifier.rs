//! Notification derivation
//!
//! Turns newly stored publications from one run into user-facing
//! notifications, bounded by a retroactive window and a per-run cap.

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::debug;

use crate::error::RepositoryError;
use crate::models::publication::Model as Publication;
use crate::models::{NotificationKind, NotificationPriority};
use crate::repositories::NotificationRepository;
use crate::repositories::notification::NotificationDraft;

/// At most this many notifications are derived per run, so a large backfill
/// does not flood the inbox.
const MAX_NOTIFICATIONS_PER_RUN: usize = 5;

/// Route shown when a publication carries no official link.
const FALLBACK_LINK: &str = "/publications";

/// Derives notifications from newly created publications.
pub struct NotificationDeriver<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> NotificationDeriver<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Derive notifications for one run's new publications.
    ///
    /// `today` is passed explicitly so the cutoff is computable in tests.
    /// A publication older than `today - retroactive_days` is skipped; with
    /// `retroactive_days = 0` nothing is derived at all. Returns how many
    /// notifications were created.
    pub async fn derive(
        &self,
        publications: &[Publication],
        retroactive_days: u32,
        today: NaiveDate,
    ) -> Result<usize, RepositoryError> {
        if retroactive_days == 0 {
            return Ok(0);
        }

        let cutoff = today - chrono::Duration::days(i64::from(retroactive_days));
        let repository = NotificationRepository::new(self.db);

        let mut created = 0;
        let mut processed = 0;

        for publication in publications {
            if processed >= MAX_NOTIFICATIONS_PER_RUN {
                break;
            }
            if publication.availability_date < cutoff {
                continue;
            }
            processed += 1;

            if repository
                .exists_for_external_id(publication.external_id)
                .await?
            {
                debug!(
                    external_id = publication.external_id,
                    "notification already exists, skipping"
                );
                continue;
            }

            repository.create(draft_for(publication)).await?;
            created += 1;
        }

        Ok(created)
    }
}

fn draft_for(publication: &Publication) -> NotificationDraft {
    let process_number = publication
        .process_number
        .as_deref()
        .unwrap_or("Sem número");
    let communication_type = non_empty(&publication.communication_type).unwrap_or("N/A");
    let issuing_body = non_empty(&publication.issuing_body).unwrap_or("N/A");

    NotificationDraft {
        kind: NotificationKind::Publication,
        priority: classify_priority(&publication.communication_type),
        title: format!("Nova Publicação - {}", publication.tribunal),
        message: format!(
            "Processo: {}\nTipo: {}\nÓrgão: {}",
            process_number, communication_type, issuing_body
        ),
        link: Some(
            publication
                .official_link
                .clone()
                .unwrap_or_else(|| FALLBACK_LINK.to_string()),
        ),
        source_external_id: Some(publication.external_id),
        correlation_metadata: Some(json!({
            "externalId": publication.external_id,
            "tribunal": publication.tribunal,
            "processNumber": publication.process_number,
            "availabilityDate": publication.availability_date,
        })),
    }
}

/// Priority from the communication type, by case-insensitive substring.
pub fn classify_priority(communication_type: &str) -> NotificationPriority {
    let lowered = communication_type.to_lowercase();
    if lowered.contains("intimação") || lowered.contains("citação") {
        NotificationPriority::High
    } else if lowered.contains("despacho") {
        NotificationPriority::Medium
    } else {
        NotificationPriority::Low
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}
