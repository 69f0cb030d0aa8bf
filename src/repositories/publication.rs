//! # Publication Repository
//!
//! Idempotent persistence and soft-delete lifecycle for publications. The
//! upstream id carries a uniqueness constraint, so concurrent upserts of the
//! same notice resolve to exactly one stored row.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::notification;
use crate::models::publication::{ActiveModel, Column, Entity as Publication, Model};
use crate::models::search_history;
use crate::normalization::PublicationDraft;

/// Repository for publication database operations
pub struct PublicationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PublicationRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a draft keyed by its external id.
    ///
    /// Returns `true` when a new row was created and `false` when the id was
    /// already present; "already present" is the expected outcome on re-runs,
    /// not an error. `fallback_date` is used when the source item carried no
    /// availability date.
    pub async fn upsert_if_new(
        &self,
        draft: &PublicationDraft,
        fallback_date: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            external_id: Set(draft.external_id),
            process_number: Set(draft.process_number.clone()),
            tribunal: Set(draft.tribunal.clone()),
            communication_type: Set(draft.communication_type.clone()),
            issuing_body: Set(draft.issuing_body.clone()),
            channel: Set(draft.channel.clone()),
            availability_date: Set(draft.availability_date.unwrap_or(fallback_date)),
            summary_text: Set(draft.summary_text.clone()),
            full_text: Set(draft.full_text.clone()),
            official_link: Set(draft.official_link.clone()),
            content_hash: Set(draft.content_hash.clone()),
            raw_source_payload: Set(draft.raw_source_payload.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted: Set(false),
            deleted_at: Set(None),
            deleted_reason: Set(None),
        };

        let rows_affected = Publication::insert(model)
            .on_conflict(
                OnConflict::column(Column::ExternalId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(rows_affected > 0)
    }

    /// Publications within a date window restricted to a tribunal set,
    /// newest first. Deleted rows are excluded unless requested.
    pub async fn find_by_date_range_and_tribunals(
        &self,
        tribunals: &[String],
        start: NaiveDate,
        end: NaiveDate,
        include_deleted: bool,
    ) -> Result<Vec<Model>, RepositoryError> {
        let mut query = Publication::find()
            .filter(Column::Tribunal.is_in(tribunals.iter().cloned()))
            .filter(Column::AvailabilityDate.gte(start))
            .filter(Column::AvailabilityDate.lte(end));

        if !include_deleted {
            query = query.filter(Column::Deleted.eq(false));
        }

        query
            .order_by_desc(Column::AvailabilityDate)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::ExternalId)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// All publications still visible to search, newest first.
    pub async fn all_active(&self) -> Result<Vec<Model>, RepositoryError> {
        Publication::find()
            .filter(Column::Deleted.eq(false))
            .order_by_desc(Column::AvailabilityDate)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::ExternalId)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Lookup by external id. Deleted rows are included by default because
    /// notifications keep referencing deleted publications for display.
    pub async fn get_by_external_id(
        &self,
        external_id: i64,
        include_deleted: bool,
    ) -> Result<Option<Model>, RepositoryError> {
        let mut query = Publication::find().filter(Column::ExternalId.eq(external_id));
        if !include_deleted {
            query = query.filter(Column::Deleted.eq(false));
        }
        query
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Soft-delete one publication. Fails with NotFound when the id is absent
    /// or the row is already deleted. Correlated notifications are marked
    /// read, never removed.
    pub async fn soft_delete(
        &self,
        external_id: i64,
        reason: Option<String>,
    ) -> Result<(), RepositoryError> {
        let affected = self.mark_deleted(&[external_id], reason).await?;
        if affected == 0 {
            return Err(RepositoryError::not_found(format!(
                "publication with external id {} not found or already deleted",
                external_id
            )));
        }
        self.mark_notifications_read(Some(&[external_id])).await?;
        Ok(())
    }

    /// Soft-delete a batch of publications. Fails with NotFound when none of
    /// the ids named an active row; otherwise returns the number deleted.
    pub async fn soft_delete_many(
        &self,
        external_ids: &[i64],
        reason: Option<String>,
    ) -> Result<u64, RepositoryError> {
        let affected = self.mark_deleted(external_ids, reason).await?;
        if affected == 0 {
            return Err(RepositoryError::not_found(
                "no active publications matched the given external ids",
            ));
        }
        self.mark_notifications_read(Some(external_ids)).await?;
        Ok(affected)
    }

    /// Soft-delete every active publication and truncate the search-history
    /// ledger, since run history refers to nothing visible afterwards.
    pub async fn soft_delete_all(&self, reason: Option<String>) -> Result<u64, RepositoryError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = Publication::update_many()
            .col_expr(Column::Deleted, Expr::value(true))
            .col_expr(Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(Column::DeletedReason, Expr::value(reason))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Deleted.eq(false))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        self.mark_notifications_read(None).await?;

        search_history::Entity::delete_many()
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result.rows_affected)
    }

    async fn mark_deleted(
        &self,
        external_ids: &[i64],
        reason: Option<String>,
    ) -> Result<u64, RepositoryError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = Publication::update_many()
            .col_expr(Column::Deleted, Expr::value(true))
            .col_expr(Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(Column::DeletedReason, Expr::value(reason))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::ExternalId.is_in(external_ids.iter().copied()))
            .filter(Column::Deleted.eq(false))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result.rows_affected)
    }

    /// Marks publication-derived notifications read; `None` means all of them.
    async fn mark_notifications_read(
        &self,
        external_ids: Option<&[i64]>,
    ) -> Result<(), RepositoryError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let mut update = notification::Entity::update_many()
            .col_expr(notification::Column::Read, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(Some(now)))
            .col_expr(notification::Column::UpdatedAt, Expr::value(now))
            .filter(notification::Column::Kind.eq("publication"))
            .filter(notification::Column::Read.eq(false));

        if let Some(ids) = external_ids {
            update =
                update.filter(notification::Column::SourceExternalId.is_in(ids.iter().copied()));
        }

        update
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }
}
