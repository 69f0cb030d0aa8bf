//! # Notification Repository
//!
//! Persistence for derived notifications, including the read/unread
//! lifecycle and the per-publication dedup check.

use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use sea_orm::ActiveModelTrait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::notification::{ActiveModel, Column, Entity as Notification, Model};
use crate::models::{NotificationKind, NotificationPriority};

/// A notification not yet persisted.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub source_external_id: Option<i64>,
    pub correlation_metadata: Option<JsonValue>,
}

/// Repository for notification database operations
pub struct NotificationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> NotificationRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, draft: NotificationDraft) -> Result<Model, RepositoryError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(draft.kind.as_str().to_string()),
            priority: Set(draft.priority.as_str().to_string()),
            title: Set(draft.title),
            message: Set(draft.message),
            link: Set(draft.link),
            source_external_id: Set(draft.source_external_id),
            correlation_metadata: Set(draft.correlation_metadata),
            read: Set(false),
            read_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = Notification::insert(model)
            .exec_with_returning(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(inserted)
    }

    /// Whether a publication notification already exists for this external id.
    pub async fn exists_for_external_id(&self, external_id: i64) -> Result<bool, RepositoryError> {
        let count = Notification::find()
            .filter(Column::Kind.eq(NotificationKind::Publication.as_str()))
            .filter(Column::SourceExternalId.eq(external_id))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(count > 0)
    }

    /// Notifications newest-first, optionally restricted to unread ones.
    pub async fn list(&self, unread_only: bool) -> Result<Vec<Model>, RepositoryError> {
        let mut query = Notification::find();
        if unread_only {
            query = query.filter(Column::Read.eq(false));
        }
        query
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Model, RepositoryError> {
        self.set_read(id, true).await
    }

    pub async fn mark_unread(&self, id: Uuid) -> Result<Model, RepositoryError> {
        self.set_read(id, false).await
    }

    async fn set_read(&self, id: Uuid, read: bool) -> Result<Model, RepositoryError> {
        let existing = Notification::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found(format!("notification {} not found", id)))?;

        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let mut model = existing.into_active_model();
        model.read = Set(read);
        model.read_at = Set(read.then_some(now));
        model.updated_at = Set(now);

        model
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
