//! Notification entity model
//!
//! User-facing alerts derived from publications (and, in the future, other
//! kinds). For `kind = publication` the originating publication's external id
//! is mirrored into `source_external_id`, which carries the at-most-one-
//! notification-per-publication rule; `correlation_metadata` keeps the full
//! context as opaque JSON.

use std::fmt;

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// Notification entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Notification kind (publication, deadline, process_update, system)
    pub kind: String,

    /// Priority level (low, medium, high, urgent)
    pub priority: String,

    pub title: String,

    pub message: String,

    /// URL to navigate to when the notification is opened
    pub link: Option<String>,

    /// External id of the originating publication; the dedup key for
    /// publication notifications
    pub source_external_id: Option<i64>,

    /// Additional correlation data (JSON)
    #[sea_orm(column_type = "Json", nullable)]
    pub correlation_metadata: Option<JsonValue>,

    pub read: bool,

    pub read_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Canonical notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Publication,
    Deadline,
    ProcessUpdate,
    System,
}

impl NotificationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Publication => "publication",
            NotificationKind::Deadline => "deadline",
            NotificationKind::ProcessUpdate => "process_update",
            NotificationKind::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority levels for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl NotificationPriority {
    pub const fn as_str(self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
