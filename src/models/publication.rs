//! Publication entity model
//!
//! This module contains the SeaORM entity model for the publications table,
//! which stores normalized judicial communications fetched from the upstream
//! source. Rows are soft-deleted, never physically removed.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Publication entity representing one externally sourced legal notice
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "publications")]
pub struct Model {
    /// Internal identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Source-assigned id, globally unique; the idempotency key
    #[sea_orm(unique)]
    pub external_id: i64,

    /// CNJ-formatted process number extracted from the full text, if any
    pub process_number: Option<String>,

    /// Short tribunal code (e.g. TJSP, TRF3)
    pub tribunal: String,

    /// Free-text classification (e.g. Intimação, Despacho, Citação)
    pub communication_type: String,

    /// Court body that issued the notice
    pub issuing_body: String,

    /// Communication channel code (D = digital, F = physical)
    pub channel: String,

    /// Date the notice became available; primary query key
    pub availability_date: Date,

    /// First 500 characters of the full text
    pub summary_text: String,

    /// Full text of the notice
    pub full_text: String,

    /// Best-effort link to the official consultation page
    pub official_link: Option<String>,

    /// Source-provided content hash, when present
    pub content_hash: Option<String>,

    /// Raw upstream item retained for audit
    #[sea_orm(column_type = "Json")]
    pub raw_source_payload: JsonValue,

    /// Timestamp when the row was stored locally
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp of the last mutation
    pub updated_at: DateTimeWithTimeZone,

    /// Soft-delete flag
    pub deleted: bool,

    /// Timestamp of the soft delete
    pub deleted_at: Option<DateTimeWithTimeZone>,

    /// Operator-supplied reason for the soft delete
    pub deleted_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
