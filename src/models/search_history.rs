//! Search history entity model
//!
//! One row per aggregation run. Rows are immutable after creation; the only
//! mutation the ledger supports is bulk truncation. There is deliberately no
//! foreign key to publications: correlation is computed from the run's
//! tribunal set and period at read time.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// SearchHistory entity recording one completed aggregation run
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "search_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// When the run was executed
    pub executed_at: DateTimeWithTimeZone,

    /// Start of the queried availability-date window
    pub period_start: Date,

    /// End of the queried availability-date window
    pub period_end: Date,

    /// JSON array of tribunal codes queried by the run
    #[sea_orm(column_type = "Json")]
    pub tribunals: JsonValue,

    /// Publications returned by the upstream source (after dedup)
    pub total_found: i32,

    /// Publications that did not yet exist locally
    pub total_new: i32,

    /// Wall-clock duration of the run
    pub duration_seconds: Option<f64>,

    /// Opaque snapshot of the full run parameters
    #[sea_orm(column_type = "Json")]
    pub run_parameters: JsonValue,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
