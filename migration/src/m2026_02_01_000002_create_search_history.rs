//! Migration to create the search_history table.
//!
//! Each row records one aggregation run. Runs carry no foreign key to
//! publications; correlation is recomputed from period and tribunal scope.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SearchHistory::ExecutedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(SearchHistory::PeriodStart).date().not_null())
                    .col(ColumnDef::new(SearchHistory::PeriodEnd).date().not_null())
                    .col(ColumnDef::new(SearchHistory::Tribunals).json().not_null())
                    .col(
                        ColumnDef::new(SearchHistory::TotalFound)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SearchHistory::TotalNew)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SearchHistory::DurationSeconds)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SearchHistory::RunParameters)
                            .json()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_search_history_executed_at")
                    .table(SearchHistory::Table)
                    .col(SearchHistory::ExecutedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SearchHistory {
    Table,
    Id,
    ExecutedAt,
    PeriodStart,
    PeriodEnd,
    Tribunals,
    TotalFound,
    TotalNew,
    DurationSeconds,
    RunParameters,
}
