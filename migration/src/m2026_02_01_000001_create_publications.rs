//! Migration to create the publications table.
//!
//! Publications are externally sourced legal notices keyed by the upstream
//! id. Rows are never physically removed; deletion is a soft-delete flag.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Publications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Publications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Publications::ExternalId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Publications::ProcessNumber).text().null())
                    .col(ColumnDef::new(Publications::Tribunal).text().not_null())
                    .col(
                        ColumnDef::new(Publications::CommunicationType)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Publications::IssuingBody).text().not_null())
                    .col(ColumnDef::new(Publications::Channel).text().not_null())
                    .col(
                        ColumnDef::new(Publications::AvailabilityDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Publications::SummaryText).text().not_null())
                    .col(ColumnDef::new(Publications::FullText).text().not_null())
                    .col(ColumnDef::new(Publications::OfficialLink).text().null())
                    .col(ColumnDef::new(Publications::ContentHash).text().null())
                    .col(
                        ColumnDef::new(Publications::RawSourcePayload)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Publications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Publications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Publications::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Publications::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Publications::DeletedReason).text().null())
                    .to_owned(),
            )
            .await?;

        // external_id is the idempotency key; the uniqueness constraint is
        // what makes concurrent upserts of the same notice safe.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_publications_external_id")
                    .table(Publications::Table)
                    .col(Publications::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_publications_tribunal_availability")
                    .table(Publications::Table)
                    .col(Publications::Tribunal)
                    .col(Publications::AvailabilityDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_publications_process_number")
                    .table(Publications::Table)
                    .col(Publications::ProcessNumber)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Publications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Publications {
    Table,
    Id,
    ExternalId,
    ProcessNumber,
    Tribunal,
    CommunicationType,
    IssuingBody,
    Channel,
    AvailabilityDate,
    SummaryText,
    FullText,
    OfficialLink,
    ContentHash,
    RawSourcePayload,
    CreatedAt,
    UpdatedAt,
    Deleted,
    DeletedAt,
    DeletedReason,
}
