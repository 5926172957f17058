use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Call::Table)
                    .if_not_exists()
                    .col(string(Call::Id).primary_key())
                    .col(string(Call::Status))
                    .col(boolean(Call::Reported).default(false))
                    .col(
                        timestamp_with_time_zone(Call::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .col(timestamp_with_time_zone_null(Call::EndedAt))
                    .to_owned(),
            )
            .await?;

        // Create index for the retention sweep (ended calls by age)
        manager
            .create_index(
                Index::create()
                    .name("idx_call_status_ended_at")
                    .table(Call::Table)
                    .col(Call::Status)
                    .col(Call::EndedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Call::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Call {
    Table,
    Id,
    Status,
    Reported,
    CreatedAt,
    EndedAt,
}
