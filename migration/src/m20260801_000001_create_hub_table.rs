use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Hub::Table)
                    .if_not_exists()
                    .col(string(Hub::Id).primary_key())
                    .col(string(Hub::Name))
                    .col(string_null(Hub::ModLogChannelId))
                    .col(
                        timestamp_with_time_zone(Hub::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Hub::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Hub {
    Table,
    Id,
    Name,
    ModLogChannelId,
    CreatedAt,
}
