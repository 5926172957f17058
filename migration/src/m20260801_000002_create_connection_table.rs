use sea_orm_migration::{prelude::*, schema::*};

use super::m20260801_000001_create_hub_table::Hub;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create table
        manager
            .create_table(
                Table::create()
                    .table(Connection::Table)
                    .if_not_exists()
                    .col(pk_auto(Connection::Id))
                    .col(string(Connection::HubId))
                    .col(string(Connection::ChannelId))
                    .col(string(Connection::GuildId))
                    .col(string(Connection::WebhookUrl))
                    .col(string_null(Connection::ParentChannelId))
                    .col(boolean(Connection::Connected).default(true))
                    .col(
                        timestamp_with_time_zone(Connection::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connection_hub_id")
                            .from(Connection::Table, Connection::HubId)
                            .to(Hub::Table, Hub::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A channel belongs to at most one hub
        manager
            .create_index(
                Index::create()
                    .name("idx_connection_channel_unique")
                    .table(Connection::Table)
                    .col(Connection::ChannelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create index for hub fan-out lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_connection_hub_id")
                    .table(Connection::Table)
                    .col(Connection::HubId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Connection::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Connection {
    Table,
    Id,
    HubId,
    ChannelId,
    GuildId,
    WebhookUrl,
    ParentChannelId,
    Connected,
    CreatedAt,
}
