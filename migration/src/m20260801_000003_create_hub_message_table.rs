use sea_orm_migration::{prelude::*, schema::*};

use super::m20260801_000001_create_hub_table::Hub;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HubMessage::Table)
                    .if_not_exists()
                    .col(string(HubMessage::Id).primary_key())
                    .col(string(HubMessage::HubId))
                    .col(string(HubMessage::AuthorId))
                    .col(string(HubMessage::AuthorUsername))
                    .col(string(HubMessage::ChannelId))
                    .col(string(HubMessage::GuildId))
                    .col(text(HubMessage::Content))
                    .col(json(HubMessage::Reactions))
                    .col(
                        timestamp_with_time_zone(HubMessage::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hub_message_hub_id")
                            .from(HubMessage::Table, HubMessage::HubId)
                            .to(Hub::Table, Hub::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index for hub-scoped queries
        manager
            .create_index(
                Index::create()
                    .name("idx_hub_message_hub_id")
                    .table(HubMessage::Table)
                    .col(HubMessage::HubId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HubMessage::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum HubMessage {
    Table,
    Id,
    HubId,
    AuthorId,
    AuthorUsername,
    ChannelId,
    GuildId,
    Content,
    Reactions,
    CreatedAt,
}
