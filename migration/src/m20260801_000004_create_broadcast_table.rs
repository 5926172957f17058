use sea_orm_migration::{prelude::*, schema::*};

use super::m20260801_000003_create_hub_message_table::HubMessage;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Broadcast::Table)
                    .if_not_exists()
                    .col(pk_auto(Broadcast::Id))
                    .col(string(Broadcast::HubMessageId))
                    .col(string(Broadcast::ChannelId))
                    .col(string(Broadcast::MessageId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_broadcast_hub_message_id")
                            .from(Broadcast::Table, Broadcast::HubMessageId)
                            .to(HubMessage::Table, HubMessage::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One copy per channel per original message
        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_unique")
                    .table(Broadcast::Table)
                    .col(Broadcast::HubMessageId)
                    .col(Broadcast::ChannelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create index for reverse lookups from a copy's message id
        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_message_id")
                    .table(Broadcast::Table)
                    .col(Broadcast::MessageId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Broadcast::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Broadcast {
    Table,
    Id,
    HubMessageId,
    ChannelId,
    MessageId,
}
