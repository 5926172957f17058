use sea_orm_migration::{prelude::*, schema::*};

use super::m20260802_000005_create_call_table::Call;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CallParticipant::Table)
                    .if_not_exists()
                    .col(pk_auto(CallParticipant::Id))
                    .col(string(CallParticipant::CallId))
                    .col(string(CallParticipant::ChannelId))
                    .col(string(CallParticipant::GuildId))
                    .col(string(CallParticipant::WebhookUrl))
                    .col(json(CallParticipant::Users))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_call_participant_call_id")
                            .from(CallParticipant::Table, CallParticipant::CallId)
                            .to(Call::Table, Call::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One participant row per channel per call
        manager
            .create_index(
                Index::create()
                    .name("idx_call_participant_unique")
                    .table(CallParticipant::Table)
                    .col(CallParticipant::CallId)
                    .col(CallParticipant::ChannelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create index for cache-miss lookups by channel
        manager
            .create_index(
                Index::create()
                    .name("idx_call_participant_channel_id")
                    .table(CallParticipant::Table)
                    .col(CallParticipant::ChannelId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CallParticipant::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CallParticipant {
    Table,
    Id,
    CallId,
    ChannelId,
    GuildId,
    WebhookUrl,
    Users,
}
