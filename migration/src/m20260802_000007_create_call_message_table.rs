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
                    .table(CallMessage::Table)
                    .if_not_exists()
                    .col(pk_auto(CallMessage::Id))
                    .col(string(CallMessage::CallId))
                    .col(string(CallMessage::AuthorId))
                    .col(string(CallMessage::AuthorUsername))
                    .col(text(CallMessage::Content))
                    .col(string_null(CallMessage::AttachmentUrl))
                    .col(
                        timestamp_with_time_zone(CallMessage::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_call_message_call_id")
                            .from(CallMessage::Table, CallMessage::CallId)
                            .to(Call::Table, Call::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index for call log reads
        manager
            .create_index(
                Index::create()
                    .name("idx_call_message_call_id")
                    .table(CallMessage::Table)
                    .col(CallMessage::CallId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CallMessage::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CallMessage {
    Table,
    Id,
    CallId,
    AuthorId,
    AuthorUsername,
    Content,
    AttachmentUrl,
    CreatedAt,
}
