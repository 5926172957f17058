use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};

use crate::model::call::{ActiveCall, CallMessage, CallParticipant, CallStatus};

/// Durable storage for calls, their participants, and their message logs.
/// The cache serves live routing; these rows back reporting and retention.
pub struct CallRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CallRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists a freshly matched call with both participant rows in one
    /// transaction.
    pub async fn create(&self, call: &ActiveCall) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;

        entity::call::ActiveModel {
            id: ActiveValue::Set(call.id.clone()),
            status: ActiveValue::Set(call.status.as_str().to_string()),
            reported: ActiveValue::Set(false),
            created_at: ActiveValue::Set(call.created_at),
            ended_at: ActiveValue::Set(call.ended_at),
        }
        .insert(&txn)
        .await?;

        for participant in &call.participants {
            entity::call_participant::ActiveModel {
                call_id: ActiveValue::Set(call.id.clone()),
                channel_id: ActiveValue::Set(participant.channel_id.to_string()),
                guild_id: ActiveValue::Set(participant.guild_id.to_string()),
                webhook_url: ActiveValue::Set(participant.webhook_url.clone()),
                users: ActiveValue::Set(users_to_json(&participant.users)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await
    }

    /// Loads a call with participants and message log.
    pub async fn load(&self, call_id: &str) -> Result<Option<ActiveCall>, DbErr> {
        let Some(call) = entity::prelude::Call::find_by_id(call_id).one(self.db).await? else {
            return Ok(None);
        };

        let participants = entity::prelude::CallParticipant::find()
            .filter(entity::call_participant::Column::CallId.eq(call_id))
            .all(self.db)
            .await?;

        let messages = entity::prelude::CallMessage::find()
            .filter(entity::call_message::Column::CallId.eq(call_id))
            .order_by_asc(entity::call_message::Column::Id)
            .all(self.db)
            .await?;

        Ok(Some(to_domain(call, participants, messages)))
    }

    /// Cache-miss fallback: the ongoing call one of whose participants is
    /// `channel_id`, if any.
    pub async fn find_ongoing_by_channel(
        &self,
        channel_id: u64,
    ) -> Result<Option<ActiveCall>, DbErr> {
        let participants = entity::prelude::CallParticipant::find()
            .filter(entity::call_participant::Column::ChannelId.eq(channel_id.to_string()))
            .all(self.db)
            .await?;

        for participant in participants {
            let ongoing = entity::prelude::Call::find_by_id(&participant.call_id)
                .filter(entity::call::Column::Status.eq(CallStatus::Ongoing.as_str()))
                .one(self.db)
                .await?;
            if ongoing.is_some() {
                return self.load(&participant.call_id).await;
            }
        }
        Ok(None)
    }

    /// Marks a call ended. Returns whether the row existed.
    pub async fn end(&self, call_id: &str, ended_at: DateTime<Utc>) -> Result<bool, DbErr> {
        let Some(existing) = entity::prelude::Call::find_by_id(call_id).one(self.db).await? else {
            return Ok(false);
        };

        let mut active: entity::call::ActiveModel = existing.into();
        active.status = ActiveValue::Set(CallStatus::Ended.as_str().to_string());
        active.ended_at = ActiveValue::Set(Some(ended_at));
        active.update(self.db).await?;
        Ok(true)
    }

    /// Appends one relayed message to the call's log.
    pub async fn append_message(
        &self,
        call_id: &str,
        message: &CallMessage,
    ) -> Result<(), DbErr> {
        entity::call_message::ActiveModel {
            call_id: ActiveValue::Set(call_id.to_string()),
            author_id: ActiveValue::Set(message.author_id.to_string()),
            author_username: ActiveValue::Set(message.author_username.clone()),
            content: ActiveValue::Set(message.content.clone()),
            attachment_url: ActiveValue::Set(message.attachment_url.clone()),
            created_at: ActiveValue::Set(message.timestamp),
            ..Default::default()
        }
        .insert(self.db)
        .await?;
        Ok(())
    }

    /// Replaces a participant's accumulated user set.
    pub async fn set_participant_users(
        &self,
        call_id: &str,
        channel_id: u64,
        users: &HashSet<u64>,
    ) -> Result<(), DbErr> {
        let Some(existing) = entity::prelude::CallParticipant::find()
            .filter(entity::call_participant::Column::CallId.eq(call_id))
            .filter(entity::call_participant::Column::ChannelId.eq(channel_id.to_string()))
            .one(self.db)
            .await?
        else {
            return Ok(());
        };

        let mut active: entity::call_participant::ActiveModel = existing.into();
        active.users = ActiveValue::Set(users_to_json(users));
        active.update(self.db).await?;
        Ok(())
    }

    /// Moderation hook: pins or unpins a call against retention.
    pub async fn set_reported(&self, call_id: &str, reported: bool) -> Result<bool, DbErr> {
        let Some(existing) = entity::prelude::Call::find_by_id(call_id).one(self.db).await? else {
            return Ok(false);
        };

        let mut active: entity::call::ActiveModel = existing.into();
        active.reported = ActiveValue::Set(reported);
        active.update(self.db).await?;
        Ok(true)
    }

    /// Removes a call row entirely (participants and messages cascade).
    /// Used to undo a half-committed match; retention uses
    /// [`purge_ended_before`](Self::purge_ended_before) instead.
    pub async fn delete(&self, call_id: &str) -> Result<u64, DbErr> {
        let result = entity::prelude::Call::delete_by_id(call_id)
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Retention sweep: deletes ended, unreported calls whose end predates
    /// `cutoff`. Participants and messages cascade. Active calls are never
    /// touched.
    pub async fn purge_ended_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = entity::prelude::Call::delete_many()
            .filter(entity::call::Column::Status.eq(CallStatus::Ended.as_str()))
            .filter(entity::call::Column::Reported.eq(false))
            .filter(entity::call::Column::EndedAt.is_not_null())
            .filter(entity::call::Column::EndedAt.lt(cutoff))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

fn users_to_json(users: &HashSet<u64>) -> serde_json::Value {
    let mut ids: Vec<u64> = users.iter().copied().collect();
    ids.sort_unstable();
    serde_json::Value::from(ids)
}

fn users_from_json(value: &serde_json::Value) -> HashSet<u64> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

fn to_domain(
    call: entity::call::Model,
    participants: Vec<entity::call_participant::Model>,
    messages: Vec<entity::call_message::Model>,
) -> ActiveCall {
    ActiveCall {
        status: CallStatus::parse(&call.status).unwrap_or(CallStatus::Ended),
        participants: participants
            .into_iter()
            .map(|p| CallParticipant {
                channel_id: p.channel_id.parse().unwrap_or_default(),
                guild_id: p.guild_id.parse().unwrap_or_default(),
                webhook_url: p.webhook_url,
                users: users_from_json(&p.users),
            })
            .collect(),
        messages: messages
            .into_iter()
            .map(|m| CallMessage {
                author_id: m.author_id.parse().unwrap_or_default(),
                author_username: m.author_username,
                content: m.content,
                attachment_url: m.attachment_url,
                timestamp: m.created_at,
            })
            .collect(),
        created_at: call.created_at,
        ended_at: call.ended_at,
        id: call.id,
    }
}
