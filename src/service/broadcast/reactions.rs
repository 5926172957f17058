//! Reaction relay.
//!
//! A reaction event on any copy updates the per-original-message reaction
//! map, persists it, and re-renders it as button components on every copy —
//! at most one "top" reaction button plus a "+N more" aggregate, staying
//! far inside the platform's component ceiling. Per-user processing is
//! throttled through a cache counter to bound write amplification.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use serenity::all::{ButtonStyle, CreateActionRow, CreateButton};
use tracing::warn;

use crate::cache::CallCache;
use crate::data::{ConnectionRepository, HubMessageRepository};
use crate::error::AppError;
use crate::gateway::{WebhookGateway, WebhookPayload, WebhookTarget};
use crate::model::broadcast::{ReactionChange, ReactionMap};

/// Reaction events accepted per user per original message within one
/// cooldown window.
const MAX_REACTION_BURST: u64 = 3;

/// Outcome of a reaction event, for the command layer's acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// The map changed and every copy was re-rendered.
    Updated,
    /// The event was a no-op (duplicate add or absent removal).
    Unchanged,
    /// The user is reacting faster than the cooldown allows.
    RateLimited,
    /// A new emoji was rejected at the distinct-emoji cap.
    CapReached,
    /// The message is not part of any broadcast.
    NotTracked,
}

pub struct ReactionService {
    db: DatabaseConnection,
    gateway: Arc<dyn WebhookGateway>,
    cache: Arc<dyn CallCache>,
    cooldown: Duration,
}

impl ReactionService {
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn WebhookGateway>,
        cache: Arc<dyn CallCache>,
        cooldown: Duration,
    ) -> Self {
        Self {
            db,
            gateway,
            cache,
            cooldown,
        }
    }

    /// Replaces the stored reaction map of a broadcast message and pushes
    /// the rendered buttons to every copy. Returns whether the message was
    /// part of a broadcast.
    pub async fn store_reactions(
        &self,
        message_id: u64,
        reactions: &ReactionMap,
    ) -> Result<bool, AppError> {
        let repo = HubMessageRepository::new(&self.db);
        let Some(original) = repo.resolve_origin(message_id).await? else {
            return Ok(false);
        };

        repo.update_reactions(&original.id, reactions).await?;
        self.push_components(&original, reactions).await?;
        Ok(true)
    }

    /// Registers a reaction from `user_id` on any copy of a broadcast
    /// message. Adds are idempotent per (user, emoji).
    pub async fn add_reaction(
        &self,
        message_id: u64,
        emoji: &str,
        user_id: u64,
    ) -> Result<ReactionOutcome, AppError> {
        self.apply(message_id, user_id, |map| map.add(emoji, user_id))
            .await
    }

    /// Withdraws a reaction from `user_id` on any copy of a broadcast
    /// message.
    pub async fn remove_reaction(
        &self,
        message_id: u64,
        emoji: &str,
        user_id: u64,
    ) -> Result<ReactionOutcome, AppError> {
        self.apply(message_id, user_id, |map| map.remove(emoji, user_id))
            .await
    }

    async fn apply<F>(
        &self,
        message_id: u64,
        user_id: u64,
        update: F,
    ) -> Result<ReactionOutcome, AppError>
    where
        F: FnOnce(&mut ReactionMap) -> ReactionChange,
    {
        let repo = HubMessageRepository::new(&self.db);
        let Some(original) = repo.resolve_origin(message_id).await? else {
            return Ok(ReactionOutcome::NotTracked);
        };

        let counter = format!("reactions:{}:{}", original.id, user_id);
        let burst = self.cache.incr_counter(&counter, self.cooldown).await?;
        if burst > MAX_REACTION_BURST {
            return Ok(ReactionOutcome::RateLimited);
        }

        let mut map = ReactionMap::from_value(&original.reactions);
        match update(&mut map) {
            ReactionChange::Added | ReactionChange::Removed => {}
            ReactionChange::AlreadyPresent | ReactionChange::NotPresent => {
                return Ok(ReactionOutcome::Unchanged);
            }
            ReactionChange::EmojiCapReached => return Ok(ReactionOutcome::CapReached),
        }

        repo.update_reactions(&original.id, &map).await?;
        self.push_components(&original, &map).await?;
        Ok(ReactionOutcome::Updated)
    }

    /// Re-renders the reaction buttons on every recorded copy. Failed edits
    /// are skipped; that copy simply shows a stale count until the next
    /// update reaches it.
    async fn push_components(
        &self,
        original: &entity::hub_message::Model,
        map: &ReactionMap,
    ) -> Result<usize, AppError> {
        let components = render_reaction_row(&original.id, map);

        let message_repo = HubMessageRepository::new(&self.db);
        let connection_repo = ConnectionRepository::new(&self.db);

        let mut updated = 0;
        for copy in message_repo.copies(&original.id).await? {
            let channel_id: u64 = match copy.channel_id.parse() {
                Ok(id) => id,
                Err(_) => continue,
            };
            let Some(conn) = connection_repo.find_by_channel(channel_id).await? else {
                continue;
            };
            let message_id: u64 = match copy.message_id.parse() {
                Ok(id) => id,
                Err(_) => continue,
            };

            let target = if conn.parent_channel_id.is_some() {
                WebhookTarget::thread(conn.webhook_url.clone(), channel_id)
            } else {
                WebhookTarget::channel(conn.webhook_url.clone())
            };

            match self
                .gateway
                .edit_message(
                    &target,
                    message_id,
                    WebhookPayload::components_only(components.clone()),
                )
                .await
            {
                Ok(()) => updated += 1,
                Err(e) => warn!(channel_id, "skipping copy during reaction render: {e}"),
            }
        }
        Ok(updated)
    }
}

/// Renders the reaction map as at most one action row: the top reaction as
/// a labelled button, plus a "+N more" aggregate when other emoji exist.
/// An empty map renders no components, clearing the row.
pub fn render_reaction_row(origin_id: &str, map: &ReactionMap) -> Vec<CreateActionRow> {
    let Some((top_emoji, count)) = map.top() else {
        return Vec::new();
    };

    let mut buttons = vec![CreateButton::new(format!("reaction:{origin_id}:{top_emoji}"))
        .label(format!("{top_emoji} {count}"))
        .style(ButtonStyle::Secondary)];

    let extra = map.distinct_emojis().saturating_sub(1);
    if extra > 0 {
        buttons.push(
            CreateButton::new(format!("reaction_more:{origin_id}"))
                .label(format!("+ {extra} more"))
                .style(ButtonStyle::Secondary),
        );
    }

    vec![CreateActionRow::Buttons(buttons)]
}
