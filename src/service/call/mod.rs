//! Call lifecycle orchestration: the userphone state machine.
//!
//! Per channel the states are IDLE -> QUEUED -> IN_CALL -> IDLE, derived
//! from the queue and the cache rather than stored anywhere. The cache is
//! authoritative for busy checks; the repository is the durable record and
//! backfills the cache on miss.

pub mod events;
pub mod matching;
pub mod notify;
pub mod queue;

#[cfg(test)]
mod test;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::cache::CallCache;
use crate::config::CallConfig;
use crate::data::CallRepository;
use crate::error::call::CallError;
use crate::gateway::{WebhookGateway, WebhookPayload, WebhookTarget};
use crate::model::call::{ActiveCall, CallMessage, CallStats, MatchOutcome, QueueStatus};
use crate::service::call::events::{CallEvent, EndReason};
use crate::service::call::matching::MatchingEngine;
use crate::service::call::notify::CallNotifier;
use crate::service::call::queue::CallQueue;

/// Priority given to a channel that skipped its previous call, so skippers
/// are served ahead of fresh requests.
const SKIP_PRIORITY: i32 = 1;

/// Result of initiating (or skipping into) a call.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// No partner available yet; the channel waits in the queue.
    Queued(QueueStatus),
    /// A partner was available immediately.
    Matched(ActiveCall),
}

/// Result of hanging up.
#[derive(Debug, Clone, Copy)]
pub enum HangupOutcome {
    /// The channel was still queued; the request was cancelled.
    CancelledQueue,
    /// An ongoing call was ended.
    Ended(CallStats),
}

/// Derived per-channel state, for the command layer's status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCallState {
    Idle,
    Queued,
    InCall,
}

pub struct CallService {
    db: DatabaseConnection,
    cache: Arc<dyn CallCache>,
    queue: Arc<CallQueue>,
    engine: Arc<MatchingEngine>,
    notifier: Arc<CallNotifier>,
    gateway: Arc<dyn WebhookGateway>,
    config: CallConfig,
}

impl CallService {
    pub fn new(
        db: DatabaseConnection,
        cache: Arc<dyn CallCache>,
        queue: Arc<CallQueue>,
        engine: Arc<MatchingEngine>,
        notifier: Arc<CallNotifier>,
        gateway: Arc<dyn WebhookGateway>,
        config: CallConfig,
    ) -> Self {
        Self {
            db,
            cache,
            queue,
            engine,
            notifier,
            gateway,
            config,
        }
    }

    /// Enters the queue (or connects immediately when a partner is already
    /// waiting).
    ///
    /// Rejected with `ChannelAlreadyInCall`/`ChannelAlreadyInQueue` without
    /// any state change when the channel is busy.
    pub async fn initiate_call(
        &self,
        channel_id: u64,
        guild_id: u64,
        user_id: u64,
    ) -> Result<CallOutcome, CallError> {
        self.initiate_with_priority(channel_id, guild_id, user_id, 0)
            .await
    }

    /// Ends the current call and immediately looks for a new partner.
    ///
    /// The recent-match exclusion recorded when the call ends guarantees the
    /// skipping channel is not paired straight back with its previous
    /// partner.
    pub async fn skip_call(&self, channel_id: u64, user_id: u64) -> Result<CallOutcome, CallError> {
        let Some(call) = self.get_active_call(channel_id).await? else {
            return Err(CallError::CallNotFound);
        };
        let guild_id = call
            .participant(channel_id)
            .map(|p| p.guild_id)
            .ok_or(CallError::InvalidChannel)?;

        self.end_call(&call, EndReason::Skip).await?;

        self.initiate_with_priority(channel_id, guild_id, user_id, SKIP_PRIORITY)
            .await
    }

    /// Leaves the queue, or ends the ongoing call for both sides.
    pub async fn hangup_call(&self, channel_id: u64) -> Result<HangupOutcome, CallError> {
        if self.queue.dequeue_by_channel(channel_id).await.is_some() {
            return Ok(HangupOutcome::CancelledQueue);
        }

        let Some(call) = self.get_active_call(channel_id).await? else {
            return Err(CallError::CallNotFound);
        };
        let stats = self.end_call(&call, EndReason::Hangup).await?;
        Ok(HangupOutcome::Ended(stats))
    }

    /// Appends a message to the call log, tracks the author on their side's
    /// `users` set, refreshes the cached payload, and relays the content to
    /// the other participant's webhook.
    ///
    /// Relay failure does not fail the operation: the message is recorded
    /// and the sending side is told about the delivery problem.
    pub async fn update_call_message(
        &self,
        channel_id: u64,
        user_id: u64,
        username: &str,
        content: &str,
        attachment_url: Option<String>,
    ) -> Result<(), CallError> {
        let Some(mut call) = self.get_active_call(channel_id).await? else {
            return Err(CallError::CallNotFound);
        };

        let message = CallMessage {
            author_id: user_id,
            author_username: username.to_string(),
            content: content.to_string(),
            attachment_url: attachment_url.clone(),
            timestamp: Utc::now(),
        };

        let repo = CallRepository::new(&self.db);
        repo.append_message(&call.id, &message).await?;

        let newly_tracked = {
            let participant = call
                .participant_mut(channel_id)
                .ok_or(CallError::InvalidChannel)?;
            participant.users.insert(user_id)
        };
        if newly_tracked {
            if let Some(participant) = call.participant(channel_id) {
                repo.set_participant_users(&call.id, channel_id, &participant.users)
                    .await?;
            }
        }

        call.messages.push(message);

        // Refreshes the payload TTL along with the new state.
        self.cache.cache_active_call(&call).await?;

        let Some(peer) = call.peer_of(channel_id) else {
            return Err(CallError::InvalidChannel);
        };
        let mut payload = WebhookPayload::text(content).with_author(username, None);
        if let Some(url) = attachment_url {
            payload = payload.with_embed(serenity::all::CreateEmbed::new().image(url));
        }

        let target = WebhookTarget::channel(&peer.webhook_url);
        if let Err(e) = self.gateway.execute(&target, payload).await {
            warn!(call_id = %call.id, "call relay delivery failed: {e}");
            if let Some(own) = call.participant(channel_id) {
                self.notifier
                    .notify_webhook(
                        &own.webhook_url,
                        &CallEvent::ConnectionError {
                            detail: e.to_string(),
                        },
                    )
                    .await;
            }
        }

        Ok(())
    }

    /// The ongoing call this channel is part of, if any. Reads the cache
    /// first and falls back to the repository, repopulating the cache on a
    /// miss.
    pub async fn get_active_call(&self, channel_id: u64) -> Result<Option<ActiveCall>, CallError> {
        if let Some(call) = self.cache.get_active_call(channel_id).await? {
            return Ok(Some(call));
        }

        let repo = CallRepository::new(&self.db);
        let Some(call) = repo.find_ongoing_by_channel(channel_id).await? else {
            return Ok(None);
        };
        self.cache.cache_active_call(&call).await?;
        Ok(Some(call))
    }

    /// Tracks an additional user talking from this channel. The peers are
    /// notified; repeated joins are no-ops.
    pub async fn add_participant(
        &self,
        channel_id: u64,
        user_id: u64,
        username: &str,
    ) -> Result<(), CallError> {
        let Some(mut call) = self.get_active_call(channel_id).await? else {
            return Err(CallError::CallNotFound);
        };

        let added = {
            let participant = call
                .participant_mut(channel_id)
                .ok_or(CallError::InvalidChannel)?;
            participant.users.insert(user_id)
        };
        if !added {
            return Ok(());
        }

        if let Some(participant) = call.participant(channel_id) {
            CallRepository::new(&self.db)
                .set_participant_users(&call.id, channel_id, &participant.users)
                .await?;
        }
        self.cache.cache_active_call(&call).await?;

        self.notifier
            .notify_peers(
                &call,
                channel_id,
                &CallEvent::ParticipantJoined {
                    username: username.to_string(),
                },
            )
            .await;
        Ok(())
    }

    /// Announces a user leaving one side of the call. The `users` set is
    /// deliberately not pruned: it is the historical record of who talked.
    pub async fn remove_participant(
        &self,
        channel_id: u64,
        _user_id: u64,
        username: &str,
    ) -> Result<(), CallError> {
        let Some(call) = self.get_active_call(channel_id).await? else {
            return Err(CallError::CallNotFound);
        };

        self.notifier
            .notify_peers(
                &call,
                channel_id,
                &CallEvent::ParticipantLeft {
                    username: username.to_string(),
                },
            )
            .await;
        Ok(())
    }

    /// Queue position for a waiting channel.
    pub async fn get_queue_status(&self, channel_id: u64) -> Option<QueueStatus> {
        self.queue.queue_status(channel_id).await
    }

    /// Derived state of a channel.
    pub async fn channel_state(&self, channel_id: u64) -> Result<ChannelCallState, CallError> {
        if self.get_active_call(channel_id).await?.is_some() {
            return Ok(ChannelCallState::InCall);
        }
        if self.queue.is_queued(channel_id).await {
            return Ok(ChannelCallState::Queued);
        }
        Ok(ChannelCallState::Idle)
    }

    async fn initiate_with_priority(
        &self,
        channel_id: u64,
        guild_id: u64,
        user_id: u64,
        priority: i32,
    ) -> Result<CallOutcome, CallError> {
        if self.get_active_call(channel_id).await?.is_some() {
            return Err(CallError::ChannelAlreadyInCall);
        }
        if self.queue.is_queued(channel_id).await {
            return Err(CallError::ChannelAlreadyInQueue);
        }

        let webhook_url = self.channel_webhook(channel_id).await?;
        let request = crate::model::call::CallRequest::new(channel_id, guild_id, user_id, webhook_url)
            .with_priority(priority)
            .with_cluster(self.config.cluster_id);

        self.engine.note_enqueued().await;
        let status = self.queue.enqueue(request.clone()).await?;

        match self.engine.find_match(&request).await? {
            MatchOutcome::Matched { call, .. } => Ok(CallOutcome::Matched(call)),
            MatchOutcome::Unmatched => Ok(CallOutcome::Queued(status)),
        }
    }

    /// Resolves the channel's relay webhook, creating and caching one when
    /// necessary.
    async fn channel_webhook(&self, channel_id: u64) -> Result<String, CallError> {
        if let Some(url) = self.cache.get_webhook(channel_id).await? {
            return Ok(url);
        }

        let url = self
            .gateway
            .get_or_create_channel_webhook(channel_id)
            .await
            .map_err(|e| {
                warn!(channel_id, "webhook creation failed: {e}");
                CallError::WebhookCreationFailed
            })?;
        self.cache.cache_webhook(channel_id, &url).await?;
        Ok(url)
    }

    /// Ends a call for everyone: durable row, cache index, recent-match
    /// markers, and the end-of-call notifications.
    async fn end_call(&self, call: &ActiveCall, reason: EndReason) -> Result<CallStats, CallError> {
        let ended_at = Utc::now();

        CallRepository::new(&self.db).end(&call.id, ended_at).await?;

        if let Some(first) = call.participants.first() {
            self.cache.remove_active_call(first.channel_id).await?;
        }

        // Everyone who talked on one side is excluded from rematching with
        // everyone who talked on the other, for the length of the window.
        if let [side_a, side_b] = call.participants.as_slice() {
            for user_a in &side_a.users {
                for user_b in &side_b.users {
                    if let Err(e) = self.cache.record_recent_match(*user_a, *user_b).await {
                        warn!("failed to record recent match: {e}");
                    }
                }
            }
        }

        let mut ended = call.clone();
        ended.status = crate::model::call::CallStatus::Ended;
        ended.ended_at = Some(ended_at);
        let stats = ended.stats(ended_at);

        self.notifier
            .notify_call(&ended, &CallEvent::Ended { reason, stats })
            .await;

        Ok(stats)
    }
}
