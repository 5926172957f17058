//! Delivery of call lifecycle messages to participant channels.
//!
//! Notifications ride the same webhooks as relayed messages. Delivery
//! failures are logged and swallowed: a dead webhook must never fail or
//! roll back a call state transition.

use std::sync::Arc;

use serenity::all::CreateEmbed;
use tracing::warn;

use crate::gateway::{WebhookGateway, WebhookPayload, WebhookTarget};
use crate::model::call::ActiveCall;
use crate::service::call::events::CallEvent;

/// Identity notifications are sent under.
const NOTIFIER_USERNAME: &str = "InterChat Calls";

pub struct CallNotifier {
    gateway: Arc<dyn WebhookGateway>,
}

impl CallNotifier {
    pub fn new(gateway: Arc<dyn WebhookGateway>) -> Self {
        Self { gateway }
    }

    /// Sends one lifecycle event to a single webhook. Never fails.
    pub async fn notify_webhook(&self, webhook_url: &str, event: &CallEvent) {
        let embed = CreateEmbed::new()
            .title(event.title())
            .description(event.description())
            .color(event.color());
        let payload = WebhookPayload::embed(embed)
            .with_author(NOTIFIER_USERNAME, None);

        let target = WebhookTarget::channel(webhook_url);
        if let Err(e) = self.gateway.execute(&target, payload).await {
            warn!("failed to deliver call notification: {e}");
        }
    }

    /// Sends one lifecycle event to every participant of a call.
    pub async fn notify_call(&self, call: &ActiveCall, event: &CallEvent) {
        for participant in &call.participants {
            self.notify_webhook(&participant.webhook_url, event).await;
        }
    }

    /// Sends an event to every participant except `channel_id`.
    pub async fn notify_peers(&self, call: &ActiveCall, channel_id: u64, event: &CallEvent) {
        for participant in &call.participants {
            if participant.channel_id != channel_id {
                self.notify_webhook(&participant.webhook_url, event).await;
            }
        }
    }
}
