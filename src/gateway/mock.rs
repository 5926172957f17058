//! Recording gateway double for engine and pipeline tests.
//!
//! Deliveries are captured instead of sent; individual webhook URLs can be
//! configured to fail with a "gone" error to exercise the degradation
//! paths.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::gateway::{
    GatewayError, SentMessage, WebhookGateway, WebhookPayload, WebhookTarget,
};

/// One captured webhook execution or edit.
#[derive(Debug, Clone)]
pub struct RecordedDelivery {
    pub target: WebhookTarget,
    pub payload: WebhookPayload,
    /// Message id assigned to the delivery (executes only).
    pub message_id: u64,
}

#[derive(Default)]
pub struct MockGateway {
    pub executes: Mutex<Vec<RecordedDelivery>>,
    pub edits: Mutex<Vec<RecordedDelivery>>,
    pub deletes: Mutex<Vec<(WebhookTarget, u64)>>,
    pub channel_messages: Mutex<Vec<(u64, String)>>,
    gone_urls: Mutex<HashSet<String>>,
    deleter: Mutex<Option<u64>>,
    next_message_id: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicU64::new(9000),
            ..Self::default()
        }
    }

    /// All subsequent deliveries to `url` fail with [`GatewayError::WebhookGone`].
    pub fn mark_gone(&self, url: &str) {
        self.gone_urls
            .lock()
            .expect("mock gateway lock poisoned")
            .insert(url.to_string());
    }

    /// Configures the moderator id returned by [`resolve_deleter`].
    ///
    /// [`resolve_deleter`]: WebhookGateway::resolve_deleter
    pub fn set_deleter(&self, user_id: Option<u64>) {
        *self.deleter.lock().expect("mock gateway lock poisoned") = user_id;
    }

    pub fn executed_contents(&self) -> Vec<String> {
        self.executes
            .lock()
            .expect("mock gateway lock poisoned")
            .iter()
            .filter_map(|d| d.payload.content.clone())
            .collect()
    }

    pub fn executed_urls(&self) -> Vec<String> {
        self.executes
            .lock()
            .expect("mock gateway lock poisoned")
            .iter()
            .map(|d| d.target.url.clone())
            .collect()
    }

    fn check_gone(&self, url: &str) -> Result<(), GatewayError> {
        if self
            .gone_urls
            .lock()
            .expect("mock gateway lock poisoned")
            .contains(url)
        {
            return Err(GatewayError::WebhookGone);
        }
        Ok(())
    }
}

#[async_trait]
impl WebhookGateway for MockGateway {
    async fn execute(
        &self,
        target: &WebhookTarget,
        payload: WebhookPayload,
    ) -> Result<SentMessage, GatewayError> {
        self.check_gone(&target.url)?;
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.executes
            .lock()
            .expect("mock gateway lock poisoned")
            .push(RecordedDelivery {
                target: target.clone(),
                payload,
                message_id,
            });
        Ok(SentMessage {
            id: message_id,
            channel_id: target.thread_id.unwrap_or(0),
        })
    }

    async fn edit_message(
        &self,
        target: &WebhookTarget,
        message_id: u64,
        payload: WebhookPayload,
    ) -> Result<(), GatewayError> {
        self.check_gone(&target.url)?;
        self.edits
            .lock()
            .expect("mock gateway lock poisoned")
            .push(RecordedDelivery {
                target: target.clone(),
                payload,
                message_id,
            });
        Ok(())
    }

    async fn delete_message(
        &self,
        target: &WebhookTarget,
        message_id: u64,
    ) -> Result<(), GatewayError> {
        self.check_gone(&target.url)?;
        self.deletes
            .lock()
            .expect("mock gateway lock poisoned")
            .push((target.clone(), message_id));
        Ok(())
    }

    async fn fetch_message(
        &self,
        _target: &WebhookTarget,
        message_id: u64,
    ) -> Result<Option<SentMessage>, GatewayError> {
        let found = self
            .executes
            .lock()
            .expect("mock gateway lock poisoned")
            .iter()
            .find(|d| d.message_id == message_id)
            .map(|d| SentMessage {
                id: d.message_id,
                channel_id: d.target.thread_id.unwrap_or(0),
            });
        Ok(found)
    }

    async fn send_to_channel(
        &self,
        channel_id: u64,
        content: String,
    ) -> Result<(), GatewayError> {
        self.channel_messages
            .lock()
            .expect("mock gateway lock poisoned")
            .push((channel_id, content));
        Ok(())
    }

    async fn get_or_create_channel_webhook(
        &self,
        channel_id: u64,
    ) -> Result<String, GatewayError> {
        Ok(format!(
            "https://discord.com/api/webhooks/{channel_id}/mock-token"
        ))
    }

    async fn resolve_deleter(&self, _guild_id: u64, _channel_id: u64) -> Option<u64> {
        *self.deleter.lock().expect("mock gateway lock poisoned")
    }
}
