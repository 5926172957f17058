//! In-memory queue of pending call requests.
//!
//! Service order is priority descending (higher priority values are served
//! first), then enqueue time ascending. Expired requests are invisible to
//! every read path; [`CallQueue::evict_expired`] physically removes them so
//! the caller can notify the affected channels.
//!
//! The queue is process-local. In a sharded deployment each cluster owns
//! its queue, and the cache keeps the "is this channel busy" answer
//! consistent across processes.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::call::CallError;
use crate::model::call::{CallRequest, QueueStatus};

pub struct CallQueue {
    entries: RwLock<Vec<CallRequest>>,
    timeout: Duration,
}

impl CallQueue {
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            timeout,
        }
    }

    /// Adds a request and returns its queue status.
    ///
    /// Rejects the request when its channel is already queued. The caller is
    /// responsible for the already-in-call check against the cache before
    /// enqueueing.
    pub async fn enqueue(&self, request: CallRequest) -> Result<QueueStatus, CallError> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();

        if entries
            .iter()
            .any(|r| r.channel_id == request.channel_id && !r.is_expired(self.timeout, now))
        {
            return Err(CallError::ChannelAlreadyInQueue);
        }

        let channel_id = request.channel_id;
        entries.push(request);

        let ordered = Self::service_order(&entries, self.timeout);
        let position = ordered
            .iter()
            .position(|r| r.channel_id == channel_id)
            .map(|index| index + 1)
            .unwrap_or(ordered.len());
        Ok(QueueStatus {
            position,
            queue_length: ordered.len(),
        })
    }

    /// Removes a request by id. Returns it if it was present and live.
    pub async fn dequeue(&self, request_id: &str) -> Option<CallRequest> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        let index = entries
            .iter()
            .position(|r| r.id == request_id && !r.is_expired(self.timeout, now))?;
        Some(entries.remove(index))
    }

    /// Removes a channel's request, e.g. when the user cancels.
    pub async fn dequeue_by_channel(&self, channel_id: u64) -> Option<CallRequest> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        let index = entries
            .iter()
            .position(|r| r.channel_id == channel_id && !r.is_expired(self.timeout, now))?;
        Some(entries.remove(index))
    }

    /// Atomically removes both requests of a prospective match.
    ///
    /// This is the matching engine's commit step: if either request was
    /// cancelled (or expired) since it was selected, nothing is removed and
    /// `None` is returned, so the engine aborts and retries on the next
    /// sweep.
    pub async fn take_pair(
        &self,
        request_a: &str,
        request_b: &str,
    ) -> Option<(CallRequest, CallRequest)> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();

        let index_a = entries
            .iter()
            .position(|r| r.id == request_a && !r.is_expired(self.timeout, now))?;
        let index_b = entries
            .iter()
            .position(|r| r.id == request_b && !r.is_expired(self.timeout, now))?;

        // Remove the higher index first so the lower one stays valid.
        let (first, second) = if index_a > index_b {
            (index_a, index_b)
        } else {
            (index_b, index_a)
        };
        let removed_first = entries.remove(first);
        let removed_second = entries.remove(second);

        if removed_first.id == request_a {
            Some((removed_first, removed_second))
        } else {
            Some((removed_second, removed_first))
        }
    }

    /// Re-inserts a request taken by a failed commit, preserving its
    /// original enqueue time and priority.
    pub async fn restore(&self, request: CallRequest) {
        let mut entries = self.entries.write().await;
        if !entries.iter().any(|r| r.channel_id == request.channel_id) {
            entries.push(request);
        }
    }

    /// Queue status for a channel, or `None` when not queued.
    pub async fn queue_status(&self, channel_id: u64) -> Option<QueueStatus> {
        let entries = self.entries.read().await;
        let ordered = Self::service_order(&entries, self.timeout);
        let position = ordered
            .iter()
            .position(|r| r.channel_id == channel_id)?;
        Some(QueueStatus {
            position: position + 1,
            queue_length: ordered.len(),
        })
    }

    /// Live pending requests in service order.
    pub async fn pending(&self) -> Vec<CallRequest> {
        let entries = self.entries.read().await;
        Self::service_order(&entries, self.timeout)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn is_queued(&self, channel_id: u64) -> bool {
        let entries = self.entries.read().await;
        let now = Utc::now();
        entries
            .iter()
            .any(|r| r.channel_id == channel_id && !r.is_expired(self.timeout, now))
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        let now = Utc::now();
        entries
            .iter()
            .filter(|r| !r.is_expired(self.timeout, now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes expired requests and returns them so the initiating channels
    /// can be notified of the timeout.
    pub async fn evict_expired(&self) -> Vec<CallRequest> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        let mut expired = Vec::new();
        entries.retain(|r| {
            if r.is_expired(self.timeout, now) {
                expired.push(r.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Live entries sorted by priority (descending), then enqueue time.
    fn service_order(entries: &[CallRequest], timeout: Duration) -> Vec<&CallRequest> {
        let now = Utc::now();
        let mut live: Vec<&CallRequest> = entries
            .iter()
            .filter(|r| !r.is_expired(timeout, now))
            .collect();
        live.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.requested_at.cmp(&b.requested_at))
        });
        live
    }
}
