//! TTL cache layer backing live call routing and rate limiting.
//!
//! The cache is the single source of truth for "is this channel busy"
//! checks. Active calls are stored once per call id, with one small index
//! entry per participant channel pointing at the call id; index entries for
//! a call are always written in a single atomic pipeline so no participant
//! can observe a half-registered call. An index entry whose payload has
//! expired is treated as absent and deleted on read.

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::call::ActiveCall;

/// Errors from the cache backend.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("cache payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Time-to-live policy for the cache keyspaces.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    /// Webhook URLs change rarely; cached for about a day.
    pub webhook: Duration,
    /// Call payloads are refreshed on activity, so a medium TTL suffices.
    pub call: Duration,
    /// Recent-match markers discourage immediate rematching.
    pub recent_match: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            webhook: Duration::from_secs(24 * 60 * 60),
            call: Duration::from_secs(60 * 60),
            recent_match: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Cache operations used by the call subsystem and the reaction throttle.
#[async_trait]
pub trait CallCache: Send + Sync {
    /// Cached webhook URL for a channel, if any.
    async fn get_webhook(&self, channel_id: u64) -> Result<Option<String>, CacheError>;

    async fn cache_webhook(&self, channel_id: u64, url: &str) -> Result<(), CacheError>;

    /// Resolves the active call for any participant channel.
    async fn get_active_call(&self, channel_id: u64) -> Result<Option<ActiveCall>, CacheError>;

    /// Stores the call payload and the index entry of every participant in
    /// one atomic write.
    async fn cache_active_call(&self, call: &ActiveCall) -> Result<(), CacheError>;

    /// Removes the call payload and the index entries of *all* of its
    /// participants, regardless of which channel id is passed in. Returns
    /// the removed call.
    async fn remove_active_call(&self, channel_id: u64) -> Result<Option<ActiveCall>, CacheError>;

    /// Whether the two users carry an unexpired recent-match marker.
    async fn has_recent_match(&self, user_a: u64, user_b: u64) -> Result<bool, CacheError>;

    async fn record_recent_match(&self, user_a: u64, user_b: u64) -> Result<(), CacheError>;

    /// Increments a rate-limit counter, setting it to expire after `window`.
    /// Returns the post-increment value.
    async fn incr_counter(&self, key: &str, window: Duration) -> Result<u64, CacheError>;
}

/// Key scheme shared by the Redis and in-memory implementations.
pub(crate) mod keys {
    /// `channel id -> call id` index entry.
    pub fn channel_call(channel_id: u64) -> String {
        format!("call:channel:{channel_id}")
    }

    /// Serialized [`ActiveCall`](crate::model::call::ActiveCall) payload.
    pub fn call_payload(call_id: &str) -> String {
        format!("call:data:{call_id}")
    }

    /// Pair marker, normalized so (a, b) and (b, a) share one key.
    pub fn recent_match(user_a: u64, user_b: u64) -> String {
        let (lo, hi) = if user_a <= user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };
        format!("call:recent:{lo}:{hi}")
    }

    pub fn webhook(channel_id: u64) -> String {
        format!("webhook:channel:{channel_id}")
    }

    pub fn counter(name: &str) -> String {
        format!("ratelimit:{name}")
    }
}
