//! Redis-backed cache implementation.
//!
//! Uses a multiplexed [`ConnectionManager`] (cheap to clone, reconnects on
//! its own) and `MULTI`/`EXEC` pipelines for the multi-key index writes.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::cache::{keys, CacheError, CacheTtls, CallCache};
use crate::model::call::ActiveCall;

pub struct RedisCache {
    manager: ConnectionManager,
    ttls: CacheTtls,
}

impl RedisCache {
    /// Opens a managed connection to the given Redis URL.
    pub async fn connect(url: &str, ttls: CacheTtls) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self { manager, ttls })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

#[async_trait]
impl CallCache for RedisCache {
    async fn get_webhook(&self, channel_id: u64) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn();
        let url: Option<String> = conn.get(keys::webhook(channel_id)).await?;
        Ok(url)
    }

    async fn cache_webhook(&self, channel_id: u64, url: &str) -> Result<(), CacheError> {
        let mut conn = self.conn();
        conn.set_ex::<_, _, ()>(keys::webhook(channel_id), url, self.ttls.webhook.as_secs())
            .await?;
        Ok(())
    }

    async fn get_active_call(&self, channel_id: u64) -> Result<Option<ActiveCall>, CacheError> {
        let mut conn = self.conn();
        let index_key = keys::channel_call(channel_id);

        let Some(call_id) = conn.get::<_, Option<String>>(&index_key).await? else {
            return Ok(None);
        };

        let payload: Option<String> = conn.get(keys::call_payload(&call_id)).await?;
        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => {
                // Orphan index entry; the payload expired underneath it.
                conn.del::<_, ()>(&index_key).await?;
                Ok(None)
            }
        }
    }

    async fn cache_active_call(&self, call: &ActiveCall) -> Result<(), CacheError> {
        let mut conn = self.conn();
        let payload = serde_json::to_string(call)?;
        let ttl = self.ttls.call.as_secs();

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.set_ex(keys::call_payload(&call.id), payload, ttl).ignore();
        for participant in &call.participants {
            pipe.set_ex(keys::channel_call(participant.channel_id), &call.id, ttl)
                .ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn remove_active_call(&self, channel_id: u64) -> Result<Option<ActiveCall>, CacheError> {
        let Some(call) = self.get_active_call(channel_id).await? else {
            return Ok(None);
        };

        let mut conn = self.conn();
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.del(keys::call_payload(&call.id)).ignore();
        for participant in &call.participants {
            pipe.del(keys::channel_call(participant.channel_id)).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(Some(call))
    }

    async fn has_recent_match(&self, user_a: u64, user_b: u64) -> Result<bool, CacheError> {
        let mut conn = self.conn();
        let exists: bool = conn.exists(keys::recent_match(user_a, user_b)).await?;
        Ok(exists)
    }

    async fn record_recent_match(&self, user_a: u64, user_b: u64) -> Result<(), CacheError> {
        let mut conn = self.conn();
        conn.set_ex::<_, _, ()>(
            keys::recent_match(user_a, user_b),
            1,
            self.ttls.recent_match.as_secs(),
        )
        .await?;
        Ok(())
    }

    async fn incr_counter(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let mut conn = self.conn();
        let key = keys::counter(key);
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .expire(&key, window.as_secs() as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }
}
