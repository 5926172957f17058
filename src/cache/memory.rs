//! In-process cache implementation.
//!
//! Behaviorally equivalent to [`RedisCache`](super::redis::RedisCache) for a
//! single-process deployment: same key scheme, same TTL policy, same orphan
//! self-healing. Used by the test suite and as the fallback when no
//! `REDIS_URL` is configured.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::cache::{keys, CacheError, CacheTtls, CallCache};
use crate::model::call::ActiveCall;

struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn live(&self) -> Option<&T> {
        (Instant::now() < self.expires_at).then_some(&self.value)
    }
}

#[derive(Default)]
struct Inner {
    /// Every keyspace shares one string-keyed map, mirroring the flat Redis
    /// keyspace produced by [`keys`].
    entries: HashMap<String, Expiring<String>>,
    counters: HashMap<String, (u64, Instant)>,
}

pub struct MemoryCache {
    inner: Mutex<Inner>,
    ttls: CacheTtls,
}

impl MemoryCache {
    pub fn new(ttls: CacheTtls) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttls,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(CacheTtls::default())
    }
}

#[async_trait]
impl CallCache for MemoryCache {
    async fn get_webhook(&self, channel_id: u64) -> Result<Option<String>, CacheError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .entries
            .get(&keys::webhook(channel_id))
            .and_then(Expiring::live)
            .cloned())
    }

    async fn cache_webhook(&self, channel_id: u64, url: &str) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().await;
        inner.entries.insert(
            keys::webhook(channel_id),
            Expiring::new(url.to_string(), self.ttls.webhook),
        );
        Ok(())
    }

    async fn get_active_call(&self, channel_id: u64) -> Result<Option<ActiveCall>, CacheError> {
        let mut inner = self.inner.lock().await;
        let index_key = keys::channel_call(channel_id);

        let Some(call_id) = inner
            .entries
            .get(&index_key)
            .and_then(Expiring::live)
            .cloned()
        else {
            return Ok(None);
        };

        let payload = inner
            .entries
            .get(&keys::call_payload(&call_id))
            .and_then(Expiring::live)
            .cloned();
        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => {
                // Orphan index entry; the payload expired underneath it.
                inner.entries.remove(&index_key);
                Ok(None)
            }
        }
    }

    async fn cache_active_call(&self, call: &ActiveCall) -> Result<(), CacheError> {
        let payload = serde_json::to_string(call)?;
        let mut inner = self.inner.lock().await;
        // Single critical section stands in for the Redis pipeline.
        inner.entries.insert(
            keys::call_payload(&call.id),
            Expiring::new(payload, self.ttls.call),
        );
        for participant in &call.participants {
            inner.entries.insert(
                keys::channel_call(participant.channel_id),
                Expiring::new(call.id.clone(), self.ttls.call),
            );
        }
        Ok(())
    }

    async fn remove_active_call(&self, channel_id: u64) -> Result<Option<ActiveCall>, CacheError> {
        let Some(call) = self.get_active_call(channel_id).await? else {
            return Ok(None);
        };

        let mut inner = self.inner.lock().await;
        inner.entries.remove(&keys::call_payload(&call.id));
        for participant in &call.participants {
            inner.entries.remove(&keys::channel_call(participant.channel_id));
        }
        Ok(Some(call))
    }

    async fn has_recent_match(&self, user_a: u64, user_b: u64) -> Result<bool, CacheError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .entries
            .get(&keys::recent_match(user_a, user_b))
            .and_then(Expiring::live)
            .is_some())
    }

    async fn record_recent_match(&self, user_a: u64, user_b: u64) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().await;
        inner.entries.insert(
            keys::recent_match(user_a, user_b),
            Expiring::new("1".to_string(), self.ttls.recent_match),
        );
        Ok(())
    }

    async fn incr_counter(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let mut inner = self.inner.lock().await;
        let key = keys::counter(key);
        let now = Instant::now();
        let counter = inner.counters.entry(key).or_insert((0, now + window));
        if now >= counter.1 {
            *counter = (0, now + window);
        }
        counter.0 += 1;
        Ok(counter.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::call::{ActiveCall, CallRequest};

    fn cache() -> MemoryCache {
        MemoryCache::default()
    }

    fn call_between(channel_a: u64, channel_b: u64) -> ActiveCall {
        let a = CallRequest::new(channel_a, channel_a * 10, channel_a * 100, "https://a.example");
        let b = CallRequest::new(channel_b, channel_b * 10, channel_b * 100, "https://b.example");
        ActiveCall::connect(&a, &b)
    }

    #[tokio::test]
    async fn every_participant_channel_resolves_the_same_call() {
        let cache = cache();
        let call = call_between(1, 2);
        cache.cache_active_call(&call).await.unwrap();

        let via_a = cache.get_active_call(1).await.unwrap().unwrap();
        let via_b = cache.get_active_call(2).await.unwrap().unwrap();
        assert_eq!(via_a.id, call.id);
        assert_eq!(via_b.id, call.id);
        assert_eq!(via_a, via_b);
    }

    #[tokio::test]
    async fn remove_clears_every_participant_index() {
        let cache = cache();
        let call = call_between(1, 2);
        cache.cache_active_call(&call).await.unwrap();

        let removed = cache.remove_active_call(1).await.unwrap();
        assert_eq!(removed.map(|c| c.id), Some(call.id));

        assert!(cache.get_active_call(1).await.unwrap().is_none());
        assert!(cache.get_active_call(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cached_call_round_trips_user_sets() {
        let cache = cache();
        let mut call = call_between(1, 2);
        if let Some(p) = call.participant_mut(1) {
            p.users.insert(555);
        }
        cache.cache_active_call(&call).await.unwrap();

        let restored = cache.get_active_call(2).await.unwrap().unwrap();
        assert_eq!(restored, call);
        assert!(restored.participant(1).unwrap().users.contains(&555));
    }

    #[tokio::test]
    async fn orphan_index_entry_heals_on_read() {
        let cache = cache();
        let call = call_between(1, 2);
        cache.cache_active_call(&call).await.unwrap();

        // Drop only the payload, leaving both index entries dangling.
        cache
            .inner
            .lock()
            .await
            .entries
            .remove(&keys::call_payload(&call.id));

        assert!(cache.get_active_call(1).await.unwrap().is_none());
        let inner = cache.inner.lock().await;
        assert!(!inner.entries.contains_key(&keys::channel_call(1)));
    }

    #[tokio::test]
    async fn recent_match_markers_are_symmetric() {
        let cache = cache();
        cache.record_recent_match(100, 200).await.unwrap();

        assert!(cache.has_recent_match(100, 200).await.unwrap());
        assert!(cache.has_recent_match(200, 100).await.unwrap());
        assert!(!cache.has_recent_match(100, 300).await.unwrap());
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let cache = MemoryCache::new(CacheTtls {
            webhook: Duration::from_millis(10),
            call: Duration::from_millis(10),
            recent_match: Duration::from_millis(10),
        });
        cache.cache_webhook(1, "https://hook.example").await.unwrap();
        cache.record_recent_match(1, 2).await.unwrap();

        tokio::time::sleep(Duration::from_millis(25)).await;

        assert!(cache.get_webhook(1).await.unwrap().is_none());
        assert!(!cache.has_recent_match(1, 2).await.unwrap());
    }

    #[tokio::test]
    async fn counter_increments_within_window_and_resets_after() {
        let cache = cache();
        assert_eq!(cache.incr_counter("r:1", Duration::from_secs(60)).await.unwrap(), 1);
        assert_eq!(cache.incr_counter("r:1", Duration::from_secs(60)).await.unwrap(), 2);

        assert_eq!(
            cache.incr_counter("r:2", Duration::from_millis(5)).await.unwrap(),
            1
        );
        tokio::time::sleep(Duration::from_millis(15)).await;
        assert_eq!(
            cache.incr_counter("r:2", Duration::from_millis(5)).await.unwrap(),
            1,
            "window elapsed, counter restarts"
        );
    }
}
