//! Shared harness for call-engine tests: in-memory SQLite for the durable
//! store, the in-process cache, and the recording gateway.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use test_utils::builder::TestBuilder;

use crate::cache::memory::MemoryCache;
use crate::config::CallConfig;
use crate::gateway::mock::MockGateway;
use crate::model::call::CallRequest;
use crate::service::call::matching::MatchingEngine;
use crate::service::call::notify::CallNotifier;
use crate::service::call::queue::CallQueue;
use crate::service::call::CallService;

pub struct CallHarness {
    pub db: DatabaseConnection,
    pub gateway: Arc<MockGateway>,
    pub cache: Arc<MemoryCache>,
    pub queue: Arc<CallQueue>,
    pub engine: Arc<MatchingEngine>,
    pub service: CallService,
}

pub async fn harness() -> CallHarness {
    harness_with_timeout(Duration::from_secs(300)).await
}

pub async fn harness_with_timeout(queue_timeout: Duration) -> CallHarness {
    let test = TestBuilder::new()
        .with_call_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.unwrap();

    let gateway = Arc::new(MockGateway::new());
    let cache = Arc::new(MemoryCache::default());
    let queue = Arc::new(CallQueue::new(queue_timeout));
    let notifier = Arc::new(CallNotifier::new(gateway.clone()));
    let engine = Arc::new(MatchingEngine::new(
        db.clone(),
        queue.clone(),
        cache.clone(),
        notifier.clone(),
        Duration::from_millis(50),
    ));
    let config = CallConfig {
        queue_timeout,
        ..CallConfig::default()
    };
    let service = CallService::new(
        db.clone(),
        cache.clone(),
        queue.clone(),
        engine.clone(),
        notifier,
        gateway.clone(),
        config,
    );

    CallHarness {
        db,
        gateway,
        cache,
        queue,
        engine,
        service,
    }
}

/// A request whose webhook URL is derived from its channel id, matching
/// what the mock gateway hands out.
pub fn request(channel_id: u64, guild_id: u64, initiator_id: u64) -> CallRequest {
    CallRequest::new(
        channel_id,
        guild_id,
        initiator_id,
        format!("https://discord.com/api/webhooks/{channel_id}/mock-token"),
    )
}
