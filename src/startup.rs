//! Application wiring: configuration, database, cache, engine, schedulers,
//! and the Discord client.

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use serenity::all::Client;
use serenity::http::Http;
use tracing::{info, warn};

use crate::bot::start::{BotContext, Handler};
use crate::cache::memory::MemoryCache;
use crate::cache::redis::RedisCache;
use crate::cache::{CacheTtls, CallCache};
use crate::config::Config;
use crate::error::AppError;
use crate::gateway::discord::DiscordGateway;
use crate::gateway::WebhookGateway;
use crate::scheduler;
use crate::service::broadcast::reactions::ReactionService;
use crate::service::broadcast::BroadcastService;
use crate::service::call::matching::MatchingEngine;
use crate::service::call::notify::CallNotifier;
use crate::service::call::queue::CallQueue;
use crate::service::call::CallService;

/// Builds every component and runs the bot until the gateway connection
/// ends.
pub async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;
    info!("database connected and migrated");

    let ttls = CacheTtls {
        webhook: config.call.webhook_cache_ttl,
        call: config.call.call_cache_ttl,
        recent_match: config.call.recent_match_window,
    };
    let cache: Arc<dyn CallCache> = match &config.redis_url {
        Some(url) => {
            let cache = RedisCache::connect(url, ttls).await?;
            info!("connected to redis");
            Arc::new(cache)
        }
        None => {
            warn!("REDIS_URL not set; using the in-process cache (single-process only)");
            Arc::new(MemoryCache::new(ttls))
        }
    };

    // The services share one HTTP client; the gateway client the serenity
    // Client manages is only used for event delivery.
    let http = Arc::new(Http::new(&config.discord_bot_token));
    let gateway: Arc<dyn WebhookGateway> = Arc::new(DiscordGateway::new(http));

    let notifier = Arc::new(CallNotifier::new(gateway.clone()));
    let queue = Arc::new(CallQueue::new(config.call.queue_timeout));
    let engine = Arc::new(MatchingEngine::new(
        db.clone(),
        queue.clone(),
        cache.clone(),
        notifier.clone(),
        config.call.sweep_interval,
    ));
    let calls = Arc::new(CallService::new(
        db.clone(),
        cache.clone(),
        queue.clone(),
        engine.clone(),
        notifier.clone(),
        gateway.clone(),
        config.call.clone(),
    ));
    let broadcast = Arc::new(BroadcastService::new(db.clone(), gateway.clone()));
    let reactions = Arc::new(ReactionService::new(
        db.clone(),
        gateway.clone(),
        cache.clone(),
        config.call.reaction_cooldown,
    ));

    engine.clone().start().await;
    let _scheduler = scheduler::calls::start_schedulers(
        db.clone(),
        queue.clone(),
        notifier.clone(),
        config.call.retention_grace,
    )
    .await?;

    let app = Arc::new(BotContext {
        db,
        calls,
        broadcast,
        reactions,
    });

    let mut client = Client::builder(&config.discord_bot_token, Handler::intents())
        .event_handler(Handler::new(app))
        .await?;

    info!("starting Discord client");
    client.start().await?;

    engine.stop().await;
    Ok(())
}
