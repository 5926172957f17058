use std::time::Duration;

use crate::error::{config::ConfigError, AppError};

pub struct Config {
    pub database_url: String,
    pub discord_bot_token: String,
    /// Falls back to the in-process cache when unset (single-process dev).
    pub redis_url: Option<String>,

    pub call: CallConfig,
}

/// Tunables for the call subsystem and the relay pipelines. Every value has
/// a default and can be overridden through the environment.
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// How long a request may wait in the queue before it is evicted and
    /// the channel notified.
    pub queue_timeout: Duration,
    /// Interval of the matching engine's background sweep.
    pub sweep_interval: Duration,
    /// Window during which two users who just talked are not re-paired.
    pub recent_match_window: Duration,
    /// TTL of cached call payloads; refreshed on call activity.
    pub call_cache_ttl: Duration,
    /// TTL of cached webhook URLs.
    pub webhook_cache_ttl: Duration,
    /// Per-user, per-message cooldown window for reaction updates.
    pub reaction_cooldown: Duration,
    /// Ended calls older than this are purged unless reported.
    pub retention_grace: Duration,
    /// Identifies this process in a sharded deployment.
    pub cluster_id: Option<u32>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            queue_timeout: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(5),
            recent_match_window: Duration::from_secs(24 * 60 * 60),
            call_cache_ttl: Duration::from_secs(60 * 60),
            webhook_cache_ttl: Duration::from_secs(24 * 60 * 60),
            reaction_cooldown: Duration::from_secs(5),
            retention_grace: Duration::from_secs(30 * 60),
            cluster_id: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?,
            discord_bot_token: std::env::var("DISCORD_BOT_TOKEN")
                .map_err(|_| ConfigError::MissingEnvVar("DISCORD_BOT_TOKEN".to_string()))?,
            redis_url: std::env::var("REDIS_URL").ok(),
            call: CallConfig::from_env()?,
        })
    }
}

impl CallConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            queue_timeout: env_secs("CALL_QUEUE_TIMEOUT_SECS", defaults.queue_timeout)?,
            sweep_interval: env_secs("CALL_SWEEP_INTERVAL_SECS", defaults.sweep_interval)?,
            recent_match_window: env_secs(
                "CALL_RECENT_MATCH_WINDOW_SECS",
                defaults.recent_match_window,
            )?,
            call_cache_ttl: env_secs("CALL_CACHE_TTL_SECS", defaults.call_cache_ttl)?,
            webhook_cache_ttl: env_secs("WEBHOOK_CACHE_TTL_SECS", defaults.webhook_cache_ttl)?,
            reaction_cooldown: env_secs("REACTION_COOLDOWN_SECS", defaults.reaction_cooldown)?,
            retention_grace: env_secs("CALL_RETENTION_GRACE_SECS", defaults.retention_grace)?,
            cluster_id: env_parse("CLUSTER_ID")?,
        })
    }
}

/// Reads a duration in whole seconds from the environment, keeping the
/// default when the variable is unset.
fn env_secs(var: &str, default: Duration) -> Result<Duration, AppError> {
    match std::env::var(var) {
        Ok(raw) => {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: raw.clone(),
            })?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}

/// Reads an optional parseable value from the environment.
fn env_parse<T: std::str::FromStr>(var: &str) -> Result<Option<T>, AppError> {
    match std::env::var(var) {
        Ok(raw) => {
            let value = raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: raw.clone(),
            })?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}
