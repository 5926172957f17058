//! Error types for the application.
//!
//! `AppError` is the top-level aggregate used by startup, the schedulers,
//! and the broadcast pipeline. The call subsystem has its own caller-facing
//! taxonomy in [`call::CallError`]; call entry points return that type so
//! the (out-of-scope) command layer can map each failure to a user-visible
//! response code.

pub mod call;
pub mod config;

use thiserror::Error;

use crate::cache::CacheError;
use crate::error::call::CallError;
use crate::error::config::ConfigError;
use crate::gateway::GatewayError;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error during startup or environment variable loading.
    #[error(transparent)]
    ConfigErr(#[from] ConfigError),

    /// Database operation error from SeaORM.
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),

    /// Cache backend error.
    #[error(transparent)]
    CacheErr(#[from] CacheError),

    /// Webhook delivery error that was not handled per-recipient.
    #[error(transparent)]
    GatewayErr(#[from] GatewayError),

    /// Call-subsystem error surfaced outside the call command boundary.
    #[error(transparent)]
    CallErr(#[from] CallError),

    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size; `serenity::Error` would otherwise inflate
    /// every `AppError` variant.
    #[error(transparent)]
    DiscordErr(#[from] Box<serenity::Error>),

    /// Cron scheduler error.
    #[error(transparent)]
    SchedulerErr(#[from] tokio_cron_scheduler::JobSchedulerError),

    /// Resource not found error.
    #[error("{0}")]
    NotFound(String),

    /// Internal error with custom message.
    #[error("{0}")]
    InternalError(String),
}

/// Manual conversion from serenity::Error to AppError, boxing to keep the
/// enum small.
impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::DiscordErr(Box::new(err))
    }
}
