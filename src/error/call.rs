use thiserror::Error;

use crate::cache::CacheError;

/// Caller-visible failures of the call surface.
///
/// Every call entry point returns `Result<_, CallError>`; infrastructure
/// failures arrive as the `Database`/`Cache` variants rather than panics,
/// and validation/conflict variants are rejected before any state change.
#[derive(Error, Debug)]
pub enum CallError {
    #[error("this channel is already in an active call")]
    ChannelAlreadyInCall,

    #[error("this channel is already waiting in the call queue")]
    ChannelAlreadyInQueue,

    #[error("a webhook could not be created for this channel")]
    WebhookCreationFailed,

    #[error("no active call or queued request for this channel")]
    CallNotFound,

    #[error("no partner could be found before the queue timeout")]
    MatchingTimeout,

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("this channel cannot be used for calls")]
    InvalidChannel,

    #[error("missing permission: {0}")]
    PermissionDenied(String),
}

impl CallError {
    /// Stable machine-readable code for the command layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ChannelAlreadyInCall => "CHANNEL_ALREADY_IN_CALL",
            Self::ChannelAlreadyInQueue => "CHANNEL_ALREADY_IN_QUEUE",
            Self::WebhookCreationFailed => "WEBHOOK_CREATION_FAILED",
            Self::CallNotFound => "CALL_NOT_FOUND",
            Self::MatchingTimeout => "MATCHING_TIMEOUT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "REDIS_ERROR",
            Self::InvalidChannel => "INVALID_CHANNEL",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
        }
    }
}
