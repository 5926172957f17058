//! Business logic layer: the call engine and the broadcast/reaction relay.
//!
//! Services hold their dependencies (database connection, cache, gateway)
//! and expose the operations the bot's event handlers and the out-of-scope
//! command layer invoke.

pub mod broadcast;
pub mod call;
