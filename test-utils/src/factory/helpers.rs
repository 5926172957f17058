//! Shared helper utilities for factory methods.

use sea_orm::{DatabaseConnection, DbErr};

/// Counter for generating unique IDs in tests.
static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

/// Gets the next unique counter value for test data.
pub fn next_id() -> u64 {
    COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
}

/// Creates a hub with `connections` connected channels, each in its own
/// guild.
///
/// # Returns
/// - `Ok((hub, connections))` - The hub and its connection rows
/// - `Err(DbErr)` - Database error during creation
pub async fn create_hub_with_connections(
    db: &DatabaseConnection,
    connections: usize,
) -> Result<(entity::hub::Model, Vec<entity::connection::Model>), DbErr> {
    let hub = crate::factory::hub::create_hub(db).await?;

    let mut created = Vec::with_capacity(connections);
    for _ in 0..connections {
        let channel_id = 1_000_000 + next_id();
        let guild_id = 2_000_000 + next_id();
        created.push(
            crate::factory::connection::create_connection(db, &hub.id, channel_id, guild_id)
                .await?,
        );
    }

    Ok((hub, created))
}
