use entity::prelude::*;
use sea_orm::{sea_query::TableCreateStatement, EntityTrait, Schema};

use crate::{context::TestContext, error::TestError};

/// Builder for creating test contexts with customizable database schemas.
///
/// Use the builder pattern to add entity tables, then call `build()` to
/// create the configured test context.
///
/// # Example
///
/// ```rust,ignore
/// use test_utils::builder::TestBuilder;
/// use entity::prelude::{Hub, Connection};
///
/// let test = TestBuilder::new()
///     .with_table(Hub)
///     .with_table(Connection)
///     .build()
///     .await?;
/// ```
pub struct TestBuilder {
    /// CREATE TABLE statements executed during database setup, in insertion
    /// order (tables with foreign keys after their referenced tables).
    tables: Vec<TableCreateStatement>,
}

impl TestBuilder {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Adds an entity table to the test database schema.
    ///
    /// Generates a CREATE TABLE statement from the provided SeaORM entity
    /// using SQLite backend syntax. Tables should be added in dependency
    /// order.
    pub fn with_table<E: EntityTrait>(mut self, entity: E) -> Self {
        let schema = Schema::new(sea_orm::DbBackend::Sqlite);
        self.tables.push(schema.create_table_from_entity(entity));
        self
    }

    /// Adds all tables required for hub broadcast operations:
    /// Hub, Connection, HubMessage, Broadcast.
    pub fn with_hub_tables(self) -> Self {
        self.with_table(Hub)
            .with_table(Connection)
            .with_table(HubMessage)
            .with_table(Broadcast)
    }

    /// Adds all tables required for call operations:
    /// Call, CallParticipant, CallMessage.
    pub fn with_call_tables(self) -> Self {
        self.with_table(Call)
            .with_table(CallParticipant)
            .with_table(CallMessage)
    }

    /// Creates the test context with the configured tables.
    pub async fn build(self) -> Result<TestContext, TestError> {
        let mut context = TestContext::new();
        context.with_tables(self.tables).await?;
        Ok(context)
    }
}

impl Default for TestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
