pub use sea_orm_migration::prelude::*;

mod m20260801_000001_create_hub_table;
mod m20260801_000002_create_connection_table;
mod m20260801_000003_create_hub_message_table;
mod m20260801_000004_create_broadcast_table;
mod m20260802_000005_create_call_table;
mod m20260802_000006_create_call_participant_table;
mod m20260802_000007_create_call_message_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_hub_table::Migration),
            Box::new(m20260801_000002_create_connection_table::Migration),
            Box::new(m20260801_000003_create_hub_message_table::Migration),
            Box::new(m20260801_000004_create_broadcast_table::Migration),
            Box::new(m20260802_000005_create_call_table::Migration),
            Box::new(m20260802_000006_create_call_participant_table::Migration),
            Box::new(m20260802_000007_create_call_message_table::Migration),
        ]
    }
}
