//! Database repository layer for all domain entities.
//!
//! Repositories use SeaORM entity models internally and translate to the
//! domain models in [`crate::model`] at the boundary. All database queries,
//! inserts, updates, and deletes go through these repositories.

pub mod broadcast;
pub mod call;
pub mod hub;

pub use broadcast::HubMessageRepository;
pub use call::CallRepository;
pub use hub::{ConnectionRepository, HubRepository};

#[cfg(test)]
mod test;
