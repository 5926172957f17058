//! Domain models shared between the service layer and the data layer.
//!
//! These are plain Rust types, independent of both the SeaORM entities and
//! the cache's serialized form. Repositories translate between these models
//! and entity rows; the cache serializes them through serde.

pub mod broadcast;
pub mod call;
pub mod hub;
