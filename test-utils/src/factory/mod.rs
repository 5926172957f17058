//! Entity factories for tests.
//!
//! Each factory inserts a row with sensible defaults and returns the created
//! model. Identifiers come from a shared atomic counter so entities never
//! collide within a test process.

pub mod call;
pub mod connection;
pub mod helpers;
pub mod hub;
