//! SeaORM entity models for the InterChat schema.
//!
//! Hubs group connections (one per mirrored channel); hub messages record the
//! origin of a broadcast together with its reaction map, and broadcast rows
//! track every delivered copy. Calls, their participants, and their relayed
//! messages back the userphone subsystem.

pub mod prelude;

pub mod broadcast;
pub mod call;
pub mod call_message;
pub mod call_participant;
pub mod connection;
pub mod hub;
pub mod hub_message;
