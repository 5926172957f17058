//! Periodic background jobs.
//!
//! The matching engine runs its own interval loop; everything else —
//! queue-timeout eviction and call retention — rides the cron scheduler
//! started here. Jobs share the live services by cloning their handles into
//! the job closures.

pub mod calls;
