//! InterChat Test Utils
//!
//! Shared testing utilities for building integration and unit tests for the
//! InterChat bot. This crate offers a builder pattern for creating test
//! contexts with in-memory SQLite databases and customizable table schemas.
//!
//! # Overview
//!
//! - **TestBuilder**: Fluent builder for configuring test environments
//! - **TestContext**: Test environment containing the database connection
//! - **TestError**: Error types that can occur during test setup
//! - **factory**: Entity factories with unique-id generation
//!
//! # Usage
//!
//! ```rust,ignore
//! use test_utils::builder::TestBuilder;
//!
//! #[tokio::test]
//! async fn test_call_operations() {
//!     let test = TestBuilder::new().with_call_tables().build().await.unwrap();
//!     let db = test.db.as_ref().unwrap();
//!     // Perform database operations...
//! }
//! ```

pub mod builder;
pub mod context;
pub mod error;
pub mod factory;
