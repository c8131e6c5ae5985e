//! Integration test support for the ingestion pipeline
//!
//! An in-memory store standing in for PostgreSQL, recording collaborators
//! and provider payload fixtures.

pub mod fixtures;
pub mod helpers;
pub mod store;

pub use fixtures::*;
pub use helpers::*;
pub use store::MemoryStore;
