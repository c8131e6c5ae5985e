//! # relay-db
//!
//! PostgreSQL implementations of the store traits defined in `relay-core`.
//!
//! - Connection pool management and schema migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_db::{create_pool, run_migrations, DatabaseConfig, PgMessageRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     run_migrations(&pool).await?;
//!     let messages = PgMessageRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool, MIGRATIONS_DIR};
pub use repositories::{
    PgAttachmentRepository, PgChannelRepository, PgContactRepository, PgConversationRepository,
    PgMessageRepository,
};
