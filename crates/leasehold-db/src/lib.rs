//! Leasehold Database: SurrealDB connection management, the versioned
//! schema and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Implementations of the `leasehold-core` repository traits
//!   ([`repository`])

mod codec;
mod connection;
mod error;
mod schema;

pub mod repository;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{SCHEMA_VERSION, run_migrations, schema_v1};
