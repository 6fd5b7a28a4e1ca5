//! DreamForge Database: SurrealDB connection management and the
//! creation store.
//!
//! This crate provides:
//! - Opening a ready store ([`open`], [`open_in_memory`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - The [`CreationRepository`](dreamforge_core::repository::CreationRepository)
//!   implementation ([`repository::SurrealCreationRepository`])
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, open, open_in_memory, prepare};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
