//! SurrealDB repository implementations.

mod creation;

pub use creation::SurrealCreationRepository;
