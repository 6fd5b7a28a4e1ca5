//! Database-specific error types and conversions.

use dreamforge_core::error::{DreamforgeError, ExternalService};

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl From<DbError> for DreamforgeError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => DreamforgeError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => DreamforgeError::AlreadyExists { entity },
            other => DreamforgeError::external(ExternalService::Storage, None, other.to_string()),
        }
    }
}
