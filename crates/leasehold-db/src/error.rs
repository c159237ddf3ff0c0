//! Database-specific error types and conversions.

use leasehold_core::error::LeaseholdError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// Stored data that does not decode into the domain model.
    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// Overlap detected inside a ledger transaction, or a store-level
    /// write conflict between concurrent transactions.
    #[error("Write conflict: {0}")]
    Conflict(String),
}

impl From<DbError> for LeaseholdError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LeaseholdError::NotFound { entity, id },
            DbError::Conflict(reason) => LeaseholdError::Conflict { reason },
            other => LeaseholdError::Database(other.to_string()),
        }
    }
}
