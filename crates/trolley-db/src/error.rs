//! Database-specific error types and conversions.

use trolley_core::error::TrolleyError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A unique index rejected a write that slipped past the
    /// pre-check validations (concurrent insert).
    #[error("Uniqueness constraint violated: {0}")]
    Conflict(String),
}

impl From<DbError> for TrolleyError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(message) => TrolleyError::BadRequest { message },
            other => TrolleyError::Database(other.to_string()),
        }
    }
}

/// Classify a statement-level SurrealDB failure: unique index
/// violations become [`DbError::Conflict`], everything else is a
/// migration/statement error.
pub(crate) fn classify_check_error(err: surrealdb::Error) -> DbError {
    let text = err.to_string();
    if text.contains("already contains") || text.contains("index") {
        DbError::Conflict("Uniqueness constraint violated".into())
    } else {
        DbError::Migration(text)
    }
}
