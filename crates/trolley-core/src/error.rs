//! Error types for the Trolley system.
//!
//! Every service failure is one of a small, fixed taxonomy that the
//! HTTP layer maps to a status code. Field-related messages follow the
//! `"<field>: <description>"` convention throughout.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrolleyError {
    /// Validation or uniqueness failure (HTTP 400). The message
    /// aggregates every failed check, not just the first.
    #[error("{message}")]
    BadRequest { message: String },

    /// Missing entity (HTTP 404).
    #[error("{message}")]
    NotFound { message: String },

    /// Authentication or authorization failure (HTTP 403).
    #[error("{message}")]
    Forbidden { message: String },

    /// Database error (HTTP 500).
    #[error("Database error: {0}")]
    Database(String),

    /// Anything else that should never happen (HTTP 500).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrolleyError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        TrolleyError::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        TrolleyError::NotFound {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        TrolleyError::Forbidden {
            message: message.into(),
        }
    }
}

pub type TrolleyResult<T> = Result<T, TrolleyError>;
