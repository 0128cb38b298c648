//! Authentication error types.

use thiserror::Error;
use trolley_core::error::TrolleyError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,
}

impl From<AuthError> for TrolleyError {
    fn from(err: AuthError) -> Self {
        TrolleyError::Forbidden {
            message: err.to_string(),
        }
    }
}
