//! Trolley auth — opaque bearer token generation and the token
//! issuance/refresh/resolution service. Password hashing itself
//! lives in `trolley_core::password`.

pub mod config;
pub mod error;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, Authentication, TokenGrant};
