//! Access and refresh token domain models.
//!
//! Tokens are opaque bearer credentials stored server-side. An access
//! token carries a snapshot of the user's scope taken at issuance, so
//! later scope edits do not affect tokens already in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Globally unique opaque token value.
    pub token: String,
    pub expires: DateTime<Utc>,
    /// Scope snapshot copied from the user at issuance.
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccessToken {
    pub user_id: Uuid,
    pub token: String,
    pub expires: DateTime<Utc>,
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Globally unique opaque token value.
    pub token: String,
    pub expires: DateTime<Utc>,
    /// The access token value this refresh token can replace.
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefreshToken {
    pub user_id: Uuid,
    pub token: String,
    pub expires: DateTime<Utc>,
    pub access_token: String,
}
