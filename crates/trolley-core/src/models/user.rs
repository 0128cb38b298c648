//! User domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::token::{AccessToken, RefreshToken};

/// A global identity that can authenticate and hold permission grants.
///
/// `scope` is a space-delimited list of grants; each grant is either
/// the literal `superuser` or `<groupScope>:<role>` with role `admin`
/// or `regular`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub active: bool,
    pub name: String,
    /// Globally unique login name.
    pub username: String,
    /// Hashed at rest; redacted to `""` on every read path.
    pub password: String,
    pub scope: String,

    /// Issued access tokens, present only when eagerly requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_tokens: Option<Vec<AccessToken>>,
    /// Issued refresh tokens, present only when eagerly requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_tokens: Option<Vec<RefreshToken>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    #[serde(default = "super::group::default_active")]
    pub active: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    /// Raw password; hashed with Argon2id before storage.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub active: Option<bool>,
    pub name: Option<String>,
    pub username: Option<String>,
    /// `None` or `Some("")` leaves the stored password unchanged.
    pub password: Option<String>,
    pub scope: Option<String>,
}

/// Result of a credentials lookup for authentication. Keeps the
/// password hash out of the [`User`] struct so that redaction cannot
/// be forgotten on a read path.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}
