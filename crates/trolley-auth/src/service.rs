//! Token issuance, refresh, resolution, and revocation.

use chrono::{Duration, Utc};
use trolley_core::error::{TrolleyError, TrolleyResult};
use trolley_core::models::token::{CreateAccessToken, CreateRefreshToken};
use trolley_core::password;
use trolley_core::repository::{TokenRepository, UserRepository};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token;

/// Issued token pair, shaped like an OAuth2 token response.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Scope snapshot embedded in the access token.
    pub scope: String,
}

/// Result of resolving a presented access token.
#[derive(Debug, Clone)]
pub struct Authentication {
    pub user_id: Uuid,
    /// Scope snapshot taken when the token was issued.
    pub scope: String,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, T: TokenRepository> {
    users: U,
    tokens: T,
    config: AuthConfig,
}

impl<U: UserRepository, T: TokenRepository> AuthService<U, T> {
    pub fn new(users: U, tokens: T, config: AuthConfig) -> Self {
        Self {
            users,
            tokens,
            config,
        }
    }

    /// Authenticate with username + password and issue a token pair.
    ///
    /// The access token snapshots the user's scope at issuance; later
    /// scope edits do not affect it. A miss on the username lookup
    /// and a password mismatch are indistinguishable to the caller.
    pub async fn issue(&self, username: &str, raw_password: &str) -> TrolleyResult<TokenGrant> {
        // Housekeeping: expired tokens are dead weight by definition.
        self.tokens.purge_expired().await?;

        let credentials = self.users.credentials(username).await.map_err(|e| match e {
            TrolleyError::NotFound { .. } => AuthError::InvalidCredentials.into(),
            other => other,
        })?;

        let valid = password::verify_password(
            raw_password,
            &credentials.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }
        if !credentials.user.active {
            return Err(AuthError::AccountInactive.into());
        }

        let user = credentials.user;
        let now = Utc::now();
        let access = self
            .tokens
            .insert_access(CreateAccessToken {
                user_id: user.id,
                token: token::generate_token(),
                expires: now + Duration::seconds(self.config.access_token_lifetime_secs as i64),
                scope: user.scope.clone(),
            })
            .await?;
        let refresh = self
            .tokens
            .insert_refresh(CreateRefreshToken {
                user_id: user.id,
                token: token::generate_token(),
                expires: now + Duration::seconds(self.config.refresh_token_lifetime_secs as i64),
                access_token: access.token.clone(),
            })
            .await?;

        Ok(TokenGrant {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: self.config.access_token_lifetime_secs,
            scope: access.scope,
        })
    }

    /// Exchange a valid refresh token for a fresh access token.
    ///
    /// The refresh token itself is retained and relinked to the new
    /// access token. The new token re-snapshots the user's current
    /// scope, so a refresh picks up permission changes.
    pub async fn refresh(&self, refresh_token: &str) -> TrolleyResult<TokenGrant> {
        let refresh = self
            .tokens
            .find_refresh(refresh_token)
            .await
            .map_err(|e| match e {
                TrolleyError::NotFound { .. } => AuthError::TokenInvalid.into(),
                other => other,
            })?;
        if refresh.expires <= Utc::now() {
            return Err(AuthError::TokenExpired.into());
        }

        let user = self
            .users
            .find(refresh.user_id, &Default::default())
            .await
            .map_err(|e| match e {
                TrolleyError::NotFound { .. } => AuthError::TokenInvalid.into(),
                other => other,
            })?;
        if !user.active {
            return Err(AuthError::AccountInactive.into());
        }

        let access = self
            .tokens
            .insert_access(CreateAccessToken {
                user_id: user.id,
                token: token::generate_token(),
                expires: Utc::now()
                    + Duration::seconds(self.config.access_token_lifetime_secs as i64),
                scope: user.scope,
            })
            .await?;
        self.tokens
            .relink_refresh(&refresh.token, &access.token)
            .await?;

        Ok(TokenGrant {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: self.config.access_token_lifetime_secs,
            scope: access.scope,
        })
    }

    /// Resolve a presented access token to its owning user and scope
    /// snapshot. Unknown and expired tokens are both rejected.
    pub async fn resolve(&self, access_token: &str) -> TrolleyResult<Authentication> {
        let access = self
            .tokens
            .find_access(access_token)
            .await
            .map_err(|e| match e {
                TrolleyError::NotFound { .. } => AuthError::TokenInvalid.into(),
                other => other,
            })?;
        if access.expires <= Utc::now() {
            return Err(AuthError::TokenExpired.into());
        }

        Ok(Authentication {
            user_id: access.user_id,
            scope: access.scope,
        })
    }

    /// Revoke an access token and its linked refresh tokens (logout).
    pub async fn revoke(&self, access_token: &str) -> TrolleyResult<()> {
        self.tokens
            .revoke_access(access_token)
            .await
            .map_err(|e| match e {
                TrolleyError::NotFound { .. } => AuthError::TokenInvalid.into(),
                other => other,
            })
    }
}
