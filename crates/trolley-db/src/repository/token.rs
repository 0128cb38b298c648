//! SurrealDB implementation of [`TokenRepository`].
//!
//! Token values are globally unique opaque strings; lookups go
//! through the unique `token` index. Error messages never echo the
//! presented token value.
//!
//! `$token` is a protected SurrealDB parameter, so queries bind the
//! value as `$tok`.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use trolley_core::error::{TrolleyError, TrolleyResult};
use trolley_core::models::token::{
    AccessToken, CreateAccessToken, CreateRefreshToken, RefreshToken,
};
use trolley_core::repository::TokenRepository;
use uuid::Uuid;

use crate::error::{DbError, classify_check_error};
use crate::repository::{CountRow, parse_uuid};

#[derive(Debug, SurrealValue)]
struct AccessTokenRow {
    record_id: String,
    user_id: String,
    token: String,
    expires: DateTime<Utc>,
    scope: String,
}

#[derive(Debug, SurrealValue)]
struct RefreshTokenRow {
    record_id: String,
    user_id: String,
    token: String,
    expires: DateTime<Utc>,
    access_token: String,
}

impl AccessTokenRow {
    fn try_into_token(self) -> Result<AccessToken, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        let user_id = parse_uuid("user", &self.user_id)?;
        Ok(AccessToken {
            id,
            user_id,
            token: self.token,
            expires: self.expires,
            scope: self.scope,
        })
    }
}

impl RefreshTokenRow {
    fn try_into_token(self) -> Result<RefreshToken, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        let user_id = parse_uuid("user", &self.user_id)?;
        Ok(RefreshToken {
            id,
            user_id,
            token: self.token,
            expires: self.expires,
            access_token: self.access_token,
        })
    }
}

/// A user's access tokens, newest expiry first. Shared with the user
/// repository's `withAccessTokens` include.
pub(crate) async fn select_access_tokens<C: Connection>(
    db: &Surreal<C>,
    user_id: Uuid,
) -> TrolleyResult<Vec<AccessToken>> {
    let mut result = db
        .query(
            "SELECT meta::id(id) AS record_id, * FROM access_token \
             WHERE user_id = $user_id ORDER BY expires DESC",
        )
        .bind(("user_id", user_id.to_string()))
        .await
        .map_err(DbError::from)?;
    let rows: Vec<AccessTokenRow> = result.take(0).map_err(DbError::from)?;
    rows.into_iter()
        .map(|row| row.try_into_token())
        .collect::<Result<Vec<_>, DbError>>()
        .map_err(Into::into)
}

/// A user's refresh tokens, newest expiry first. Shared with the
/// user repository's `withRefreshTokens` include.
pub(crate) async fn select_refresh_tokens<C: Connection>(
    db: &Surreal<C>,
    user_id: Uuid,
) -> TrolleyResult<Vec<RefreshToken>> {
    let mut result = db
        .query(
            "SELECT meta::id(id) AS record_id, * FROM refresh_token \
             WHERE user_id = $user_id ORDER BY expires DESC",
        )
        .bind(("user_id", user_id.to_string()))
        .await
        .map_err(DbError::from)?;
    let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
    rows.into_iter()
        .map(|row| row.try_into_token())
        .collect::<Result<Vec<_>, DbError>>()
        .map_err(Into::into)
}

fn unknown_token(kind: &str) -> TrolleyError {
    TrolleyError::not_found(format!("token: Unknown {kind} token"))
}

/// SurrealDB implementation of the Token repository.
#[derive(Clone)]
pub struct SurrealTokenRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TokenRepository for SurrealTokenRepository<C> {
    async fn insert_access(&self, input: CreateAccessToken) -> TrolleyResult<AccessToken> {
        let id = Uuid::new_v4();
        let result = self
            .db
            .query(
                "CREATE type::record('access_token', $id) SET \
                 user_id = $user_id, token = $tok, \
                 expires = $expires, scope = $scope",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("tok", input.token.clone()))
            .bind(("expires", input.expires))
            .bind(("scope", input.scope.clone()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(classify_check_error)?;

        Ok(AccessToken {
            id,
            user_id: input.user_id,
            token: input.token,
            expires: input.expires,
            scope: input.scope,
        })
    }

    async fn insert_refresh(&self, input: CreateRefreshToken) -> TrolleyResult<RefreshToken> {
        let id = Uuid::new_v4();
        let result = self
            .db
            .query(
                "CREATE type::record('refresh_token', $id) SET \
                 user_id = $user_id, token = $tok, \
                 expires = $expires, access_token = $access_token",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("tok", input.token.clone()))
            .bind(("expires", input.expires))
            .bind(("access_token", input.access_token.clone()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(classify_check_error)?;

        Ok(RefreshToken {
            id,
            user_id: input.user_id,
            token: input.token,
            expires: input.expires,
            access_token: input.access_token,
        })
    }

    async fn find_access(&self, token: &str) -> TrolleyResult<AccessToken> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM access_token \
                 WHERE token = $tok",
            )
            .bind(("tok", token.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<AccessTokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| unknown_token("access"))?;

        Ok(row.try_into_token()?)
    }

    async fn find_refresh(&self, token: &str) -> TrolleyResult<RefreshToken> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM refresh_token \
                 WHERE token = $tok",
            )
            .bind(("tok", token.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| unknown_token("refresh"))?;

        Ok(row.try_into_token()?)
    }

    async fn access_tokens(&self, user_id: Uuid) -> TrolleyResult<Vec<AccessToken>> {
        select_access_tokens(&self.db, user_id).await
    }

    async fn refresh_tokens(&self, user_id: Uuid) -> TrolleyResult<Vec<RefreshToken>> {
        select_refresh_tokens(&self.db, user_id).await
    }

    async fn relink_refresh(&self, token: &str, access_token: &str) -> TrolleyResult<()> {
        self.find_refresh(token).await?;

        self.db
            .query(
                "UPDATE refresh_token SET access_token = $access_token \
                 WHERE token = $tok",
            )
            .bind(("tok", token.to_string()))
            .bind(("access_token", access_token.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn revoke_access(&self, token: &str) -> TrolleyResult<()> {
        self.find_access(token).await?;

        // Linked refresh tokens die with the access token.
        self.db
            .query(
                "DELETE refresh_token WHERE access_token = $tok; \
                 DELETE access_token WHERE token = $tok;",
            )
            .bind(("tok", token.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn purge_expired(&self) -> TrolleyResult<u64> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM access_token \
                 WHERE expires < time::now() GROUP ALL; \
                 SELECT count() AS total FROM refresh_token \
                 WHERE expires < time::now() GROUP ALL;",
            )
            .await
            .map_err(DbError::from)?;
        let access_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let refresh_rows: Vec<CountRow> = count_result.take(1).map_err(DbError::from)?;
        let total = access_rows.first().map(|r| r.total).unwrap_or(0)
            + refresh_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query(
                "DELETE access_token WHERE expires < time::now(); \
                 DELETE refresh_token WHERE expires < time::now();",
            )
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
