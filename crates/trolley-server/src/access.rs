//! Request authorization gate.
//!
//! Every handler calls [`AccessGate::authorize`] before touching a
//! repository. The gate resolves the bearer token, resolves the
//! target group's scope (through the [`GroupScopeCache`]), and runs
//! the scope matcher. Failures never reveal whether the group exists:
//! a non-superuser caller gets the same 403 for "no permission" and
//! "no such group".

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use surrealdb::engine::any::Any;
use trolley_core::error::{TrolleyError, TrolleyResult};
use trolley_core::repository::{GroupIncludes, ParentRepository};
use trolley_core::scope::{self, Requirement};
use trolley_db::repository::SurrealGroupRepository;
use uuid::Uuid;

use crate::cache::GroupScopeCache;
use crate::state::Auth;

pub const NO_TOKEN: &str = "No access token presented";
pub const NOT_AUTHORIZED: &str = "Required scope not authorized";

/// Outcome of a successful authorization check.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// `None` for anonymous access on unrestricted routes.
    pub user_id: Option<Uuid>,
    /// Scope snapshot from the presented access token.
    pub scope: String,
}

#[derive(Clone)]
pub struct AccessGate {
    auth: Auth,
    groups: SurrealGroupRepository<Any>,
    cache: GroupScopeCache,
}

impl AccessGate {
    pub fn new(auth: Auth, groups: SurrealGroupRepository<Any>, cache: GroupScopeCache) -> Self {
        Self {
            auth,
            groups,
            cache,
        }
    }

    /// Check the request against a requirement, scoped to `group_id`
    /// when the route targets a group's data.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        group_id: Option<Uuid>,
        required: Requirement,
    ) -> TrolleyResult<AuthContext> {
        let Some(token) = bearer_token(headers) else {
            if required == Requirement::Any {
                return Ok(AuthContext {
                    user_id: None,
                    scope: String::new(),
                });
            }
            return Err(TrolleyError::forbidden(NO_TOKEN));
        };

        let auth = self.auth.resolve(token).await?;
        let context = AuthContext {
            user_id: Some(auth.user_id),
            scope: auth.scope,
        };

        // Superusers skip scope matching entirely, which also means
        // they see the service's own NotFound for missing groups.
        if scope::is_superuser(&context.scope) {
            return Ok(context);
        }
        if required == Requirement::Superuser {
            return Err(TrolleyError::forbidden(NOT_AUTHORIZED));
        }

        if let Some(group_id) = group_id {
            let group_scope = self.group_scope(group_id).await?;
            if !scope::matches(&context.scope, &group_scope, required) {
                return Err(TrolleyError::forbidden(NOT_AUTHORIZED));
            }
        }

        Ok(context)
    }

    /// Resolve a group's scope through the cache. An unresolvable
    /// group reads as a plain authorization failure.
    async fn group_scope(&self, group_id: Uuid) -> TrolleyResult<String> {
        if let Some(scope) = self.cache.lookup(group_id).await {
            return Ok(scope);
        }

        // Snapshot before the read so a fill racing an invalidation
        // cannot land a stale scope.
        let generation = self.cache.generation().await;
        match self.groups.find(group_id, &GroupIncludes::default()).await {
            Ok(group) => {
                self.cache
                    .store(group_id, group.scope.clone(), generation)
                    .await;
                Ok(group.scope)
            }
            Err(TrolleyError::NotFound { .. }) => Err(TrolleyError::forbidden(NOT_AUTHORIZED)),
            Err(other) => Err(other),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
