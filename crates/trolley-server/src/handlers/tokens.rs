//! OAuth2 token endpoint. Supports the password and refresh_token
//! grants with an opaque bearer token response.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use trolley_auth::TokenGrant;
use trolley_core::error::TrolleyError;

use crate::access::{self, NO_TOKEN};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub refresh_token: String,
    pub scope: String,
}

impl From<TokenGrant> for TokenResponse {
    fn from(grant: TokenGrant) -> Self {
        Self {
            access_token: grant.access_token,
            token_type: "Bearer",
            expires_in: grant.expires_in,
            refresh_token: grant.refresh_token,
            scope: grant.scope,
        }
    }
}

fn required(field: &str, value: Option<&str>) -> Result<String, TrolleyError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(TrolleyError::bad_request(format!("{field}: Is required"))),
    }
}

pub async fn issue(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let grant = match request.grant_type.as_str() {
        "password" => {
            let username = required("username", request.username.as_deref())?;
            let password = required("password", request.password.as_deref())?;
            state.auth.issue(&username, &password).await?
        }
        "refresh_token" => {
            let token = required("refreshToken", request.refresh_token.as_deref())?;
            state.auth.refresh(&token).await?
        }
        other => {
            return Err(TrolleyError::bad_request(format!(
                "grantType: Unsupported grant type '{other}'"
            ))
            .into());
        }
    };
    Ok(Json(grant.into()))
}

pub async fn revoke(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let Some(token) = access::bearer_token(&headers) else {
        return Err(TrolleyError::forbidden(NO_TOKEN).into());
    };
    state.auth.revoke(token).await?;
    Ok(StatusCode::NO_CONTENT)
}
