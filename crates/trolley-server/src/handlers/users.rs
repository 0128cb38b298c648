//! User administration. Every route here is superuser-only; responses
//! always carry a redacted password field.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use trolley_core::models::user::{CreateUser, UpdateUser, User};
use trolley_core::repository::{ParentRepository, UserIncludes};
use trolley_core::scope::Requirement;

use crate::error::ApiResult;
use crate::query::{self, Params};
use crate::state::AppState;

fn includes(params: &Params) -> UserIncludes {
    UserIncludes {
        access_tokens: query::flag(params, "withAccessTokens"),
        refresh_tokens: query::flag(params, "withRefreshTokens"),
    }
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> ApiResult<Json<Vec<User>>> {
    state
        .gate
        .authorize(&headers, None, Requirement::Superuser)
        .await?;
    let mut options = query::match_options(&params)?;
    options.includes = includes(&params);
    Ok(Json(state.users.all(&options).await?))
}

pub async fn exact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<User>> {
    state
        .gate
        .authorize(&headers, None, Requirement::Superuser)
        .await?;
    Ok(Json(state.users.exact(&username, &includes(&params)).await?))
}

pub async fn find(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<User>> {
    state
        .gate
        .authorize(&headers, None, Requirement::Superuser)
        .await?;
    let user_id = query::parse_id("userId", &user_id)?;
    Ok(Json(state.users.find(user_id, &includes(&params)).await?))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    state
        .gate
        .authorize(&headers, None, Requirement::Superuser)
        .await?;
    let user = state.users.insert(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> ApiResult<Json<User>> {
    state
        .gate
        .authorize(&headers, None, Requirement::Superuser)
        .await?;
    let user_id = query::parse_id("userId", &user_id)?;
    Ok(Json(state.users.update(user_id, input).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
    state
        .gate
        .authorize(&headers, None, Requirement::Superuser)
        .await?;
    let user_id = query::parse_id("userId", &user_id)?;
    Ok(Json(state.users.remove(user_id).await?))
}
