//! List endpoints. Same access shape as categories.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use trolley_core::models::list::{CreateList, List, UpdateList};
use trolley_core::repository::{ChildRepository, ListIncludes};
use trolley_core::scope::Requirement;

use crate::error::ApiResult;
use crate::query::{self, Params};
use crate::state::AppState;

fn includes(params: &Params) -> ListIncludes {
    ListIncludes {
        group: query::flag(params, "withGroup"),
    }
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Vec<List>>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let mut options = query::match_options(&params)?;
    options.includes = includes(&params);
    Ok(Json(state.lists.all(group_id, &options).await?))
}

pub async fn exact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, name)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult<Json<List>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let list = state.lists.exact(group_id, &name, &includes(&params)).await?;
    Ok(Json(list))
}

pub async fn find(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, list_id)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult<Json<List>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    let list_id = query::parse_id("listId", &list_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let list = state
        .lists
        .find(group_id, list_id, &includes(&params))
        .await?;
    Ok(Json(list))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Json(input): Json<CreateList>,
) -> ApiResult<(StatusCode, Json<List>)> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let list = state.lists.insert(group_id, input).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, list_id)): Path<(String, String)>,
    Json(input): Json<UpdateList>,
) -> ApiResult<Json<List>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    let list_id = query::parse_id("listId", &list_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let list = state.lists.update(group_id, list_id, input).await?;
    Ok(Json(list))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, list_id)): Path<(String, String)>,
) -> ApiResult<Json<List>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    let list_id = query::parse_id("listId", &list_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let list = state.lists.remove(group_id, list_id).await?;
    Ok(Json(list))
}
