//! SurrealDB repository implementations.
//!
//! Shared conventions (see the individual modules): record IDs are
//! UUID strings addressed via `type::record(...)`, list queries
//! project `meta::id(id) AS record_id`, and every child-entity query
//! carries a `group_id` clause so data stays partitioned by its
//! owning group.

mod category;
mod group;
mod item;
mod list;
mod token;
mod user;

pub use category::SurrealCategoryRepository;
pub use group::SurrealGroupRepository;
pub use item::SurrealItemRepository;
pub use list::SurrealListRepository;
pub use token::SurrealTokenRepository;
pub use user::SurrealUserRepository;

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use trolley_core::TrolleyResult;
use trolley_core::error::TrolleyError;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value)
        .map_err(|e| DbError::Migration(format!("invalid {field} UUID: {e}")))
}

/// `NotFound` for a missing owning group, in the standard message
/// convention.
pub(crate) fn missing_group(group_id: Uuid) -> TrolleyError {
    TrolleyError::not_found(format!("groupId: Missing Group '{group_id}'"))
}

/// Check that a group row exists.
pub(crate) async fn group_exists<C: Connection>(
    db: &Surreal<C>,
    group_id: Uuid,
) -> TrolleyResult<bool> {
    let mut result = db
        .query(
            "SELECT count() AS total FROM group \
             WHERE id = type::record('group', $id) GROUP ALL",
        )
        .bind(("id", group_id.to_string()))
        .await
        .map_err(DbError::from)?;
    let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
    Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
}

/// Count rows of `table` where a single field holds `value`,
/// excluding `exclude_id` when present (update re-validation of a
/// globally unique field).
pub(crate) async fn count_field<C: Connection>(
    db: &Surreal<C>,
    table: &str,
    field: &str,
    value: &str,
    exclude_id: Option<Uuid>,
) -> TrolleyResult<u64> {
    let mut query = format!("SELECT count() AS total FROM {table} WHERE {field} = $value");
    if exclude_id.is_some() {
        query.push_str(&format!(" AND id != type::record('{table}', $exclude)"));
    }
    query.push_str(" GROUP ALL");

    let mut builder = db.query(query).bind(("value", value.to_string()));
    if let Some(exclude) = exclude_id {
        builder = builder.bind(("exclude", exclude.to_string()));
    }

    let mut result = builder.await.map_err(DbError::from)?;
    let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
    Ok(rows.first().map(|r| r.total).unwrap_or(0))
}

/// Count rows of `table` with the given name under a group,
/// excluding `exclude_id` when present (update re-validation).
pub(crate) async fn count_group_name<C: Connection>(
    db: &Surreal<C>,
    table: &str,
    group_id: Uuid,
    name: &str,
    exclude_id: Option<Uuid>,
) -> TrolleyResult<u64> {
    let mut query = format!(
        "SELECT count() AS total FROM {table} \
         WHERE group_id = $group_id AND name = $name"
    );
    if exclude_id.is_some() {
        query.push_str(&format!(" AND id != type::record('{table}', $exclude)"));
    }
    query.push_str(" GROUP ALL");

    let mut builder = db
        .query(query)
        .bind(("group_id", group_id.to_string()))
        .bind(("name", name.to_string()));
    if let Some(exclude) = exclude_id {
        builder = builder.bind(("exclude", exclude.to_string()));
    }

    let mut result = builder.await.map_err(DbError::from)?;
    let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
    Ok(rows.first().map(|r| r.total).unwrap_or(0))
}
