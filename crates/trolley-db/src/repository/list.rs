//! SurrealDB implementation of [`ListRepository`].

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use trolley_core::error::{TrolleyError, TrolleyResult};
use trolley_core::models::list::{CreateList, List, UpdateList};
use trolley_core::repository::{ChildRepository, ListIncludes, ListRepository, MatchOptions};
use trolley_core::validate;
use uuid::Uuid;

use crate::error::{DbError, classify_check_error};
use crate::repository::{count_group_name, group_exists, missing_group, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ListRow {
    group_id: String,
    active: bool,
    name: String,
    notes: Option<String>,
    theme: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct ListRowWithId {
    record_id: String,
    group_id: String,
    active: bool,
    name: String,
    notes: Option<String>,
    theme: Option<String>,
}

impl ListRow {
    fn try_into_list(self, id: Uuid) -> Result<List, DbError> {
        let group_id = parse_uuid("group", &self.group_id)?;
        Ok(List {
            id,
            group_id,
            active: self.active,
            name: self.name,
            notes: self.notes,
            theme: self.theme,
            group: None,
        })
    }
}

impl ListRowWithId {
    fn try_into_list(self) -> Result<List, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        let group_id = parse_uuid("group", &self.group_id)?;
        Ok(List {
            id,
            group_id,
            active: self.active,
            name: self.name,
            notes: self.notes,
            theme: self.theme,
            group: None,
        })
    }
}

/// Filtered, ordered selection of a group's lists.
pub(crate) async fn select_lists<C: Connection>(
    db: &Surreal<C>,
    group_id: Uuid,
    options: &MatchOptions<ListIncludes>,
) -> TrolleyResult<Vec<List>> {
    let mut clauses = vec!["group_id = $group_id"];
    if options.active {
        clauses.push("active = true");
    }
    if options.name.is_some() {
        clauses.push("string::contains(string::lowercase(name), string::lowercase($name))");
    }

    let mut query = format!(
        "SELECT meta::id(id) AS record_id, * FROM list WHERE {} ORDER BY name ASC",
        clauses.join(" AND ")
    );
    if options.limit.is_some() {
        query.push_str(" LIMIT $limit");
    }
    if options.offset.is_some() {
        query.push_str(" START $offset");
    }

    let mut builder = db.query(query).bind(("group_id", group_id.to_string()));
    if let Some(name) = &options.name {
        builder = builder.bind(("name", name.clone()));
    }
    if let Some(limit) = options.limit {
        builder = builder.bind(("limit", limit));
    }
    if let Some(offset) = options.offset {
        builder = builder.bind(("offset", offset));
    }

    let mut result = builder.await.map_err(DbError::from)?;
    let rows: Vec<ListRowWithId> = result.take(0).map_err(DbError::from)?;

    let mut lists = rows
        .into_iter()
        .map(|row| row.try_into_list())
        .collect::<Result<Vec<_>, DbError>>()?;

    if options.includes.group {
        let group = super::group::fetch_group(db, group_id).await?;
        for list in &mut lists {
            list.group = group.clone().map(Box::new);
        }
    }

    Ok(lists)
}

fn missing_list(detail: impl std::fmt::Display, field: &str) -> TrolleyError {
    TrolleyError::not_found(format!("{field}: Missing List '{detail}'"))
}

/// SurrealDB implementation of the List repository.
#[derive(Clone)]
pub struct SurrealListRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealListRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn attach_group(&self, list: &mut List, includes: &ListIncludes) -> TrolleyResult<()> {
        if includes.group {
            list.group = super::group::fetch_group(&self.db, list.group_id)
                .await?
                .map(Box::new);
        }
        Ok(())
    }
}

impl<C: Connection> ChildRepository for SurrealListRepository<C> {
    type Entity = List;
    type Create = CreateList;
    type Update = UpdateList;
    type Includes = ListIncludes;

    async fn all(
        &self,
        group_id: Uuid,
        options: &MatchOptions<ListIncludes>,
    ) -> TrolleyResult<Vec<List>> {
        select_lists(&self.db, group_id, options).await
    }

    async fn exact(
        &self,
        group_id: Uuid,
        name: &str,
        includes: &ListIncludes,
    ) -> TrolleyResult<List> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM list \
                 WHERE group_id = $group_id AND name = $name",
            )
            .bind(("group_id", group_id.to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<ListRowWithId> = result.take(0).map_err(DbError::from)?;

        if rows.len() != 1 {
            return Err(missing_list(name, "name"));
        }
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_list(name, "name"))?;
        let mut list = row.try_into_list()?;

        self.attach_group(&mut list, includes).await?;
        Ok(list)
    }

    async fn find(&self, group_id: Uuid, id: Uuid, includes: &ListIncludes) -> TrolleyResult<List> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('list', $id) \
                 WHERE group_id = $group_id",
            )
            .bind(("id", id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<ListRow> = result.take(0).map_err(DbError::from)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_list(id, "listId"))?;
        let mut list = row.try_into_list(id)?;

        self.attach_group(&mut list, includes).await?;
        Ok(list)
    }

    async fn insert(&self, group_id: Uuid, input: CreateList) -> TrolleyResult<List> {
        if !group_exists(&self.db, group_id).await? {
            return Err(missing_group(group_id));
        }

        let mut errors = Vec::new();
        if let Some(name) = validate::require("name", input.name.as_deref(), &mut errors)
            && count_group_name(&self.db, "list", group_id, name, None).await? > 0
        {
            errors.push(validate::ValidationError::new(
                "name",
                format!("Name '{name}' is already in use"),
            ));
        }
        validate::aggregate(errors)?;

        let id = Uuid::new_v4();
        let result = self
            .db
            .query(
                "CREATE type::record('list', $id) SET \
                 group_id = $group_id, active = $active, \
                 name = $name, notes = $notes, theme = $theme",
            )
            .bind(("id", id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .bind(("active", input.active))
            .bind(("name", input.name))
            .bind(("notes", input.notes))
            .bind(("theme", input.theme))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(classify_check_error)?;
        let rows: Vec<ListRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| missing_list(id, "listId"))?;

        Ok(row.try_into_list(id)?)
    }

    async fn update(&self, group_id: Uuid, id: Uuid, input: UpdateList) -> TrolleyResult<List> {
        self.find(group_id, id, &ListIncludes::default()).await?;

        let mut errors = Vec::new();
        if let Some(name) = input.name.as_deref()
            && count_group_name(&self.db, "list", group_id, name, Some(id)).await? > 0
        {
            errors.push(validate::ValidationError::new(
                "name",
                format!("Name '{name}' is already in use"),
            ));
        }
        validate::aggregate(errors)?;

        let mut sets = Vec::new();
        if input.active.is_some() {
            sets.push("active = $active");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        if input.theme.is_some() {
            sets.push("theme = $theme");
        }

        if sets.is_empty() {
            return self.find(group_id, id, &ListIncludes::default()).await;
        }

        let query = format!(
            "UPDATE type::record('list', $id) SET {} \
             WHERE group_id = $group_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("group_id", group_id.to_string()));
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }
        if let Some(theme) = input.theme {
            builder = builder.bind(("theme", theme));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(classify_check_error)?;
        let rows: Vec<ListRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| missing_list(id, "listId"))?;

        Ok(row.try_into_list(id)?)
    }

    async fn remove(&self, group_id: Uuid, id: Uuid) -> TrolleyResult<List> {
        let list = self.find(group_id, id, &ListIncludes::default()).await?;

        self.db
            .query("DELETE type::record('list', $id) WHERE group_id = $group_id")
            .bind(("id", id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(list)
    }
}

impl<C: Connection> ListRepository for SurrealListRepository<C> {}
