//! SurrealDB implementation of [`ItemRepository`].
//!
//! Items carry a second foreign key: `category_id` must reference a
//! category in the same group, checked on insert and on update.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use trolley_core::error::{TrolleyError, TrolleyResult};
use trolley_core::models::item::{CreateItem, Item, UpdateItem};
use trolley_core::repository::{
    CategoryIncludes, ChildRepository, ItemIncludes, ItemRepository, MatchOptions,
};
use trolley_core::validate;
use uuid::Uuid;

use crate::error::{DbError, classify_check_error};
use crate::repository::{CountRow, count_group_name, group_exists, missing_group, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ItemRow {
    group_id: String,
    category_id: String,
    active: bool,
    name: String,
    notes: Option<String>,
    theme: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct ItemRowWithId {
    record_id: String,
    group_id: String,
    category_id: String,
    active: bool,
    name: String,
    notes: Option<String>,
    theme: Option<String>,
}

impl ItemRow {
    fn try_into_item(self, id: Uuid) -> Result<Item, DbError> {
        let group_id = parse_uuid("group", &self.group_id)?;
        let category_id = parse_uuid("category", &self.category_id)?;
        Ok(Item {
            id,
            group_id,
            category_id,
            active: self.active,
            name: self.name,
            notes: self.notes,
            theme: self.theme,
            group: None,
            category: None,
        })
    }
}

impl ItemRowWithId {
    fn try_into_item(self) -> Result<Item, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        let group_id = parse_uuid("group", &self.group_id)?;
        let category_id = parse_uuid("category", &self.category_id)?;
        Ok(Item {
            id,
            group_id,
            category_id,
            active: self.active,
            name: self.name,
            notes: self.notes,
            theme: self.theme,
            group: None,
            category: None,
        })
    }
}

/// Filtered, ordered selection of a group's items.
pub(crate) async fn select_items<C: Connection>(
    db: &Surreal<C>,
    group_id: Uuid,
    options: &MatchOptions<ItemIncludes>,
) -> TrolleyResult<Vec<Item>> {
    let mut clauses = vec!["group_id = $group_id"];
    if options.active {
        clauses.push("active = true");
    }
    if options.name.is_some() {
        clauses.push("string::contains(string::lowercase(name), string::lowercase($name))");
    }

    let mut query = format!(
        "SELECT meta::id(id) AS record_id, * FROM item WHERE {} ORDER BY name ASC",
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
    let rows: Vec<ItemRowWithId> = result.take(0).map_err(DbError::from)?;

    let mut items = rows
        .into_iter()
        .map(|row| row.try_into_item())
        .collect::<Result<Vec<_>, DbError>>()?;

    if options.includes.group {
        let group = super::group::fetch_group(db, group_id).await?;
        for item in &mut items {
            item.group = group.clone().map(Box::new);
        }
    }
    if options.includes.category {
        let categories = super::category::select_categories(
            db,
            group_id,
            &MatchOptions::<CategoryIncludes>::default(),
        )
        .await?;
        for item in &mut items {
            item.category = categories
                .iter()
                .find(|c| c.id == item.category_id)
                .cloned()
                .map(Box::new);
        }
    }

    Ok(items)
}

fn missing_item(detail: impl std::fmt::Display, field: &str) -> TrolleyError {
    TrolleyError::not_found(format!("{field}: Missing Item '{detail}'"))
}

/// SurrealDB implementation of the Item repository.
#[derive(Clone)]
pub struct SurrealItemRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealItemRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn attach_includes(&self, item: &mut Item, includes: &ItemIncludes) -> TrolleyResult<()> {
        if includes.group {
            item.group = super::group::fetch_group(&self.db, item.group_id)
                .await?
                .map(Box::new);
        }
        if includes.category {
            item.category =
                super::category::fetch_category(&self.db, item.group_id, item.category_id)
                    .await?
                    .map(Box::new);
        }
        Ok(())
    }

    /// The assigned category must exist within the same group.
    async fn category_in_group(&self, group_id: Uuid, category_id: Uuid) -> TrolleyResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM category \
                 WHERE id = type::record('category', $id) \
                 AND group_id = $group_id GROUP ALL",
            )
            .bind(("id", category_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }
}

impl<C: Connection> ChildRepository for SurrealItemRepository<C> {
    type Entity = Item;
    type Create = CreateItem;
    type Update = UpdateItem;
    type Includes = ItemIncludes;

    async fn all(
        &self,
        group_id: Uuid,
        options: &MatchOptions<ItemIncludes>,
    ) -> TrolleyResult<Vec<Item>> {
        select_items(&self.db, group_id, options).await
    }

    async fn exact(
        &self,
        group_id: Uuid,
        name: &str,
        includes: &ItemIncludes,
    ) -> TrolleyResult<Item> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM item \
                 WHERE group_id = $group_id AND name = $name",
            )
            .bind(("group_id", group_id.to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<ItemRowWithId> = result.take(0).map_err(DbError::from)?;

        if rows.len() != 1 {
            return Err(missing_item(name, "name"));
        }
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_item(name, "name"))?;
        let mut item = row.try_into_item()?;

        self.attach_includes(&mut item, includes).await?;
        Ok(item)
    }

    async fn find(&self, group_id: Uuid, id: Uuid, includes: &ItemIncludes) -> TrolleyResult<Item> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('item', $id) \
                 WHERE group_id = $group_id",
            )
            .bind(("id", id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_item(id, "itemId"))?;
        let mut item = row.try_into_item(id)?;

        self.attach_includes(&mut item, includes).await?;
        Ok(item)
    }

    async fn insert(&self, group_id: Uuid, input: CreateItem) -> TrolleyResult<Item> {
        if !group_exists(&self.db, group_id).await? {
            return Err(missing_group(group_id));
        }

        let mut errors = Vec::new();
        if let Some(name) = validate::require("name", input.name.as_deref(), &mut errors)
            && count_group_name(&self.db, "item", group_id, name, None).await? > 0
        {
            errors.push(validate::ValidationError::new(
                "name",
                format!("Name '{name}' is already in use"),
            ));
        }
        match input.category_id {
            None => errors.push(validate::ValidationError::new("categoryId", "Is required")),
            Some(category_id) => {
                if !self.category_in_group(group_id, category_id).await? {
                    errors.push(validate::ValidationError::new(
                        "categoryId",
                        format!("Missing Category '{category_id}'"),
                    ));
                }
            }
        }
        validate::aggregate(errors)?;

        let id = Uuid::new_v4();
        let result = self
            .db
            .query(
                "CREATE type::record('item', $id) SET \
                 group_id = $group_id, category_id = $category_id, \
                 active = $active, name = $name, \
                 notes = $notes, theme = $theme",
            )
            .bind(("id", id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .bind(("category_id", input.category_id.map(|c| c.to_string())))
            .bind(("active", input.active))
            .bind(("name", input.name))
            .bind(("notes", input.notes))
            .bind(("theme", input.theme))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(classify_check_error)?;
        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| missing_item(id, "itemId"))?;

        Ok(row.try_into_item(id)?)
    }

    async fn update(&self, group_id: Uuid, id: Uuid, input: UpdateItem) -> TrolleyResult<Item> {
        self.find(group_id, id, &ItemIncludes::default()).await?;

        let mut errors = Vec::new();
        if let Some(name) = input.name.as_deref()
            && count_group_name(&self.db, "item", group_id, name, Some(id)).await? > 0
        {
            errors.push(validate::ValidationError::new(
                "name",
                format!("Name '{name}' is already in use"),
            ));
        }
        if let Some(category_id) = input.category_id
            && !self.category_in_group(group_id, category_id).await?
        {
            errors.push(validate::ValidationError::new(
                "categoryId",
                format!("Missing Category '{category_id}'"),
            ));
        }
        validate::aggregate(errors)?;

        let mut sets = Vec::new();
        if input.active.is_some() {
            sets.push("active = $active");
        }
        if input.category_id.is_some() {
            sets.push("category_id = $category_id");
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
            return self.find(group_id, id, &ItemIncludes::default()).await;
        }

        let query = format!(
            "UPDATE type::record('item', $id) SET {} \
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
        if let Some(category_id) = input.category_id {
            builder = builder.bind(("category_id", category_id.to_string()));
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
        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| missing_item(id, "itemId"))?;

        Ok(row.try_into_item(id)?)
    }

    async fn remove(&self, group_id: Uuid, id: Uuid) -> TrolleyResult<Item> {
        let item = self.find(group_id, id, &ItemIncludes::default()).await?;

        self.db
            .query("DELETE type::record('item', $id) WHERE group_id = $group_id")
            .bind(("id", id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(item)
    }
}

impl<C: Connection> ItemRepository for SurrealItemRepository<C> {}
