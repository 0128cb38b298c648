//! SurrealDB implementation of [`CategoryRepository`].

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use trolley_core::error::{TrolleyError, TrolleyResult};
use trolley_core::models::category::{Category, CreateCategory, UpdateCategory};
use trolley_core::repository::{
    CategoryIncludes, CategoryRepository, ChildRepository, MatchOptions,
};
use trolley_core::validate;
use uuid::Uuid;

use crate::error::{DbError, classify_check_error};
use crate::repository::{count_group_name, group_exists, missing_group, parse_uuid};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CategoryRow {
    group_id: String,
    active: bool,
    name: String,
    notes: Option<String>,
    theme: Option<String>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CategoryRowWithId {
    record_id: String,
    group_id: String,
    active: bool,
    name: String,
    notes: Option<String>,
    theme: Option<String>,
}

impl CategoryRow {
    fn try_into_category(self, id: Uuid) -> Result<Category, DbError> {
        let group_id = parse_uuid("group", &self.group_id)?;
        Ok(Category {
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

impl CategoryRowWithId {
    fn try_into_category(self) -> Result<Category, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        let group_id = parse_uuid("group", &self.group_id)?;
        Ok(Category {
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

/// Filtered, ordered selection of a group's categories. Shared with
/// the group repository's child-listing routes.
pub(crate) async fn select_categories<C: Connection>(
    db: &Surreal<C>,
    group_id: Uuid,
    options: &MatchOptions<CategoryIncludes>,
) -> TrolleyResult<Vec<Category>> {
    let mut clauses = vec!["group_id = $group_id"];
    if options.active {
        clauses.push("active = true");
    }
    if options.name.is_some() {
        clauses.push("string::contains(string::lowercase(name), string::lowercase($name))");
    }

    let mut query = format!(
        "SELECT meta::id(id) AS record_id, * FROM category WHERE {} ORDER BY name ASC",
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
    let rows: Vec<CategoryRowWithId> = result.take(0).map_err(DbError::from)?;

    let mut categories = rows
        .into_iter()
        .map(|row| row.try_into_category())
        .collect::<Result<Vec<_>, DbError>>()?;

    if options.includes.group {
        // All rows share the same owning group.
        let group = super::group::fetch_group(db, group_id).await?;
        for category in &mut categories {
            category.group = group.clone().map(Box::new);
        }
    }

    Ok(categories)
}

/// Fetch one category by id within a group; `None` when absent.
/// Shared with the item repository's `withCategory` include.
pub(crate) async fn fetch_category<C: Connection>(
    db: &Surreal<C>,
    group_id: Uuid,
    category_id: Uuid,
) -> TrolleyResult<Option<Category>> {
    let mut result = db
        .query(
            "SELECT * FROM type::record('category', $id) \
             WHERE group_id = $group_id",
        )
        .bind(("id", category_id.to_string()))
        .bind(("group_id", group_id.to_string()))
        .await
        .map_err(DbError::from)?;
    let rows: Vec<CategoryRow> = result.take(0).map_err(DbError::from)?;
    rows.into_iter()
        .next()
        .map(|row| row.try_into_category(category_id))
        .transpose()
        .map_err(Into::into)
}

fn missing_category(detail: impl std::fmt::Display, field: &str) -> TrolleyError {
    TrolleyError::not_found(format!("{field}: Missing Category '{detail}'"))
}

/// SurrealDB implementation of the Category repository.
#[derive(Clone)]
pub struct SurrealCategoryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCategoryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn attach_group(
        &self,
        category: &mut Category,
        includes: &CategoryIncludes,
    ) -> TrolleyResult<()> {
        if includes.group {
            category.group = super::group::fetch_group(&self.db, category.group_id)
                .await?
                .map(Box::new);
        }
        Ok(())
    }
}

impl<C: Connection> ChildRepository for SurrealCategoryRepository<C> {
    type Entity = Category;
    type Create = CreateCategory;
    type Update = UpdateCategory;
    type Includes = CategoryIncludes;

    async fn all(
        &self,
        group_id: Uuid,
        options: &MatchOptions<CategoryIncludes>,
    ) -> TrolleyResult<Vec<Category>> {
        select_categories(&self.db, group_id, options).await
    }

    async fn exact(
        &self,
        group_id: Uuid,
        name: &str,
        includes: &CategoryIncludes,
    ) -> TrolleyResult<Category> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM category \
                 WHERE group_id = $group_id AND name = $name",
            )
            .bind(("group_id", group_id.to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CategoryRowWithId> = result.take(0).map_err(DbError::from)?;

        if rows.len() != 1 {
            return Err(missing_category(name, "name"));
        }
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_category(name, "name"))?;
        let mut category = row.try_into_category()?;

        self.attach_group(&mut category, includes).await?;
        Ok(category)
    }

    async fn find(
        &self,
        group_id: Uuid,
        id: Uuid,
        includes: &CategoryIncludes,
    ) -> TrolleyResult<Category> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('category', $id) \
                 WHERE group_id = $group_id",
            )
            .bind(("id", id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CategoryRow> = result.take(0).map_err(DbError::from)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_category(id, "categoryId"))?;
        let mut category = row.try_into_category(id)?;

        self.attach_group(&mut category, includes).await?;
        Ok(category)
    }

    async fn insert(&self, group_id: Uuid, input: CreateCategory) -> TrolleyResult<Category> {
        // Parent resolution comes before field validation.
        if !group_exists(&self.db, group_id).await? {
            return Err(missing_group(group_id));
        }

        let mut errors = Vec::new();
        if let Some(name) = validate::require("name", input.name.as_deref(), &mut errors)
            && count_group_name(&self.db, "category", group_id, name, None).await? > 0
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
                "CREATE type::record('category', $id) SET \
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
        let rows: Vec<CategoryRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_category(id, "categoryId"))?;

        Ok(row.try_into_category(id)?)
    }

    async fn update(
        &self,
        group_id: Uuid,
        id: Uuid,
        input: UpdateCategory,
    ) -> TrolleyResult<Category> {
        self.find(group_id, id, &CategoryIncludes::default()).await?;

        let mut errors = Vec::new();
        if let Some(name) = input.name.as_deref()
            && count_group_name(&self.db, "category", group_id, name, Some(id)).await? > 0
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
            return self.find(group_id, id, &CategoryIncludes::default()).await;
        }

        let query = format!(
            "UPDATE type::record('category', $id) SET {} \
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
        let rows: Vec<CategoryRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_category(id, "categoryId"))?;

        Ok(row.try_into_category(id)?)
    }

    async fn remove(&self, group_id: Uuid, id: Uuid) -> TrolleyResult<Category> {
        let category = self.find(group_id, id, &CategoryIncludes::default()).await?;

        // Items assigned to this category go with it.
        self.db
            .query(
                "DELETE item WHERE category_id = $id; \
                 DELETE type::record('category', $id) WHERE group_id = $group_id;",
            )
            .bind(("id", id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(category)
    }
}

impl<C: Connection> CategoryRepository for SurrealCategoryRepository<C> {}
