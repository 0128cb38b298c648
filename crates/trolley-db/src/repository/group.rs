//! SurrealDB implementation of [`GroupRepository`].

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use trolley_core::error::{TrolleyError, TrolleyResult};
use trolley_core::models::category::Category;
use trolley_core::models::group::{CreateGroup, Group, UpdateGroup};
use trolley_core::models::item::Item;
use trolley_core::models::list::List;
use trolley_core::repository::{
    CategoryIncludes, GroupIncludes, GroupRepository, ItemIncludes, ListIncludes, MatchOptions,
    ParentRepository,
};
use trolley_core::validate;
use uuid::Uuid;

use crate::error::{DbError, classify_check_error};
use crate::repository::{count_field, missing_group, parse_uuid};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GroupRow {
    active: bool,
    name: String,
    scope: String,
    email: Option<String>,
    notes: Option<String>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    active: bool,
    name: String,
    scope: String,
    email: Option<String>,
    notes: Option<String>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> Group {
        Group {
            id,
            active: self.active,
            name: self.name,
            scope: self.scope,
            email: self.email,
            notes: self.notes,
            categories: None,
            items: None,
            lists: None,
        }
    }
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<Group, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(Group {
            id,
            active: self.active,
            name: self.name,
            scope: self.scope,
            email: self.email,
            notes: self.notes,
            categories: None,
            items: None,
            lists: None,
        })
    }
}

/// Fetch a group by id without includes; `None` when absent. Shared
/// with the child repositories for their `withGroup` includes.
pub(crate) async fn fetch_group<C: Connection>(
    db: &Surreal<C>,
    group_id: Uuid,
) -> TrolleyResult<Option<Group>> {
    let mut result = db
        .query("SELECT * FROM type::record('group', $id)")
        .bind(("id", group_id.to_string()))
        .await
        .map_err(DbError::from)?;
    let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
    Ok(rows.into_iter().next().map(|row| row.into_group(group_id)))
}

/// SurrealDB implementation of the Group repository.
#[derive(Clone)]
pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn attach_includes(&self, group: &mut Group, includes: &GroupIncludes) -> TrolleyResult<()> {
        if includes.categories {
            group.categories = Some(
                super::category::select_categories(&self.db, group.id, &MatchOptions::default())
                    .await?,
            );
        }
        if includes.items {
            group.items =
                Some(super::item::select_items(&self.db, group.id, &MatchOptions::default()).await?);
        }
        if includes.lists {
            group.lists =
                Some(super::list::select_lists(&self.db, group.id, &MatchOptions::default()).await?);
        }
        Ok(())
    }

    /// Run the validation pipeline for an insert or update candidate.
    async fn check_candidate(
        &self,
        name: Option<&str>,
        scope: Option<&str>,
        required: bool,
        exclude_id: Option<Uuid>,
    ) -> TrolleyResult<()> {
        let mut errors = Vec::new();

        let name = if required {
            validate::require("name", name, &mut errors)
        } else {
            name
        };
        let scope = if required {
            validate::require("scope", scope, &mut errors)
        } else {
            scope
        };

        if let Some(scope) = scope {
            validate::check_group_scope(scope, &mut errors);
        }

        if let Some(name) = name
            && count_field(&self.db, "group", "name", name, exclude_id).await? > 0
        {
            errors.push(validate::ValidationError::new(
                "name",
                format!("Name '{name}' is already in use"),
            ));
        }
        if let Some(scope) = scope
            && count_field(&self.db, "group", "scope", scope, exclude_id).await? > 0
        {
            errors.push(validate::ValidationError::new(
                "scope",
                format!("Scope '{scope}' is already in use"),
            ));
        }

        validate::aggregate(errors)
    }

    /// Look up a group and fail in the `groupId` message convention.
    async fn read(&self, group_id: Uuid) -> TrolleyResult<Group> {
        fetch_group(&self.db, group_id)
            .await?
            .ok_or_else(|| missing_group(group_id))
    }
}

impl<C: Connection> ParentRepository for SurrealGroupRepository<C> {
    type Entity = Group;
    type Create = CreateGroup;
    type Update = UpdateGroup;
    type Includes = GroupIncludes;

    async fn all(&self, options: &MatchOptions<GroupIncludes>) -> TrolleyResult<Vec<Group>> {
        let mut clauses: Vec<&str> = Vec::new();
        if options.active {
            clauses.push("active = true");
        }
        if options.name.is_some() {
            clauses.push("string::contains(string::lowercase(name), string::lowercase($name))");
        }

        let mut query = String::from("SELECT meta::id(id) AS record_id, * FROM group");
        if !clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&clauses.join(" AND "));
        }
        query.push_str(" ORDER BY name ASC");
        if options.limit.is_some() {
            query.push_str(" LIMIT $limit");
        }
        if options.offset.is_some() {
            query.push_str(" START $offset");
        }

        let mut builder = self.db.query(query);
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
        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        for group in &mut groups {
            self.attach_includes(group, &options.includes).await?;
        }

        Ok(groups)
    }

    async fn exact(&self, name: &str, includes: &GroupIncludes) -> TrolleyResult<Group> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM group WHERE name = $name")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        // Zero or ambiguous matches both read as "missing".
        if rows.len() != 1 {
            return Err(TrolleyError::not_found(format!(
                "name: Missing Group '{name}'"
            )));
        }
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| TrolleyError::not_found(format!("name: Missing Group '{name}'")))?;
        let mut group = row.try_into_group()?;

        self.attach_includes(&mut group, includes).await?;
        Ok(group)
    }

    async fn find(&self, id: Uuid, includes: &GroupIncludes) -> TrolleyResult<Group> {
        let mut group = self.read(id).await?;
        self.attach_includes(&mut group, includes).await?;
        Ok(group)
    }

    async fn insert(&self, input: CreateGroup) -> TrolleyResult<Group> {
        self.check_candidate(input.name.as_deref(), input.scope.as_deref(), true, None)
            .await?;

        let id = Uuid::new_v4();
        let result = self
            .db
            .query(
                "CREATE type::record('group', $id) SET \
                 active = $active, name = $name, scope = $scope, \
                 email = $email, notes = $notes",
            )
            .bind(("id", id.to_string()))
            .bind(("active", input.active))
            .bind(("name", input.name))
            .bind(("scope", input.scope))
            .bind(("email", input.email))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(classify_check_error)?;
        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_group(id))?;

        Ok(row.into_group(id))
    }

    async fn update(&self, id: Uuid, input: UpdateGroup) -> TrolleyResult<Group> {
        // Merge semantics: absent fields stay untouched; uniqueness is
        // re-checked excluding this row.
        self.read(id).await?;
        self.check_candidate(input.name.as_deref(), input.scope.as_deref(), false, Some(id))
            .await?;

        let mut sets = Vec::new();
        if input.active.is_some() {
            sets.push("active = $active");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.scope.is_some() {
            sets.push("scope = $scope");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }

        if sets.is_empty() {
            return self.read(id).await;
        }

        let query = format!(
            "UPDATE type::record('group', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(scope) = input.scope {
            builder = builder.bind(("scope", scope));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(classify_check_error)?;
        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| missing_group(id))?;

        Ok(row.into_group(id))
    }

    async fn remove(&self, id: Uuid) -> TrolleyResult<Group> {
        let group = self.read(id).await?;

        // Cascade: children first, then the group record itself.
        self.db
            .query(
                "DELETE item WHERE group_id = $id; \
                 DELETE list WHERE group_id = $id; \
                 DELETE category WHERE group_id = $id; \
                 DELETE type::record('group', $id);",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(group)
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn categories(
        &self,
        group_id: Uuid,
        options: &MatchOptions<CategoryIncludes>,
    ) -> TrolleyResult<Vec<Category>> {
        self.read(group_id).await?;
        super::category::select_categories(&self.db, group_id, options).await
    }

    async fn items(
        &self,
        group_id: Uuid,
        options: &MatchOptions<ItemIncludes>,
    ) -> TrolleyResult<Vec<Item>> {
        self.read(group_id).await?;
        super::item::select_items(&self.db, group_id, options).await
    }

    async fn lists(
        &self,
        group_id: Uuid,
        options: &MatchOptions<ListIncludes>,
    ) -> TrolleyResult<Vec<List>> {
        self.read(group_id).await?;
        super::list::select_lists(&self.db, group_id, options).await
    }
}
