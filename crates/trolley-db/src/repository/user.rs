//! SurrealDB implementation of [`UserRepository`].
//!
//! Passwords are hashed through [`trolley_core::password`] before
//! they touch the database; an optional pepper (server-side secret)
//! can be provided at construction time.
//!
//! Every read path redacts the stored hash to `""`; only
//! [`UserRepository::credentials`] returns it, for authentication.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use trolley_core::error::{TrolleyError, TrolleyResult};
use trolley_core::models::user::{CreateUser, UpdateUser, User, UserCredentials};
use trolley_core::password;
use trolley_core::repository::{MatchOptions, ParentRepository, UserIncludes, UserRepository};
use trolley_core::validate;
use uuid::Uuid;

use crate::error::{DbError, classify_check_error};
use crate::repository::{count_field, parse_uuid};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    active: bool,
    name: String,
    username: String,
    password: String,
    scope: String,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    active: bool,
    name: String,
    username: String,
    password: String,
    scope: String,
}

impl UserRow {
    /// Redacts the password hash; use [`UserRow::password`] first
    /// where the hash is needed.
    fn into_user(self, id: Uuid) -> User {
        User {
            id,
            active: self.active,
            name: self.name,
            username: self.username,
            password: String::new(),
            scope: self.scope,
            access_tokens: None,
            refresh_tokens: None,
        }
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(User {
            id,
            active: self.active,
            name: self.name,
            username: self.username,
            password: String::new(),
            scope: self.scope,
            access_tokens: None,
            refresh_tokens: None,
        })
    }
}

fn missing_user(detail: impl std::fmt::Display, field: &str) -> TrolleyError {
    TrolleyError::not_found(format!("{field}: Missing User '{detail}'"))
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn attach_includes(&self, user: &mut User, includes: &UserIncludes) -> TrolleyResult<()> {
        if includes.access_tokens {
            user.access_tokens =
                Some(super::token::select_access_tokens(&self.db, user.id).await?);
        }
        if includes.refresh_tokens {
            user.refresh_tokens =
                Some(super::token::select_refresh_tokens(&self.db, user.id).await?);
        }
        Ok(())
    }

    async fn check_username(
        &self,
        username: &str,
        exclude_id: Option<Uuid>,
        errors: &mut Vec<validate::ValidationError>,
    ) -> TrolleyResult<()> {
        if count_field(&self.db, "user", "username", username, exclude_id).await? > 0 {
            errors.push(validate::ValidationError::new(
                "username",
                format!("Username '{username}' is already in use"),
            ));
        }
        Ok(())
    }
}

impl<C: Connection> ParentRepository for SurrealUserRepository<C> {
    type Entity = User;
    type Create = CreateUser;
    type Update = UpdateUser;
    type Includes = UserIncludes;

    async fn all(&self, options: &MatchOptions<UserIncludes>) -> TrolleyResult<Vec<User>> {
        let mut clauses: Vec<&str> = Vec::new();
        if options.active {
            clauses.push("active = true");
        }
        if options.name.is_some() {
            clauses.push("string::contains(string::lowercase(name), string::lowercase($name))");
        }

        let mut query = String::from("SELECT meta::id(id) AS record_id, * FROM user");
        if !clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&clauses.join(" AND "));
        }
        query.push_str(" ORDER BY username ASC");
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
        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut users = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        for user in &mut users {
            self.attach_includes(user, &options.includes).await?;
        }

        Ok(users)
    }

    /// Users are addressed by username, not display name.
    async fn exact(&self, name: &str, includes: &UserIncludes) -> TrolleyResult<User> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM user WHERE username = $username")
            .bind(("username", name.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        if rows.len() != 1 {
            return Err(missing_user(name, "username"));
        }
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_user(name, "username"))?;
        let mut user = row.try_into_user()?;

        self.attach_includes(&mut user, includes).await?;
        Ok(user)
    }

    async fn find(&self, id: Uuid, includes: &UserIncludes) -> TrolleyResult<User> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_user(id, "userId"))?;
        let mut user = row.into_user(id);

        self.attach_includes(&mut user, includes).await?;
        Ok(user)
    }

    async fn insert(&self, input: CreateUser) -> TrolleyResult<User> {
        let mut errors = Vec::new();
        validate::require("name", input.name.as_deref(), &mut errors);
        let password = validate::require("password", input.password.as_deref(), &mut errors);
        if let Some(username) = validate::require("username", input.username.as_deref(), &mut errors)
        {
            self.check_username(username, None, &mut errors).await?;
        }
        // Absent scope means no grants at all, which is valid.
        let scope = input.scope.unwrap_or_default();
        validate::check_user_scope(&scope, &mut errors);

        let hashed = match password {
            Some(password) => Some(password::hash_password(password, self.pepper.as_deref())?),
            None => None,
        };
        validate::aggregate(errors)?;
        let hashed = hashed.unwrap_or_default();

        let id = Uuid::new_v4();
        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 active = $active, name = $name, \
                 username = $username, password = $password, \
                 scope = $scope",
            )
            .bind(("id", id.to_string()))
            .bind(("active", input.active))
            .bind(("name", input.name))
            .bind(("username", input.username))
            .bind(("password", hashed))
            .bind(("scope", scope))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(classify_check_error)?;
        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_user(id, "userId"))?;

        Ok(row.into_user(id))
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> TrolleyResult<User> {
        self.find(id, &UserIncludes::default()).await?;

        let mut errors = Vec::new();
        if let Some(username) = input.username.as_deref() {
            self.check_username(username, Some(id), &mut errors).await?;
        }
        if let Some(scope) = input.scope.as_deref() {
            validate::check_user_scope(scope, &mut errors);
        }
        validate::aggregate(errors)?;

        // An absent or empty password leaves the stored hash alone.
        let hashed = match input.password.as_deref() {
            Some(password) if !password.is_empty() => {
                Some(password::hash_password(password, self.pepper.as_deref())?)
            }
            _ => None,
        };

        let mut sets = Vec::new();
        if input.active.is_some() {
            sets.push("active = $active");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.username.is_some() {
            sets.push("username = $username");
        }
        if hashed.is_some() {
            sets.push("password = $password");
        }
        if input.scope.is_some() {
            sets.push("scope = $scope");
        }

        if sets.is_empty() {
            return self.find(id, &UserIncludes::default()).await;
        }

        let query = format!("UPDATE type::record('user', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(hashed) = hashed {
            builder = builder.bind(("password", hashed));
        }
        if let Some(scope) = input.scope {
            builder = builder.bind(("scope", scope));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(classify_check_error)?;
        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_user(id, "userId"))?;

        Ok(row.into_user(id))
    }

    async fn remove(&self, id: Uuid) -> TrolleyResult<User> {
        let user = self.find(id, &UserIncludes::default()).await?;

        // Issued tokens go with the user.
        self.db
            .query(
                "DELETE access_token WHERE user_id = $id; \
                 DELETE refresh_token WHERE user_id = $id; \
                 DELETE type::record('user', $id);",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(user)
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn credentials(&self, username: &str) -> TrolleyResult<UserCredentials> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM user WHERE username = $username")
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| missing_user(username, "username"))?;
        let password_hash = row.password.clone();
        let user = row.try_into_user()?;

        Ok(UserCredentials {
            user,
            password_hash,
        })
    }
}
