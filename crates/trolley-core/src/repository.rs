//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Child repositories
//! (categories, lists, items) take the owning `group_id` as their
//! first parameter on every operation: tenant partitioning is part of
//! the contract, not an implementation detail.
//!
//! Name lookups: `exact` is case-sensitive and requires exactly one
//! match (zero or an ambiguous duplicate both report `NotFound`); the
//! `name` filter in [`MatchOptions`] is a case-insensitive substring
//! match.

use std::future::Future;

use uuid::Uuid;

use crate::error::TrolleyResult;
use crate::models::{
    category::{Category, CreateCategory, UpdateCategory},
    group::{CreateGroup, Group, UpdateGroup},
    item::{CreateItem, Item, UpdateItem},
    list::{CreateList, List, UpdateList},
    token::{AccessToken, CreateAccessToken, CreateRefreshToken, RefreshToken},
    user::{CreateUser, UpdateUser, User, UserCredentials},
};

/// Filter and pagination parameters shared by every `all` query,
/// parameterized by the entity's eager-include flags.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions<I> {
    /// Select only active rows.
    pub active: bool,
    /// Case-insensitive substring filter on the entity's name.
    pub name: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub includes: I,
}

/// Eager-include flags for group reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupIncludes {
    pub categories: bool,
    pub items: bool,
    pub lists: bool,
}

/// Eager-include flags for category reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryIncludes {
    pub group: bool,
}

/// Eager-include flags for list reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListIncludes {
    pub group: bool,
}

/// Eager-include flags for item reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemIncludes {
    pub group: bool,
    pub category: bool,
}

/// Eager-include flags for user reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserIncludes {
    pub access_tokens: bool,
    pub refresh_tokens: bool,
}

// ---------------------------------------------------------------------------
// Generic CRUD contracts
// ---------------------------------------------------------------------------

/// CRUD over a top-level entity (groups, users). Entities are sorted
/// in their canonical order (groups by name, users by username).
pub trait ParentRepository: Send + Sync {
    type Entity: Send;
    type Create: Send;
    type Update: Send;
    type Includes: Default + Send + Sync;

    fn all(
        &self,
        options: &MatchOptions<Self::Includes>,
    ) -> impl Future<Output = TrolleyResult<Vec<Self::Entity>>> + Send;

    fn exact(
        &self,
        name: &str,
        includes: &Self::Includes,
    ) -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;

    fn find(
        &self,
        id: Uuid,
        includes: &Self::Includes,
    ) -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;

    fn insert(&self, input: Self::Create)
    -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: Self::Update,
    ) -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;

    /// Returns the removed entity, or `NotFound`.
    fn remove(&self, id: Uuid) -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;
}

/// CRUD over an entity owned by a group. Every query is partitioned
/// by `group_id`; a row under a different group is indistinguishable
/// from a missing row. Entities are sorted by name.
pub trait ChildRepository: Send + Sync {
    type Entity: Send;
    type Create: Send;
    type Update: Send;
    type Includes: Default + Send + Sync;

    fn all(
        &self,
        group_id: Uuid,
        options: &MatchOptions<Self::Includes>,
    ) -> impl Future<Output = TrolleyResult<Vec<Self::Entity>>> + Send;

    fn exact(
        &self,
        group_id: Uuid,
        name: &str,
        includes: &Self::Includes,
    ) -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;

    fn find(
        &self,
        group_id: Uuid,
        id: Uuid,
        includes: &Self::Includes,
    ) -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;

    /// Fails with `NotFound` on `groupId` when the owning group does
    /// not exist; validation failures aggregate into one `BadRequest`.
    fn insert(
        &self,
        group_id: Uuid,
        input: Self::Create,
    ) -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;

    fn update(
        &self,
        group_id: Uuid,
        id: Uuid,
        input: Self::Update,
    ) -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;

    /// Returns the removed entity, or `NotFound`.
    fn remove(
        &self,
        group_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = TrolleyResult<Self::Entity>> + Send;
}

// ---------------------------------------------------------------------------
// Entity repositories
// ---------------------------------------------------------------------------

pub trait GroupRepository:
    ParentRepository<Entity = Group, Create = CreateGroup, Update = UpdateGroup, Includes = GroupIncludes>
{
    /// Child categories of an existing group (`NotFound` otherwise).
    fn categories(
        &self,
        group_id: Uuid,
        options: &MatchOptions<CategoryIncludes>,
    ) -> impl Future<Output = TrolleyResult<Vec<Category>>> + Send;

    /// Child items of an existing group.
    fn items(
        &self,
        group_id: Uuid,
        options: &MatchOptions<ItemIncludes>,
    ) -> impl Future<Output = TrolleyResult<Vec<Item>>> + Send;

    /// Child lists of an existing group.
    fn lists(
        &self,
        group_id: Uuid,
        options: &MatchOptions<ListIncludes>,
    ) -> impl Future<Output = TrolleyResult<Vec<List>>> + Send;
}

pub trait CategoryRepository:
    ChildRepository<
        Entity = Category,
        Create = CreateCategory,
        Update = UpdateCategory,
        Includes = CategoryIncludes,
    >
{
}

pub trait ListRepository:
    ChildRepository<Entity = List, Create = CreateList, Update = UpdateList, Includes = ListIncludes>
{
}

pub trait ItemRepository:
    ChildRepository<Entity = Item, Create = CreateItem, Update = UpdateItem, Includes = ItemIncludes>
{
}

/// Users are looked up by username in `exact`. All read paths redact
/// the stored password hash to `""`; [`credentials`] is the one
/// deliberate exception, for authentication.
///
/// [`credentials`]: UserRepository::credentials
pub trait UserRepository:
    ParentRepository<Entity = User, Create = CreateUser, Update = UpdateUser, Includes = UserIncludes>
{
    fn credentials(
        &self,
        username: &str,
    ) -> impl Future<Output = TrolleyResult<UserCredentials>> + Send;
}

/// Storage for opaque bearer tokens. Token values are globally unique.
pub trait TokenRepository: Send + Sync {
    fn insert_access(
        &self,
        input: CreateAccessToken,
    ) -> impl Future<Output = TrolleyResult<AccessToken>> + Send;

    fn insert_refresh(
        &self,
        input: CreateRefreshToken,
    ) -> impl Future<Output = TrolleyResult<RefreshToken>> + Send;

    /// Look up an access token by its opaque value.
    fn find_access(&self, token: &str) -> impl Future<Output = TrolleyResult<AccessToken>> + Send;

    /// Look up a refresh token by its opaque value.
    fn find_refresh(&self, token: &str)
    -> impl Future<Output = TrolleyResult<RefreshToken>> + Send;

    /// Access tokens for a user, newest expiry first.
    fn access_tokens(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = TrolleyResult<Vec<AccessToken>>> + Send;

    /// Refresh tokens for a user, newest expiry first.
    fn refresh_tokens(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = TrolleyResult<Vec<RefreshToken>>> + Send;

    /// Point an existing refresh token at a newly issued access token.
    fn relink_refresh(
        &self,
        token: &str,
        access_token: &str,
    ) -> impl Future<Output = TrolleyResult<()>> + Send;

    /// Delete an access token and every refresh token linked to it.
    fn revoke_access(&self, token: &str) -> impl Future<Output = TrolleyResult<()>> + Send;

    /// Delete all expired tokens of both kinds; returns count removed.
    fn purge_expired(&self) -> impl Future<Output = TrolleyResult<u64>> + Send;
}
