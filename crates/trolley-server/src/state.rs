use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use trolley_auth::{AuthConfig, AuthService};
use trolley_db::repository::{
    SurrealCategoryRepository, SurrealGroupRepository, SurrealItemRepository,
    SurrealListRepository, SurrealTokenRepository, SurrealUserRepository,
};

use crate::access::AccessGate;
use crate::cache::GroupScopeCache;

pub type Auth = Arc<AuthService<SurrealUserRepository<Any>, SurrealTokenRepository<Any>>>;

/// Shared handler state. Repositories are cheap clones over the same
/// database handle.
#[derive(Clone)]
pub struct AppState {
    pub groups: SurrealGroupRepository<Any>,
    pub categories: SurrealCategoryRepository<Any>,
    pub lists: SurrealListRepository<Any>,
    pub items: SurrealItemRepository<Any>,
    pub users: SurrealUserRepository<Any>,
    pub auth: Auth,
    pub gate: AccessGate,
    pub cache: GroupScopeCache,
}

pub fn build_state(db: Surreal<Any>, auth_config: AuthConfig) -> AppState {
    let users = match &auth_config.pepper {
        Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
        None => SurrealUserRepository::new(db.clone()),
    };
    let tokens = SurrealTokenRepository::new(db.clone());
    let auth: Auth = Arc::new(AuthService::new(users.clone(), tokens, auth_config));

    let groups = SurrealGroupRepository::new(db.clone());
    let cache = GroupScopeCache::default();
    let gate = AccessGate::new(auth.clone(), groups.clone(), cache.clone());

    AppState {
        groups,
        categories: SurrealCategoryRepository::new(db.clone()),
        lists: SurrealListRepository::new(db.clone()),
        items: SurrealItemRepository::new(db.clone()),
        users,
        auth,
        gate,
        cache,
    }
}
