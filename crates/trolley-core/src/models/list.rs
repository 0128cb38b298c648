//! List domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::group::Group;

/// A shopping list belonging to exactly one group; names are unique
/// per group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: Uuid,
    pub group_id: Uuid,
    pub active: bool,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Owning group, present only when eagerly requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Box<Group>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateList {
    #[serde(default = "super::group::default_active")]
    pub active: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateList {
    pub active: Option<bool>,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub theme: Option<String>,
}
