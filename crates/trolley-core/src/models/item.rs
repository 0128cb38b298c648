//! Item domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::category::Category;
use crate::models::group::Group;

/// An individual item that can be added to a shopping list. Each item
/// belongs to exactly one group and one category within that group;
/// names are unique per group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub group_id: Uuid,
    pub category_id: Uuid,
    pub active: bool,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Owning group, present only when eagerly requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Box<Group>>,
    /// Assigned category, present only when eagerly requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Box<Category>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItem {
    #[serde(default = "super::group::default_active")]
    pub active: bool,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateItem {
    pub active: Option<bool>,
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub theme: Option<String>,
}
