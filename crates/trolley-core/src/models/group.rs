//! Group domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::category::Category;
use crate::models::item::Item;
use crate::models::list::List;

/// A group of categories, lists, and items that can be managed by
/// users holding the corresponding scope. Groups are the tenant roots:
/// all other shopping-list data is partitioned beneath them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub active: bool,
    /// Globally unique name of this group.
    pub name: String,
    /// Globally unique scope prefix for this group (no spaces).
    /// Permission grants of the form `<scope>:<role>` refer to it.
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Child categories, present only when eagerly requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    /// Child items, present only when eagerly requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    /// Child lists, present only when eagerly requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lists: Option<Vec<List>>,
}

/// Insert input. Required fields are optional here so that missing
/// values surface as aggregated validation failures, not parse errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateGroup {
    pub active: Option<bool>,
    pub name: Option<String>,
    pub scope: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

pub(crate) fn default_active() -> bool {
    true
}
