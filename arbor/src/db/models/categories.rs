//! Database models for content categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::models::{Entity, OnDelete, Schema, TreeEntity, TreeLink};
use crate::db::query::Value;
use crate::types::{EntityId, now};

/// Category ID type alias for type safety.
pub type CategoryId = EntityId;

/// A category. Categories form a tree; deleting one hands its children to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub custom_order: i64,
    pub parent_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(name: impl Into<String>, parent_id: Option<CategoryId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            custom_order: 0,
            parent_id,
            created_at: now(),
            deleted_at: None,
        }
    }

    pub fn with_order(mut self, custom_order: i64) -> Self {
        self.custom_order = custom_order;
        self
    }
}

impl Entity for Category {
    const SCHEMA: Schema = Schema {
        table: "content_categories",
        resource: "category",
        columns: &["id", "name", "custom_order", "parent_id", "created_at", "deleted_at"],
        deleted_at: Some("deleted_at"),
        tree: Some(TreeLink {
            parent_column: "parent_id",
            on_delete: OnDelete::NoAction,
        }),
    };

    fn id(&self) -> EntityId {
        self.id
    }

    fn value(&self, column: &str) -> Option<Value> {
        Some(match column {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "custom_order" => self.custom_order.into(),
            "parent_id" => self.parent_id.into(),
            "created_at" => self.created_at.into(),
            "deleted_at" => self.deleted_at.into(),
            _ => return None,
        })
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }
}

impl TreeEntity for Category {
    fn parent_id(&self) -> Option<EntityId> {
        self.parent_id
    }

    fn set_parent_id(&mut self, parent: Option<EntityId>) {
        self.parent_id = parent;
    }
}

/// Database request for creating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCreateDBRequest {
    pub name: String,
    #[serde(default)]
    pub custom_order: i64,
    pub parent_id: Option<CategoryId>,
}

/// Database request for updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdateDBRequest {
    pub name: Option<String>,
    pub custom_order: Option<i64>,
    /// Parent (None = no change, Some(None) = make root, Some(id) = move under id)
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub parent_id: Option<Option<CategoryId>>,
}
