//! Database models for the post/category link table.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::models::categories::CategoryId;
use crate::db::models::posts::PostId;
use crate::db::models::{Entity, Schema};
use crate::db::query::Value;
use crate::types::EntityId;

/// One post filed under one category. A post can sit in many categories and a category can hold
/// many posts; removing either end removes the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostCategory {
    pub id: EntityId,
    pub post_id: PostId,
    pub category_id: CategoryId,
}

impl PostCategory {
    pub fn new(post_id: PostId, category_id: CategoryId) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            category_id,
        }
    }
}

impl Entity for PostCategory {
    const SCHEMA: Schema = Schema {
        table: "content_posts_categories",
        resource: "post category",
        columns: &["id", "post_id", "category_id"],
        deleted_at: None,
        tree: None,
    };

    fn id(&self) -> EntityId {
        self.id
    }

    fn value(&self, column: &str) -> Option<Value> {
        Some(match column {
            "id" => self.id.into(),
            "post_id" => self.post_id.into(),
            "category_id" => self.category_id.into(),
            _ => return None,
        })
    }
}
